use std::fs;
use vue_transformer::{compile, CompileOptions};

fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("Usage: emit_tsx <file.vue> [options.json]");
    let source = fs::read_to_string(&path).expect("Failed to read file");
    let mut options = match std::env::args().nth(2) {
        Some(config) => {
            let json = fs::read_to_string(config).expect("Failed to read options");
            CompileOptions::from_json(&json).expect("Invalid options")
        }
        None => CompileOptions::default(),
    };
    options.filename = Some(path.clone());

    let output = compile(&source, &options).expect("Failed to compile");
    println!("{}", output.code);
    if !output.diagnostics.is_empty() {
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&output.diagnostics).expect("Failed to serialize diagnostics")
        );
    }
}
