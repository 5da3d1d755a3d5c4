//! End-to-end tests for `compile`.

use pretty_assertions::assert_eq;
use vue_transformer::context::ContextItem;
use vue_transformer::{compile, CompileOptions, CompileOutput, Severity};

/// Compiles with an empty prefix so generated names read naturally.
fn compile_bare(source: &str) -> CompileOutput {
    let options = CompileOptions {
        prefix: String::new(),
        ..CompileOptions::default()
    };
    compile(source, &options).unwrap()
}

fn assert_contains(code: &str, needle: &str) {
    assert!(code.contains(needle), "expected `{needle}` in:\n{code}");
}

const COUNTER: &str = r#"<script setup lang="ts">
import { ref } from 'vue'
const count = ref(0)
</script>

<template>
  <button @click="count++">{{ count }}</button>
</template>
"#;

#[test]
fn test_counter_component() {
    let output = compile_bare(COUNTER);
    let code = &output.code;
    assert!(code.starts_with("import { ref } from 'vue'\n"), "{code}");
    assert_contains(code, "function setup() {");
    assert_contains(code, "count: count as typeof count");
    assert_contains(code, "type FullContext = ReturnType<typeof setup>;");
    assert_contains(code, "function render(ctx: TemplateBinding, components: Components) {\nreturn <>");
    assert_contains(
        code,
        "<button onClick={eventCallback((...[$event]: any[]) => { ctx.count++; })}>{ ctx.count }</button>",
    );
    assert_contains(code, "function templateBinding(fc: FullContext) {");
    assert_contains(code, "declare function eventCallback<");
    assert_eq!(code.matches("declare function eventCallback").count(), 1);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
}

#[test]
fn test_default_prefix_marks_generated_names() {
    let output = compile(COUNTER, &CompileOptions::default()).unwrap();
    assert_contains(&output.code, "function ___GENERATED___render(___GENERATED___ctx: ");
    assert_contains(&output.code, "{ ___GENERATED___ctx.count }");
    assert!(!output.code.contains("function render("));
}

#[test]
fn test_compile_is_deterministic() {
    let first = compile_bare(COUNTER);
    let second = compile_bare(COUNTER);
    assert_eq!(first.code, second.code);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(
        first.source_map.mappings().collect::<Vec<_>>(),
        second.source_map.mappings().collect::<Vec<_>>()
    );
}

#[test]
fn test_generic_component() {
    let output = compile_bare(
        "<script setup lang=\"ts\" generic=\"T extends string\">\ndefineProps<{ item: T }>()\n</script>\n<template>{{ item }}</template>",
    );
    let code = &output.code;
    assert_contains(code, "function setup<T extends string>() {");
    assert_contains(code, "type FullContext<T extends string> = ReturnType<typeof setup<T>>;");
    assert_contains(
        code,
        "function render<T extends string>(ctx: TemplateBinding<T>, components: Components<T>) {",
    );
    assert_contains(code, "type definePropsType = { item: T };");
}

#[test]
fn test_define_props_object_payload() {
    let output = compile_bare(
        "<script setup lang=\"ts\">\nconst props = defineProps(['foo', 'bar'])\n</script>\n<template>{{ props.foo }}</template>",
    );
    let code = &output.code;
    assert_contains(code, "const definePropsRaw = ['foo', 'bar'];");
    assert_contains(code, "const props = defineProps(extractValue(definePropsRaw))");
    assert_contains(code, "declare function extractValue<T>(value: T): T;");
    assert_contains(code, "{ ctx.props.foo }");
    assert!(output
        .context
        .items
        .iter()
        .any(|item| matches!(item, ContextItem::Binding { name, .. } if name == "props")));
}

#[test]
fn test_conditional_chain() {
    let output = compile_bare(
        "<script setup lang=\"ts\">\nconst a = 1\nconst b = 2\n</script>\n<template><div v-if=\"a\">A</div><p v-else-if=\"b\">B</p><span v-else>C</span></template>",
    );
    assert_contains(
        &output.code,
        "{(() => { if (ctx.a) { <div >A</div> } else if (ctx.b) { <p >B</p> } else { <span >C</span> } })()}",
    );
}

#[test]
fn test_slot_outlets_get_distinct_names() {
    let output = compile_bare(
        "<script setup lang=\"ts\"></script>\n<template><slot name=\"header\"/><slot>fallback</slot></template>",
    );
    let code = &output.code;
    assert_contains(code, "const slotComponent0 = slotComponent(ctx.$slots[\"header\"]);");
    assert_contains(code, "const slotComponent1 = slotComponent(ctx.$slots[\"default\"]);");
    assert_contains(code, "<slotComponent1>fallback</slotComponent1>");
}

#[test]
fn test_template_ref_is_typed_from_template() {
    let output = compile_bare(
        "<script setup lang=\"ts\">\nconst el = useTemplateRef('input')\n</script>\n<template><input ref=\"input\"></template>",
    );
    assert_contains(
        &output.code,
        r#"const el = useTemplateRef<HTMLElementTagNameMap["input"], "input">('input')"#,
    );
}

#[test]
fn test_loop_with_index() {
    let output = compile_bare(
        "<script setup lang=\"ts\">\nconst items = [1]\n</script>\n<template><li v-for=\"(item, i) in items\" :key=\"i\">{{ item }}</li></template>",
    );
    assert_contains(&output.code, "{renderList(ctx.items, (item, i) => { <li  key={i}>{ item }</li>; })}");
    assert_contains(&output.code, "declare function renderList<T>(");
}

#[test]
fn test_options_component() {
    let output = compile_bare("<script>\nexport default {}\n</script>\n<template><div/></template>");
    let code = &output.code;
    assert_contains(code, "export default {}");
    assert_contains(code, "type FullContext = {};");
    assert_contains(code, "type TemplateBinding = Record<string, any>;");
    assert!(!output.has_errors());
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.severity == Severity::Warning && d.message.contains("<script setup>")));
}

#[test]
fn test_custom_blocks_are_commented_out() {
    let output = compile_bare(
        "<script setup lang=\"ts\"></script>\n<template><div/></template>\n<style scoped>.a { color: red }</style>",
    );
    assert_contains(&output.code, "/* <style> */");
    assert!(!output.code.contains("color: red"));
}

#[test]
fn test_malformed_input_still_compiles() {
    let output = compile_bare("<script setup lang=\"ts\">\nconst a = 1\n</script>\n<template><div><span>{{ a }}</div></template>");
    assert!(!output.diagnostics.is_empty());
    assert_contains(&output.code, "function render(");
}

#[test]
fn test_custom_plugin_selection() {
    let options = CompileOptions::from_json(
        r#"{ "prefix": "", "plugins": { "script": ["script-block"], "template": ["render"] } }"#,
    )
    .unwrap();
    let output = compile("<script setup lang=\"ts\">let a</script>\n<template><b/></template>", &options).unwrap();
    assert_eq!(
        output.code,
        "<script setup lang=\"ts\">let a</script>\nfunction render(ctx: TemplateBinding, components: Components) {\nreturn <><b/></>;\n}"
    );
}

const LIST_IMPORT: &str = "<script setup lang=\"ts\">\nimport List from './List.vue'\nconst ok = true\n</script>\n";

#[test]
fn test_slot_template_with_expressions() {
    let source = format!(
        "{LIST_IMPORT}<template><List><template #item=\"{{ row }}\">{{{{ row }}}}</template></List></template>"
    );
    let output = compile_bare(&source);
    let code = &output.code;
    assert_contains(
        code,
        "<components.List v-slot={(instance: InstanceOf<typeof components.List>) => { renderSlot(instance.$slots[\"item\"], ({ row }) => { <>{ row }</>; }); }}></components.List>",
    );
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
}

#[test]
fn test_component_v_slot_with_bound_attribute() {
    let source = format!("{LIST_IMPORT}<template><List v-slot=\"{{ e }}\"><b :title=\"e\" @click=\"ok\">x</b></List></template>");
    let output = compile_bare(&source);
    assert_contains(
        &output.code,
        "renderSlot(instance.$slots[\"default\"], ({ e }) => { <><b title={e}",
    );
    assert_contains(&output.code, ">x</b></>; }); }}></components.List>");
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
}

#[test]
fn test_slot_callback_is_narrowed() {
    let options = CompileOptions {
        prefix: String::new(),
        narrow: true,
        ..CompileOptions::default()
    };
    let source = format!(
        "{LIST_IMPORT}<template><List v-if=\"ok\"><template #item=\"{{ row }}\">{{{{ row }}}}</template></List></template>"
    );
    let output = compile(&source, &options).unwrap();
    assert_contains(
        &output.code,
        "renderSlot(instance.$slots[\"item\"], ({ row }) => { if (!((ctx.ok))) return; <>{ row }</>; });",
    );
}

#[test]
fn test_type_declaration_shadows_macro() {
    let output = compile_bare(
        "<script setup lang=\"ts\">\ninterface defineEmits {}\nconst e = defineEmits(['x'])\n</script>\n<template>{{ e }}</template>",
    );
    assert_contains(&output.code, "const e = defineEmits(['x'])");
    assert!(!output.code.contains("defineEmitsRaw"));
    assert!(!output
        .context
        .items
        .iter()
        .any(|item| matches!(item, ContextItem::MacroBinding { .. })));
}

#[test]
fn test_let_destructured_props_stay_mutable() {
    let output = compile_bare(
        "<script setup lang=\"ts\">\nlet { a } = defineProps<{ a: number }>();\na = 2\n</script>\n<template>{{ a }}</template>",
    );
    assert_contains(
        &output.code,
        "let defineProps_1 = defineProps<definePropsType & {}>();\nlet { a } = defineProps_1\na = 2",
    );
    assert!(!output.code.contains("const { a }"));
}

#[test]
fn test_pre_element_is_not_compiled() {
    let output = compile_bare(
        "<script setup lang=\"ts\"></script>\n<template><p v-pre v-once>{{ raw }}</p></template>",
    );
    assert_contains(
        &output.code,
        r#"<p v-pre v-once>{"{"}{"{"} raw {"}"}{"}"}</p>"#,
    );
    assert!(!output.code.contains("ctx.raw"));
}
