//! Ambient declarations for the helpers generated code calls.
//!
//! Helpers exist only for the type checker. Each one is declared at most once
//! per output, after everything that uses it.

/// A generated helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Helper {
    RenderList,
    Unref,
    ExtractValue,
    EventCallback,
    SlotComponent,
    RenderSlot,
    InstanceOf,
    PublicInstance,
    NormalizeClass,
    NormalizeStyle,
    DirectiveSymbol,
    DirectiveBinding,
    DynamicComponent,
}

impl Helper {
    /// The unprefixed name.
    pub fn base_name(self) -> &'static str {
        match self {
            Helper::RenderList => "renderList",
            Helper::Unref => "unref",
            Helper::ExtractValue => "extractValue",
            Helper::EventCallback => "eventCallback",
            Helper::SlotComponent => "slotComponent",
            Helper::RenderSlot => "renderSlot",
            Helper::InstanceOf => "InstanceOf",
            Helper::PublicInstance => "PublicInstance",
            Helper::NormalizeClass => "normalizeClass",
            Helper::NormalizeStyle => "normalizeStyle",
            Helper::DirectiveSymbol => "directiveSymbol",
            Helper::DirectiveBinding => "directiveBinding",
            Helper::DynamicComponent => "dynamicComponent",
        }
    }

    /// The declaration, with `name` as the helper's generated name.
    pub fn declaration(self, name: &str) -> String {
        match self {
            Helper::RenderList => format!(
                "declare function {name}<T>(source: readonly T[] | Iterable<T>, render: (value: T, index: number) => any): any[];\n\
                 declare function {name}(source: number, render: (value: number, index: number) => any): any[];\n\
                 declare function {name}<T extends object>(source: T, render: (value: T[keyof T], key: keyof T, index: number) => any): any[];\n"
            ),
            Helper::Unref => format!("declare function {name}<T>(value: import(\"vue\").MaybeRef<T>): T;\n"),
            Helper::ExtractValue => format!("declare function {name}<T>(value: T): T;\n"),
            Helper::EventCallback => {
                format!("declare function {name}<T extends (...args: any[]) => any>(callback: T): T;\n")
            }
            Helper::SlotComponent => format!(
                "declare function {name}<T>(slot: T): import(\"vue\").FunctionalComponent<NonNullable<T> extends (props: infer P) => any ? P : {{}}>;\n"
            ),
            Helper::RenderSlot => format!(
                "declare function {name}<S>(slot: S, render: (props: NonNullable<S> extends (props: infer P) => any ? P : {{}}) => any): any;\n"
            ),
            Helper::InstanceOf => format!(
                "type {name}<T> = T extends new (...args: any) => infer I ? I : T extends (props: infer P, ...args: any) => any ? {{ $props: P; $slots: any }} : any;\n"
            ),
            Helper::PublicInstance => format!(
                "type {name}<Props, Emits, Slots, Attrs, Context> = {{ $props: Props; $emit: Emits; $slots: Slots; $attrs: Attrs }} & Context;\n"
            ),
            Helper::NormalizeClass => format!("declare function {name}(value: unknown): string;\n"),
            Helper::NormalizeStyle => {
                format!("declare function {name}(value: unknown): import(\"vue\").StyleValue;\n")
            }
            Helper::DirectiveSymbol => format!("declare const {name}: unique symbol;\n"),
            Helper::DirectiveBinding => format!(
                "declare function {name}<V>(directive: import(\"vue\").Directive<any, V> | undefined, binding: {{ arg?: string; modifiers?: Record<string, boolean>; value?: V }}): void;\n"
            ),
            Helper::DynamicComponent => format!(
                "declare const {name}: import(\"vue\").FunctionalComponent<{{ is: unknown }} & Record<string, unknown>>;\n"
            ),
        }
    }
}
