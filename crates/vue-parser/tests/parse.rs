use pretty_assertions::assert_eq;
use vue_parser::{parse, parse_template, Attribute, BlockKind, ParseErrorKind, TemplateNode};

const COMPONENT: &str = r#"<script lang="ts">
export default { name: 'Counter' }
</script>

<script setup lang="ts" generic="T">
import { ref } from 'vue'
const count = ref(0)
</script>

<template>
  <!-- <script>not a block</script> -->
  <div v-if="count > 0" :class="{ active: count }">
    <MyButton @click="count++">{{ count }}</MyButton>
  </div>
</template>

<style scoped>
.active { color: red; }
</style>
"#;

#[test]
fn blocks_are_classified() {
    let result = parse(COMPONENT);
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let kinds: Vec<(BlockKind, &str)> = result
        .blocks
        .iter()
        .map(|b| (b.kind, b.tag.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (BlockKind::Script, "script"),
            (BlockKind::Script, "script"),
            (BlockKind::Template, "template"),
            (BlockKind::Other, "style"),
        ]
    );
    assert_eq!(result.main_script_index(), Some(1));
    assert_eq!(result.generic.as_deref(), Some("T"));
    assert!(!result.is_async);
}

#[test]
fn block_spans_index_the_whole_file() {
    let result = parse(COMPONENT);
    for block in &result.blocks {
        assert_eq!(block.span.text(COMPONENT).len(), u32::from(block.span.len()) as usize);
        assert_eq!(block.content_span.text(COMPONENT), block.content);
        assert!(block.open_tag.text(COMPONENT).starts_with(&format!("<{}", block.tag)));
        assert!(block.open_tag.text(COMPONENT).ends_with('>'));
    }
    let setup = &result.blocks[1];
    let generic = setup.attribute("generic").unwrap();
    assert_eq!(generic.name_span.text(COMPONENT), "generic");
    assert_eq!(generic.value.as_ref().unwrap().span.text(COMPONENT), "T");
}

#[test]
fn template_reads_directives_and_components() {
    let result = parse(COMPONENT);
    let template = result.template().unwrap();
    let parsed = parse_template(COMPONENT, template);
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);

    let elements: Vec<_> = parsed
        .nodes
        .iter()
        .filter_map(|node| match node {
            TemplateNode::Element(el) => Some(el),
            _ => None,
        })
        .collect();
    assert_eq!(elements.len(), 1);
    let div = elements[0];
    assert_eq!(div.directive("if").unwrap().value.as_ref().unwrap().content, "count > 0");
    assert!(matches!(div.attributes[1], Attribute::Directive(_)));

    let button = div
        .children
        .iter()
        .find_map(|node| match node {
            TemplateNode::Element(el) => Some(el),
            _ => None,
        })
        .unwrap();
    assert_eq!(button.name, "MyButton");
    assert_eq!(button.end_name_span().unwrap().text(COMPONENT), "MyButton");
}

#[test]
fn unterminated_blocks_are_reported() {
    let result = parse("<template><div></div>");
    assert_eq!(result.blocks.len(), 1);
    assert!(matches!(
        result.errors[0].kind,
        ParseErrorKind::UnclosedBlock { .. }
    ));
    insta::assert_snapshot!(result.errors[0].to_string(), @"unclosed block: <template>");
}
