//! Source maps from generated program offsets back to the component source.

use crate::{ByteOffset, Span};
use text_size::TextSize;

/// A single mapping from a generated span to the original span it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mapping {
    /// The span in the generated output.
    pub generated: Span,
    /// The span in the original source.
    pub original: Span,
}

/// Position mappings for one generated program.
///
/// Generated offsets that no mapping covers belong to synthetic text.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    /// Sorted by generated start; generated spans never overlap.
    mappings: Vec<Mapping>,
}

impl SourceMap {
    /// Creates a new empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source map builder.
    pub fn builder() -> SourceMapBuilder {
        SourceMapBuilder::new()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns an iterator over all mappings in generated order.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Finds the original position corresponding to a generated position.
    ///
    /// When the generated text is longer than the original span it replaced,
    /// the result is clamped to the end of that span. Returns `None` for
    /// synthetic text.
    pub fn original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let mapping = self.find_mapping_for_generated(generated)?;
        let offset_in_span = generated - mapping.generated.start;
        Some((mapping.original.start + offset_in_span).min(mapping.original.end))
    }

    /// Maps a generated span to the original span, if both ends are mapped.
    pub fn original_span(&self, generated: Span) -> Option<Span> {
        let start = self.original_position(generated.start)?;
        if generated.is_empty() {
            return Some(Span::empty(start));
        }
        let last = generated.end - TextSize::from(1);
        let mapping = self.find_mapping_for_generated(last)?;
        let end = (mapping.original.start + (last - mapping.generated.start) + TextSize::from(1))
            .min(mapping.original.end);
        Some(Span::new(start, end.max(start)))
    }

    /// Returns true when the generated position has no original location.
    pub fn is_synthetic(&self, generated: ByteOffset) -> bool {
        self.find_mapping_for_generated(generated).is_none()
    }

    /// Finds the generated position corresponding to an original position.
    ///
    /// Text that was copied verbatim is preferred over replaced text.
    pub fn generated_position(&self, original: ByteOffset) -> Option<ByteOffset> {
        let mut fallback = None;
        for mapping in &self.mappings {
            if !mapping.original.contains(original) {
                continue;
            }
            let offset_in_span = original - mapping.original.start;
            if mapping.generated.len() == mapping.original.len() {
                return Some(mapping.generated.start + offset_in_span);
            }
            fallback.get_or_insert(mapping.generated.start);
        }
        fallback
    }

    fn find_mapping_for_generated(&self, generated: ByteOffset) -> Option<&Mapping> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.checked_sub(1)?,
        };
        self.mappings
            .get(idx)
            .filter(|m| m.generated.contains(generated))
    }
}

/// Accumulates mappings while generated text is written front to back.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
    generated_offset: ByteOffset,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generated offset.
    #[inline]
    pub fn generated_offset(&self) -> ByteOffset {
        self.generated_offset
    }

    /// Maps `generated_len` bytes at the current offset to `original`.
    pub fn add_mapping(&mut self, original: Span, generated_len: u32) {
        if generated_len == 0 {
            return;
        }
        let generated_start = self.generated_offset;
        let generated_end = generated_start + TextSize::from(generated_len);
        self.mappings.push(Mapping {
            generated: Span::new(generated_start, generated_end),
            original,
        });
        self.generated_offset = generated_end;
    }

    /// Adds verbatim source text, creating a 1:1 mapping.
    pub fn add_source(&mut self, original_start: ByteOffset, text: &str) {
        let len = text.len() as u32;
        let original = Span::new(original_start, original_start + TextSize::from(len));
        self.add_mapping(original, len);
    }

    /// Adds synthetic text without an original position.
    pub fn add_generated(&mut self, text: &str) {
        self.generated_offset += TextSize::from(text.len() as u32);
    }

    /// Adds text that replaced `original`; lengths may differ.
    pub fn add_transformed(&mut self, original: Span, generated_text: &str) {
        self.add_mapping(original, generated_text.len() as u32);
    }

    /// Builds the final source map.
    pub fn build(mut self) -> SourceMap {
        self.mappings.sort_by_key(|m| m.generated.start);
        SourceMap {
            mappings: self.mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_map() {
        let map = SourceMap::new();
        assert!(map.is_empty());
        assert!(map.is_synthetic(TextSize::from(0)));
    }

    #[test]
    fn verbatim_and_synthetic_text() {
        let mut builder = SourceMapBuilder::new();
        builder.add_source(TextSize::from(0), "hello");
        builder.add_generated(" ");
        builder.add_source(TextSize::from(10), "world");
        let map = builder.build();

        assert_eq!(map.len(), 2);
        assert_eq!(
            map.original_position(TextSize::from(4)),
            Some(TextSize::from(4))
        );
        assert_eq!(map.original_position(TextSize::from(5)), None);
        assert!(map.is_synthetic(TextSize::from(5)));
        assert_eq!(
            map.original_position(TextSize::from(6)),
            Some(TextSize::from(10))
        );
        assert_eq!(
            map.generated_position(TextSize::from(14)),
            Some(TextSize::from(10))
        );
    }

    #[test]
    fn transformed_text_is_clamped_to_original_span() {
        let mut builder = SourceMapBuilder::new();
        builder.add_transformed(Span::new(2u32, 4u32), "longer text");
        let map = builder.build();

        assert_eq!(
            map.original_position(TextSize::from(1)),
            Some(TextSize::from(3))
        );
        assert_eq!(
            map.original_position(TextSize::from(9)),
            Some(TextSize::from(4))
        );
        assert_eq!(
            map.original_span(Span::new(0u32, 11u32)),
            Some(Span::new(2u32, 4u32))
        );
    }
}
