//! Text-patch buffer: an editable overlay over immutable original text.
//!
//! All operations address the ORIGINAL text, so edits made by independent
//! passes never need to know about each other's offsets. The buffer keeps a
//! doubly linked list of chunks that tile the original text; every chunk
//! carries the text inserted before it (`intro`) and after it (`outro`).
//! Moving a range relinks its chunks, which is why inserted text attached to
//! a moved chunk travels with it.
//!
//! Every move stamps its chunks with a fresh move id. An overwrite or removal
//! edits the chunks that share the move history of the chunk at its start:
//! content moved as a whole stays editable at its new place, while content
//! moved out of the range is left alone.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use text_size::TextSize;
use thiserror::Error;

use crate::{SourceMap, SourceMapBuilder, Span};

/// An invalid edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("offset {offset} is out of bounds (length {len})")]
    OutOfBounds { offset: u32, len: u32 },

    #[error("invalid range {start}..{end}")]
    InvalidRange { start: u32, end: u32 },

    #[error("cannot split {start}..{end} at {offset}: the chunk was already overwritten")]
    SplitOverwritten { start: u32, end: u32, offset: u32 },

    #[error("cannot move {start}..{end} to {index}: the target lies inside the range")]
    MoveIntoSelf { start: u32, end: u32, index: u32 },
}

#[derive(Debug, Clone)]
struct Chunk {
    start: u32,
    end: u32,
    intro: String,
    outro: String,
    /// Replacement content; `Some("")` means removed.
    content: Option<String>,
    /// Ids of the moves applied to this chunk, oldest first.
    moves: Vec<u32>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Chunk {
    fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            intro: String::new(),
            outro: String::new(),
            content: None,
            moves: Vec::new(),
            prev: None,
            next: None,
        }
    }

    fn is_overwritten(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// An editable overlay over an immutable text.
///
/// Cloning copies the patch set and shares the original text.
#[derive(Clone)]
pub struct PatchBuffer {
    original: Arc<str>,
    chunks: Vec<Chunk>,
    by_start: BTreeMap<u32, usize>,
    by_end: FxHashMap<u32, usize>,
    first: usize,
    last: usize,
    intro: String,
    outro: String,
    move_count: u32,
}

impl PatchBuffer {
    /// Creates a buffer with no edits over `original`.
    pub fn new(original: impl Into<Arc<str>>) -> Self {
        let original: Arc<str> = original.into();
        let len = original.len() as u32;
        let mut by_start = BTreeMap::new();
        by_start.insert(0, 0);
        let mut by_end = FxHashMap::default();
        by_end.insert(len, 0);
        Self {
            original,
            chunks: vec![Chunk::new(0, len)],
            by_start,
            by_end,
            first: 0,
            last: 0,
            intro: String::new(),
            outro: String::new(),
            move_count: 0,
        }
    }

    /// The unedited text.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Length of the original text in bytes.
    pub fn len(&self) -> u32 {
        self.original.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Original text covered by `span`.
    pub fn slice(&self, span: Span) -> &str {
        span.text(&self.original)
    }

    /// Returns true once any edit has been recorded.
    pub fn has_changed(&self) -> bool {
        !self.intro.is_empty()
            || !self.outro.is_empty()
            || self.chunks.iter().any(|c| {
                !c.moves.is_empty() || c.content.is_some() || !c.intro.is_empty() || !c.outro.is_empty()
            })
    }

    /// Inserts text at the very beginning of the output.
    pub fn prepend(&mut self, text: &str) {
        self.intro.insert_str(0, text);
    }

    /// Inserts text at the very end of the output.
    pub fn append(&mut self, text: &str) {
        self.outro.push_str(text);
    }

    /// Appends text to the content ending at `index`.
    pub fn append_left(&mut self, index: u32, text: &str) -> Result<(), PatchError> {
        self.split(index)?;
        match self.by_end.get(&index) {
            Some(&chunk) => self.chunks[chunk].outro.push_str(text),
            None => self.intro.push_str(text),
        }
        Ok(())
    }

    /// Prepends text to the insertions attached to the content ending at `index`.
    pub fn prepend_left(&mut self, index: u32, text: &str) -> Result<(), PatchError> {
        self.split(index)?;
        match self.by_end.get(&index) {
            Some(&chunk) => self.chunks[chunk].outro.insert_str(0, text),
            None => self.intro.insert_str(0, text),
        }
        Ok(())
    }

    /// Appends text to the insertions attached to the content starting at `index`.
    pub fn append_right(&mut self, index: u32, text: &str) -> Result<(), PatchError> {
        self.split(index)?;
        match self.by_start.get(&index) {
            Some(&chunk) => self.chunks[chunk].intro.push_str(text),
            None => self.outro.push_str(text),
        }
        Ok(())
    }

    /// Prepends text to the content starting at `index`.
    pub fn prepend_right(&mut self, index: u32, text: &str) -> Result<(), PatchError> {
        self.split(index)?;
        match self.by_start.get(&index) {
            Some(&chunk) => self.chunks[chunk].intro.insert_str(0, text),
            None => self.outro.insert_str(0, text),
        }
        Ok(())
    }

    /// Replaces the original content of `start..end` with `text`.
    ///
    /// Text inserted at the outer boundaries is kept; text inserted strictly
    /// inside the range is dropped. Content moved out of the range is not
    /// affected.
    pub fn overwrite(&mut self, start: u32, end: u32, text: &str) -> Result<(), PatchError> {
        self.check_range(start, end)?;
        if start == end {
            return Err(PatchError::InvalidRange { start, end });
        }
        self.split(start)?;
        self.split(end)?;

        let chunks = self.editable_chunks(start, end);
        let (Some(&head), Some(&tail)) = (chunks.first(), chunks.last()) else {
            return Ok(());
        };
        for chunk in chunks {
            let c = &mut self.chunks[chunk];
            if chunk == head {
                c.content = Some(text.to_string());
            } else {
                c.content = Some(String::new());
                c.intro.clear();
            }
            if chunk != tail {
                c.outro.clear();
            }
        }
        Ok(())
    }

    /// Removes the original content of `start..end`, with any text inserted
    /// inside it.
    pub fn remove(&mut self, start: u32, end: u32) -> Result<(), PatchError> {
        self.check_range(start, end)?;
        if start == end {
            return Ok(());
        }
        self.split(start)?;
        self.split(end)?;
        for chunk in self.editable_chunks(start, end) {
            let c = &mut self.chunks[chunk];
            c.content = Some(String::new());
            c.intro.clear();
            c.outro.clear();
        }
        Ok(())
    }

    /// Relocates the original content of `start..end` to `index`.
    ///
    /// Ranges moved to the same index appear in the order they were moved.
    pub fn move_range(&mut self, start: u32, end: u32, index: u32) -> Result<(), PatchError> {
        self.check_range(start, end)?;
        if index > self.len() {
            return Err(PatchError::OutOfBounds {
                offset: index,
                len: self.len(),
            });
        }
        if index >= start && index <= end {
            return Err(PatchError::MoveIntoSelf { start, end, index });
        }
        if start == end {
            return Ok(());
        }
        self.split(start)?;
        self.split(end)?;
        self.split(index)?;

        let first = self.by_start[&start];
        let last = self.by_end[&end];

        // Collect before relinking; the list order defines the moved run.
        let mut run = vec![first];
        let mut cursor = first;
        while cursor != last {
            match self.chunks[cursor].next {
                Some(next) => {
                    run.push(next);
                    cursor = next;
                }
                None => break,
            }
        }

        let old_left = self.chunks[first].prev;
        let old_right = self.chunks[last].next;
        match old_left {
            Some(left) => self.chunks[left].next = old_right,
            None => {
                if let Some(right) = old_right {
                    self.first = right;
                }
            }
        }
        match old_right {
            Some(right) => self.chunks[right].prev = old_left,
            None => {
                if let Some(left) = old_left {
                    self.last = left;
                }
            }
        }

        let new_right = self.by_start.get(&index).copied();
        let new_left = match new_right {
            Some(right) => self.chunks[right].prev,
            None => Some(self.last),
        };

        self.chunks[first].prev = new_left;
        match new_left {
            Some(left) => self.chunks[left].next = Some(first),
            None => self.first = first,
        }
        self.chunks[last].next = new_right;
        match new_right {
            Some(right) => self.chunks[right].prev = Some(last),
            None => self.last = last,
        }

        let id = self.move_count;
        self.move_count += 1;
        for chunk in run {
            self.chunks[chunk].moves.push(id);
        }
        Ok(())
    }

    /// Builds the source map for the current output.
    pub fn source_map(&self) -> SourceMap {
        let mut builder = SourceMapBuilder::new();
        builder.add_generated(&self.intro);
        for chunk in self.iter() {
            builder.add_generated(&chunk.intro);
            let original = Span::new(chunk.start, chunk.end);
            match &chunk.content {
                None => builder.add_source(TextSize::from(chunk.start), original.text(&self.original)),
                Some(content) => builder.add_transformed(original, content),
            }
            builder.add_generated(&chunk.outro);
        }
        builder.add_generated(&self.outro);
        builder.build()
    }

    /// Chunks in output order.
    fn iter(&self) -> impl Iterator<Item = &Chunk> {
        let mut cursor = Some(self.first);
        std::iter::from_fn(move || {
            let chunk = &self.chunks[cursor?];
            cursor = chunk.next;
            Some(chunk)
        })
    }

    /// Chunk ids covering `start..end` in ORIGINAL order.
    fn chunks_in(&self, start: u32, end: u32) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cursor = self.by_start.get(&start).copied();
        while let Some(chunk) = cursor {
            out.push(chunk);
            let chunk_end = self.chunks[chunk].end;
            if chunk_end >= end {
                break;
            }
            cursor = self.by_start.get(&chunk_end).copied();
        }
        out
    }

    /// Chunks of `start..end` that were moved together with the chunk at
    /// `start`, in original order.
    fn editable_chunks(&self, start: u32, end: u32) -> Vec<usize> {
        let mut chunks = self.chunks_in(start, end);
        if let Some(&anchor) = chunks.first() {
            let moves = self.chunks[anchor].moves.clone();
            chunks.retain(|&c| self.chunks[c].moves == moves);
        }
        chunks
    }

    fn check_range(&self, start: u32, end: u32) -> Result<(), PatchError> {
        let len = self.len();
        if end > len {
            return Err(PatchError::OutOfBounds { offset: end, len });
        }
        if start > end {
            return Err(PatchError::InvalidRange { start, end });
        }
        Ok(())
    }

    /// Ensures a chunk boundary exists at `index`.
    fn split(&mut self, index: u32) -> Result<(), PatchError> {
        let len = self.len();
        if index > len {
            return Err(PatchError::OutOfBounds { offset: index, len });
        }
        if self.by_start.contains_key(&index) || self.by_end.contains_key(&index) {
            return Ok(());
        }
        let Some((_, &id)) = self.by_start.range(..index).next_back() else {
            return Ok(());
        };

        let (start, end) = (self.chunks[id].start, self.chunks[id].end);
        if self.chunks[id].is_overwritten() {
            return Err(PatchError::SplitOverwritten {
                start,
                end,
                offset: index,
            });
        }

        let new_id = self.chunks.len();
        let old = &mut self.chunks[id];
        let mut tail = Chunk::new(index, end);
        tail.outro = std::mem::take(&mut old.outro);
        tail.content = old.content.clone();
        tail.moves = old.moves.clone();
        tail.prev = Some(id);
        tail.next = old.next;
        old.end = index;
        old.next = Some(new_id);

        if let Some(next) = tail.next {
            self.chunks[next].prev = Some(new_id);
        }
        if self.last == id {
            self.last = new_id;
        }
        self.chunks.push(tail);
        self.by_start.insert(index, new_id);
        self.by_end.insert(index, id);
        self.by_end.insert(end, new_id);
        Ok(())
    }
}

impl fmt::Display for PatchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.intro)?;
        for chunk in self.iter() {
            f.write_str(&chunk.intro)?;
            match &chunk.content {
                Some(content) => f.write_str(content)?,
                None => f.write_str(Span::new(chunk.start, chunk.end).text(&self.original))?,
            }
            f.write_str(&chunk.outro)?;
        }
        f.write_str(&self.outro)
    }
}

impl fmt::Debug for PatchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchBuffer")
            .field("len", &self.original.len())
            .field("chunks", &self.chunks.len())
            .finish()
    }
}
