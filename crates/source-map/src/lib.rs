//! Source positions, source maps and the text-patch buffer.
//!
//! Every span in the compiler is an absolute byte range into the original
//! component file. The [`PatchBuffer`] records edits against that text and
//! materializes the generated program together with a [`SourceMap`] that
//! resolves generated offsets back to the component.

mod builder;
mod line_index;
mod patch;
mod span;

pub use builder::{Mapping, SourceMap, SourceMapBuilder};
pub use line_index::{LineCol, LineIndex};
pub use patch::{PatchBuffer, PatchError};
pub use span::{ByteOffset, Span};
