//! Edit buffers and source maps for svelte-deep-classes.
//!
//! This crate records offset-based edits over an immutable source string,
//! materializes them in a single pass, and keeps a mapping table from the
//! edited output back to the original. The table answers position queries
//! directly and encodes to a standard V3 source map.
//!
//! # Example
//!
//! ```
//! use source_map::{EditBuffer, EncodeOptions, Span};
//!
//! let mut buffer = EditBuffer::new("<Button class=\"p-2\"/>");
//! buffer.overwrite(Span::from_range(15..18), "deep_p-2").unwrap();
//! buffer.append("<style></style>");
//!
//! let (code, map) = buffer.render();
//! assert_eq!(code, "<Button class=\"deep_p-2\"/><style></style>");
//!
//! let encoded = map.encode(
//!     buffer.original(),
//!     &code,
//!     &EncodeOptions { file: Some("Card.svelte".into()), hires: true, ..Default::default() },
//! );
//! assert_eq!(encoded.file(), Some("Card.svelte"));
//! ```

mod builder;
mod edit;
mod encode;
mod line_index;
mod span;

pub use builder::{Mapping, MappingKind, SourceMap, SourceMapBuilder};
pub use edit::{EditBuffer, EditError};
pub use encode::{EncodeOptions, EncodedSourceMap, MapError};
pub use line_index::{LineCol, LineIndex};
pub use span::{offset, ByteOffset, Span};
