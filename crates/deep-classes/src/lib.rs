//! Svelte markup preprocessor that makes classes passed to child components
//! global.
//!
//! Svelte scopes a component's styles to the elements it renders itself, so a
//! `class` handed to a child component never receives the parent's rules.
//! This crate rewrites each such class attribute to a synthetic class name
//! and emits a `:global(...)` rule that `@apply`s the original utilities. It
//! can also promote `rtl:`/`ltr:` direction variants and `gl:` marked classes
//! to global rules.
//!
//! # Example
//!
//! ```
//! use deep_classes::{preprocess, PreprocessOptions};
//!
//! let source = r#"<Button class="px-4 rtl:ml-2">Save</Button>"#;
//! let options = PreprocessOptions { rtl: true, global_prefix: false };
//!
//! let output = preprocess(source, Some("Toolbar.svelte"), &options).unwrap();
//! assert!(output.code.starts_with(r#"<Button class="deep_px-4_rtl-ml-2">"#));
//! assert!(output.code.contains(":global([dir=rtl] .deep_px-4_rtl-ml-2) { @apply ml-2; }"));
//! ```

mod error;
mod guard;
mod inject;
mod naming;
mod options;
mod preprocess;
mod rename;
mod sanitize;
mod scan;
mod synthesize;

pub use error::PreprocessError;
pub use guard::ScriptGuard;
pub use naming::{deep_name, escape_class};
pub use options::PreprocessOptions;
pub use preprocess::{preprocess, DeepClasses, MarkupInput, PreprocessOutput};
pub use source_map::{EncodedSourceMap, MapError};
