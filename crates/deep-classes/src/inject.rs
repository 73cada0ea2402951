//! Placement of synthesized rules in the document's style block.

use crate::sanitize::Sanitized;
use source_map::{EditBuffer, EditError};
use svelte_parser::Style;
use tracing::warn;

/// Where the rules ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Inserted at this original offset, before the existing style content.
    Prepended(usize),
    /// Appended to the document inside a new `<style>` block.
    Appended,
}

/// Adds `rules` to the top-level style block, or appends a new block.
pub fn inject_rules(
    buffer: &mut EditBuffer<'_>,
    style: Option<&Style>,
    sanitized: &Sanitized,
    rules: &str,
) -> Result<Placement, EditError> {
    let target = style.and_then(|style| {
        let start = usize::from(style.content_span.start);
        // content begins before anything cut out right after the open tag
        let offset = sanitized.map_end(start);
        let original = buffer.original();
        let valid = start <= sanitized.text().len()
            && offset <= original.len()
            && original.is_char_boundary(offset)
            && original[..offset].ends_with('>')
            && !original[..offset].ends_with("/>");
        if !valid {
            warn!(offset, "style content offset is malformed, appending a new style block");
        }
        valid.then_some(offset)
    });

    match target {
        Some(offset) => {
            buffer.insert_left(offset, rules)?;
            Ok(Placement::Prepended(offset))
        }
        None => {
            buffer.append(&format!("<style>{rules}</style>"));
            Ok(Placement::Appended)
        }
    }
}
