//! Error types for preprocessing.

use source_map::EditError;
use svelte_parser::ParseError;
use thiserror::Error;

/// Why a document could not be preprocessed.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The markup could not be parsed. Spans point into the original document.
    #[error("failed to parse markup: {}", summarize(.0))]
    Parse(Vec<ParseError>),

    /// An edit was rejected by the edit buffer.
    #[error("failed to rewrite markup: {0}")]
    Edit(#[from] EditError),
}

impl PreprocessError {
    /// Returns the parse errors, if parsing failed.
    pub fn parse_errors(&self) -> &[ParseError] {
        match self {
            PreprocessError::Parse(errors) => errors,
            PreprocessError::Edit(_) => &[],
        }
    }
}

fn summarize(errors: &[ParseError]) -> String {
    match errors {
        [] => "unknown error".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_map::Span;
    use svelte_parser::ParseErrorKind;

    fn unclosed(tag: &str) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnclosedTag {
                tag_name: tag.to_string(),
            },
            Span::new(0u32, 1u32),
        )
    }

    #[test]
    fn test_parse_error_display() {
        let error = PreprocessError::Parse(vec![unclosed("div")]);
        assert_eq!(
            error.to_string(),
            "failed to parse markup: unclosed tag: <div>"
        );

        let error = PreprocessError::Parse(vec![unclosed("div"), unclosed("p")]);
        assert_eq!(
            error.to_string(),
            "failed to parse markup: unclosed tag: <div> (and 1 more)"
        );
        assert_eq!(error.parse_errors().len(), 2);
    }

    #[test]
    fn test_edit_error_display() {
        let error = PreprocessError::from(EditError::EmptyRange { offset: 3 });
        assert_eq!(
            error.to_string(),
            "failed to rewrite markup: cannot overwrite the empty range at 3"
        );
        assert!(error.parse_errors().is_empty());
    }
}
