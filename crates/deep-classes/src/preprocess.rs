//! The markup preprocessing pipeline.

use crate::error::PreprocessError;
use crate::guard::ScriptGuard;
use crate::inject::inject_rules;
use crate::naming::deep_name;
use crate::rename::rename_prefixes;
use crate::sanitize::{strip_apply, Sanitized};
use crate::scan::component_classes;
use crate::synthesize::{directional_rules, global_rules, group_rules, render_rules};
use crate::PreprocessOptions;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use source_map::{EditBuffer, EncodeOptions, EncodedSourceMap};
use svelte_parser::ParseError;
use tracing::{debug, instrument, warn};

/// A markup file handed to the preprocessor.
#[derive(Debug, Clone, Copy)]
pub struct MarkupInput<'a> {
    /// The full file content.
    pub content: &'a str,
    /// Written to the source map's `file` and `sources` fields.
    pub filename: Option<&'a str>,
}

/// The preprocessed file.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    /// The rewritten markup.
    pub code: String,
    /// Maps `code` back to the input. `None` when the file was passed
    /// through untouched because of a misplaced TypeScript script.
    pub map: Option<EncodedSourceMap>,
}

/// Rewrites classes passed to child components into global style rules.
#[derive(Debug, Clone, Default)]
pub struct DeepClasses {
    options: PreprocessOptions,
}

impl DeepClasses {
    /// Creates a preprocessor with the given options.
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    /// Returns the options this preprocessor was created with.
    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Preprocesses one markup file.
    #[instrument(skip_all, fields(filename = input.filename.unwrap_or("<anonymous>")))]
    pub fn markup(&self, input: MarkupInput<'_>) -> Result<PreprocessOutput, PreprocessError> {
        let content = input.content;
        let guard = ScriptGuard::detect(content);
        let Some(parse_start) = guard.parse_start() else {
            warn!("TypeScript script is not at the start of the file, leaving it unchanged");
            return Ok(PreprocessOutput {
                code: content.to_string(),
                map: None,
            });
        };

        let sanitized = Sanitized::new(content, parse_start);
        debug!(
            parse_start,
            removed = sanitized.removed_count(),
            "sanitized parser input"
        );
        let document = svelte_parser::parse(sanitized.text())
            .into_result()
            .map_err(|errors| {
                PreprocessError::Parse(
                    errors
                        .into_iter()
                        .map(|e| ParseError::new(e.kind, sanitized.map_span(e.span)))
                        .collect(),
                )
            })?;

        let mut buffer = EditBuffer::new(content);
        let mut groups: IndexSet<&str, FxBuildHasher> = IndexSet::default();
        for usage in component_classes(&document) {
            buffer.overwrite(sanitized.map_span(usage.span), deep_name(usage.group))?;
            groups.insert(usage.group);
        }
        debug!(groups = groups.len(), "rewrote component class attributes");

        let mut rules = Vec::new();
        for group in &groups {
            rules.extend(group_rules(group, self.options.rtl));
        }
        if self.options.scans_tokens() {
            let rewritten = buffer.to_string();
            let scanned = strip_apply(&rewritten);
            if self.options.rtl {
                rules.extend(directional_rules(&scanned));
            }
            if self.options.global_prefix {
                rules.extend(global_rules(&scanned));
            }
        }

        if !rules.is_empty() {
            let placement = inject_rules(
                &mut buffer,
                document.style.as_ref(),
                &sanitized,
                &render_rules(&rules),
            )?;
            debug!(rules = rules.len(), ?placement, "injected global rules");
        }

        let (code, map) = buffer.render();
        let code = rename_prefixes(code, &self.options);
        let map = map.encode(
            content,
            &code,
            &EncodeOptions {
                file: input.filename.map(str::to_string),
                hires: true,
                include_content: false,
            },
        );

        Ok(PreprocessOutput {
            code,
            map: Some(map),
        })
    }
}

/// Preprocesses `content` with a one-off [`DeepClasses`].
pub fn preprocess(
    content: &str,
    filename: Option<&str>,
    options: &PreprocessOptions,
) -> Result<PreprocessOutput, PreprocessError> {
    DeepClasses::new(*options).markup(MarkupInput { content, filename })
}
