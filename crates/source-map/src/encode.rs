//! Encoding of a [`SourceMap`] into a standard V3 source map.

use crate::{LineCol, LineIndex, MappingKind, SourceMap};
use thiserror::Error;

/// Failure while serializing an encoded source map.
#[derive(Debug, Error)]
pub enum MapError {
    /// The underlying source map writer failed.
    #[error("failed to serialize source map: {0}")]
    Serialize(#[from] sourcemap::Error),

    /// The serialized map was not valid UTF-8.
    #[error("serialized source map is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Options for [`SourceMap::encode`].
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Name written to `file` and `sources[0]`.
    pub file: Option<String>,
    /// Emit a segment for every unedited character instead of one per chunk.
    pub hires: bool,
    /// Embed the original text in `sourcesContent`.
    pub include_content: bool,
}

/// A V3 source map ready to be serialized.
#[derive(Debug, Clone)]
pub struct EncodedSourceMap {
    inner: sourcemap::SourceMap,
}

impl EncodedSourceMap {
    /// Returns the `file` field.
    pub fn file(&self) -> Option<&str> {
        self.inner.get_file()
    }

    /// Returns the source names.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.inner.sources()
    }

    /// Returns the number of encoded segments.
    pub fn segment_count(&self) -> u32 {
        self.inner.get_token_count()
    }

    /// Looks up the original `(line, column)` of a generated position.
    ///
    /// Like source map consumers, this resolves to the closest segment at or
    /// before the position on the same line.
    pub fn lookup(&self, generated: LineCol) -> Option<LineCol> {
        let token = self.inner.lookup_token(generated.line, generated.col)?;
        (token.get_dst_line() == generated.line)
            .then(|| LineCol::new(token.get_src_line(), token.get_src_col()))
    }

    /// Serializes the map to JSON.
    pub fn to_json(&self) -> Result<String, MapError> {
        let mut buf = Vec::new();
        self.inner.to_writer(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl SourceMap {
    /// Encodes the mapping table as a V3 source map.
    ///
    /// `original` and `generated` must be the texts the table was built for.
    pub fn encode(
        &self,
        original: &str,
        generated: &str,
        options: &EncodeOptions,
    ) -> EncodedSourceMap {
        let file = options.file.as_deref();
        let mut builder = sourcemap::SourceMapBuilder::new(file);
        let source_id = builder.add_source(file.unwrap_or_default());
        if options.include_content {
            builder.set_source_contents(source_id, Some(original));
        }

        let original_index = LineIndex::new(original);
        let generated_index = LineIndex::new(generated);

        for mapping in self.mappings() {
            let (Some(mut dst), Some(mut src)) = (
                generated_index.line_col(mapping.generated.start),
                original_index.line_col(mapping.original.start),
            ) else {
                continue;
            };

            match mapping.kind {
                MappingKind::Verbatim => {
                    let chunk = &original[mapping.original.range()];
                    let mut first = true;
                    for ch in chunk.chars() {
                        if ch != '\n' && (options.hires || first) {
                            add_segment(&mut builder, dst, src, source_id);
                        }
                        first = ch == '\n';
                        dst = dst.advance(ch);
                        src = src.advance(ch);
                    }
                }
                MappingKind::Replaced => {
                    add_segment(&mut builder, dst, src, source_id);
                    // every further line of the replacement starts a new segment
                    let content = &generated[mapping.generated.range()];
                    let trimmed = content.strip_suffix('\n').unwrap_or(content);
                    for (idx, _) in trimmed.match_indices('\n') {
                        let line = dst.advance_str(&content[..=idx]).line;
                        add_segment(&mut builder, LineCol::new(line, 0), src, source_id);
                    }
                }
            }
        }

        EncodedSourceMap {
            inner: builder.into_sourcemap(),
        }
    }
}

fn add_segment(
    builder: &mut sourcemap::SourceMapBuilder,
    dst: LineCol,
    src: LineCol,
    source_id: u32,
) {
    builder.add_raw(
        dst.line,
        dst.col,
        src.line,
        src.col,
        Some(source_id),
        None,
        false,
    );
}
