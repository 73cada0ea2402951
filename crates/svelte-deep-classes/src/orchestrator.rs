//! Main orchestration logic.

use crate::cli::Args;
use crate::config::Config;
use crate::output::{Formatter, RunSummary};
use camino::{Utf8Path, Utf8PathBuf};
use deep_classes::{DeepClasses, MarkupInput, PreprocessError, PreprocessOptions};
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::Diagnostic;
use rayon::prelude::*;
use source_map::{EncodedSourceMap, MapError};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Ignored in every run, on top of `--ignore` and the config file.
const DEFAULT_IGNORES: [&str; 3] = ["**/node_modules/**", "**/.svelte-kit/**", "**/dist/**"];

/// Orchestration errors.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    /// The current directory could not be determined.
    #[error("could not determine the current directory")]
    CurrentDir(#[source] io::Error),

    /// A path that cannot be represented as UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    /// A path given on the command line does not exist.
    #[error("path does not exist: {0}")]
    #[diagnostic(code(svelte_deep_classes::missing_path))]
    MissingPath(Utf8PathBuf),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    #[diagnostic(
        code(svelte_deep_classes::invalid_glob),
        help("patterns are matched against paths relative to the workspace, e.g. `**/generated/**`")
    )]
    InvalidGlob(String),

    /// The config file could not be read.
    #[error("failed to read config {path}")]
    ReadConfig {
        /// Path of the config file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The config file is not valid.
    #[error("invalid config {path}: {source}")]
    #[diagnostic(
        code(svelte_deep_classes::invalid_config),
        help("supported keys are `rtl`, `globalPrefix`, `extensions` and `ignore`")
    )]
    InvalidConfig {
        /// Path of the config file.
        path: Utf8PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A component file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Path of the file, relative to the workspace.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {path}")]
    Write {
        /// Path of the file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The preprocessor rejected a file.
    #[error("{path}: {source}")]
    #[diagnostic(code(svelte_deep_classes::preprocess))]
    Preprocess {
        /// Path of the file, relative to the workspace.
        path: Utf8PathBuf,
        /// The preprocessor error.
        source: PreprocessError,
    },

    /// A source map could not be serialized.
    #[error("failed to serialize the source map of {path}")]
    Map {
        /// Path of the file, relative to the workspace.
        path: Utf8PathBuf,
        /// The serialization error.
        source: MapError,
    },

    /// The JSON report could not be serialized.
    #[error("failed to serialize output")]
    Output(#[source] serde_json::Error),
}

/// A successfully processed file.
#[derive(Debug)]
pub struct Processed {
    /// The rewritten markup.
    pub code: String,
    /// Maps `code` back to the original file.
    pub map: Option<EncodedSourceMap>,
    /// True if `code` equals the original content.
    pub unchanged: bool,
}

/// The outcome for one file.
#[derive(Debug)]
pub struct FileReport {
    /// Path relative to the workspace.
    pub path: Utf8PathBuf,
    /// What happened to the file.
    pub outcome: Result<Processed, CliError>,
}

/// Runs the preprocessor on every selected file and prints the results.
pub fn run(args: &Args) -> Result<RunSummary, CliError> {
    let workspace = resolve_workspace(&args.workspace)?;
    let config = Config::find(&workspace, args.config.as_deref())?;

    let options = PreprocessOptions {
        rtl: args.rtl || config.rtl,
        global_prefix: args.global_prefix || config.global_prefix,
    };
    debug!(?options, %workspace, "resolved options");

    let ignore_set = build_ignore_set(args.ignore.iter().chain(&config.ignore))?;
    let out_dir = args.out_dir.as_ref().map(|dir| workspace.join(dir));
    let files = collect_files(
        &workspace,
        &args.paths,
        &config.file_extensions(),
        &ignore_set,
        out_dir.as_deref(),
    )?;
    info!("processing {} files", files.len());

    let preprocessor = DeepClasses::new(options);
    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|file_path| {
            let relative = file_path
                .strip_prefix(&workspace)
                .unwrap_or(file_path)
                .to_owned();
            let outcome = process_file(
                &preprocessor,
                file_path,
                &relative,
                out_dir.as_deref(),
                args.source_map,
            );
            FileReport {
                path: relative,
                outcome,
            }
        })
        .collect();

    let formatter = Formatter::new(args.output, out_dir.is_some());
    formatter.print(reports)
}

/// Makes the workspace absolute.
fn resolve_workspace(workspace: &Utf8Path) -> Result<Utf8PathBuf, CliError> {
    if workspace.is_absolute() {
        return Ok(workspace.to_owned());
    }
    let current = std::env::current_dir().map_err(CliError::CurrentDir)?;
    let current = Utf8PathBuf::try_from(current)
        .map_err(|e| CliError::NonUtf8Path(e.into_path_buf().display().to_string()))?;
    Ok(current.join(workspace))
}

/// Builds the ignore set from user patterns and the defaults.
fn build_ignore_set<'a>(patterns: impl Iterator<Item = &'a String>) -> Result<GlobSet, CliError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.map(String::as_str).chain(DEFAULT_IGNORES) {
        let glob = Glob::new(pattern).map_err(|e| CliError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| CliError::InvalidGlob(e.to_string()))
}

/// Expands the requested paths into a sorted, de-duplicated file list.
///
/// Files named explicitly are always kept. Files found by walking a
/// directory must match an extension and no ignore pattern, and must not
/// live in the output directory.
fn collect_files(
    workspace: &Utf8Path,
    paths: &[Utf8PathBuf],
    extensions: &[&str],
    ignore_set: &GlobSet,
    out_dir: Option<&Utf8Path>,
) -> Result<Vec<Utf8PathBuf>, CliError> {
    let mut files = BTreeSet::new();

    for path in paths {
        let path = workspace.join(path);
        if path.is_file() {
            files.insert(path);
            continue;
        }
        if !path.is_dir() {
            return Err(CliError::MissingPath(path));
        }

        let found = WalkDir::new(&path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
            .filter(|p| {
                let file_name = p.file_name().unwrap_or("");
                extensions.iter().any(|ext| file_name.ends_with(ext))
            })
            .filter(|p| out_dir.map_or(true, |dir| !p.starts_with(dir)))
            .filter(|p| {
                let relative = p.strip_prefix(workspace).unwrap_or(p);
                !ignore_set.is_match(relative.as_str())
            });
        files.extend(found);
    }

    Ok(files.into_iter().collect())
}

/// Reads, preprocesses and optionally writes one file.
fn process_file(
    preprocessor: &DeepClasses,
    file_path: &Utf8Path,
    relative: &Utf8Path,
    out_dir: Option<&Utf8Path>,
    source_map: bool,
) -> Result<Processed, CliError> {
    let content = fs::read_to_string(file_path).map_err(|source| CliError::Read {
        path: relative.to_owned(),
        source,
    })?;

    let output = preprocessor
        .markup(MarkupInput {
            content: &content,
            filename: Some(relative.as_str()),
        })
        .map_err(|source| CliError::Preprocess {
            path: relative.to_owned(),
            source,
        })?;
    let unchanged = output.code == content;
    debug!(path = %relative, unchanged, "processed");

    if let Some(out_dir) = out_dir {
        let target = out_dir.join(relative);
        write_file(&target, &output.code)?;
        if let Some(map) = output.map.as_ref().filter(|_| source_map) {
            let json = map.to_json().map_err(|source| CliError::Map {
                path: relative.to_owned(),
                source,
            })?;
            write_file(&Utf8PathBuf::from(format!("{target}.map")), &json)?;
        }
    }

    Ok(Processed {
        code: output.code,
        map: output.map,
        unchanged,
    })
}

fn write_file(path: &Utf8Path, content: &str) -> Result<(), CliError> {
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    };
    write().map_err(|source| CliError::Write {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    fn touch(root: &Utf8Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<p>hi</p>").unwrap();
    }

    fn relative(root: &Utf8Path, files: Vec<Utf8PathBuf>) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_collect_files_filters_and_sorts() {
        let (_dir, root) = workspace();
        touch(&root, "src/b.svelte");
        touch(&root, "src/a.svelte");
        touch(&root, "src/a.ts");
        touch(&root, "node_modules/pkg/C.svelte");
        touch(&root, "src/generated/D.svelte");
        touch(&root, "out/src/a.svelte");

        let ignore = build_ignore_set(["**/generated/**".to_string()].iter()).unwrap();
        let files = collect_files(
            &root,
            &[Utf8PathBuf::from(".")],
            &[".svelte"],
            &ignore,
            Some(&root.join("out")),
        )
        .unwrap();

        assert_eq!(
            relative(&root, files),
            vec!["src/a.svelte".to_string(), "src/b.svelte".to_string()]
        );
    }

    #[test]
    fn test_explicit_files_are_kept_once() {
        let (_dir, root) = workspace();
        touch(&root, "src/Card.svelte");
        touch(&root, "src/notes.md");

        let ignore = build_ignore_set(std::iter::empty()).unwrap();
        let files = collect_files(
            &root,
            &[
                Utf8PathBuf::from("src/notes.md"),
                Utf8PathBuf::from("src"),
                Utf8PathBuf::from("src/Card.svelte"),
            ],
            &[".svelte"],
            &ignore,
            None,
        )
        .unwrap();

        assert_eq!(
            relative(&root, files),
            vec!["src/Card.svelte".to_string(), "src/notes.md".to_string()]
        );
    }

    #[test]
    fn test_missing_path() {
        let (_dir, root) = workspace();
        let ignore = build_ignore_set(std::iter::empty()).unwrap();
        let error = collect_files(
            &root,
            &[Utf8PathBuf::from("nope")],
            &[".svelte"],
            &ignore,
            None,
        )
        .unwrap_err();
        assert!(matches!(error, CliError::MissingPath(_)));
    }

    #[test]
    fn test_invalid_glob() {
        let error = build_ignore_set(["a[".to_string()].iter()).unwrap_err();
        assert!(matches!(error, CliError::InvalidGlob(_)));
    }

    #[test]
    fn test_process_file_writes_output_and_map() {
        let (_dir, root) = workspace();
        let source = root.join("Card.svelte");
        fs::write(&source, "<Card class=\"p-2\"/>").unwrap();
        let out_dir = root.join("build");

        let processed = process_file(
            &DeepClasses::default(),
            &source,
            Utf8Path::new("Card.svelte"),
            Some(&out_dir),
            true,
        )
        .unwrap();

        assert!(!processed.unchanged);
        assert_eq!(
            fs::read_to_string(out_dir.join("Card.svelte")).unwrap(),
            processed.code
        );
        let map = fs::read_to_string(out_dir.join("Card.svelte.map")).unwrap();
        assert!(map.contains("\"mappings\""));
    }

    #[test]
    fn test_process_file_reports_relative_paths() {
        let (_dir, root) = workspace();
        let error = process_file(
            &DeepClasses::default(),
            &root.join("src/Missing.svelte"),
            Utf8Path::new("src/Missing.svelte"),
            None,
            false,
        )
        .unwrap_err();
        let CliError::Read { path, .. } = &error else {
            panic!("expected a read error, got {error:?}");
        };
        assert_eq!(path.as_str(), "src/Missing.svelte");
        assert_eq!(error.to_string(), "failed to read src/Missing.svelte");
    }

    #[test]
    fn test_process_file_reports_parse_errors() {
        let (_dir, root) = workspace();
        let source = root.join("Broken.svelte");
        fs::write(&source, "<Card class=\"x\">").unwrap();

        let error = process_file(
            &DeepClasses::default(),
            &source,
            Utf8Path::new("Broken.svelte"),
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(error, CliError::Preprocess { .. }));
        assert!(error.to_string().starts_with("Broken.svelte: failed to parse markup"));
    }
}
