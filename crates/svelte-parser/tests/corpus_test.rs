//! Corpus tests that parse all fixture files to ensure no panics
//! and that valid fixtures produce no errors.

use std::fs;
use std::path::{Path, PathBuf};
use svelte_parser::{parse, walk, TemplateNode};

fn get_fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures")
}

fn collect_svelte_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "svelte") {
                files.push(path);
            } else if path.is_dir() {
                files.extend(collect_svelte_files(&path));
            }
        }
    }
    files.sort();
    files
}

#[test]
fn test_parse_all_valid_fixtures() {
    let files = collect_svelte_files(&get_fixtures_dir().join("valid"));
    assert!(!files.is_empty(), "No valid fixtures found");

    for path in &files {
        let source = fs::read_to_string(path).unwrap();
        let result = parse(&source);
        assert!(
            result.errors.is_empty(),
            "{} should parse without errors, got: {:?}",
            path.display(),
            result.errors
        );
    }
}

#[test]
fn test_parse_all_invalid_fixtures() {
    let files = collect_svelte_files(&get_fixtures_dir().join("invalid"));
    assert!(!files.is_empty(), "No invalid fixtures found");

    for path in &files {
        let source = fs::read_to_string(path).unwrap();
        let result = parse(&source);
        assert!(
            !result.errors.is_empty(),
            "{} should report at least one error",
            path.display()
        );
        for error in &result.errors {
            assert!(usize::from(error.span.end) <= source.len());
        }
    }
}

#[test]
fn test_every_component_in_fixtures_is_found() {
    let source = fs::read_to_string(get_fixtures_dir().join("valid/blocks.svelte")).unwrap();
    let document = parse(&source).document;

    let mut names = Vec::new();
    walk(&document.fragment.nodes, &mut |node| match node {
        TemplateNode::Component(c) => names.push(c.name.to_string()),
        TemplateNode::SvelteElement(e) if e.kind.is_component() => {
            names.push("svelte:component".to_string())
        }
        _ => {}
    });
    insta::assert_debug_snapshot!(names, @r###"
    [
        "Row",
        "Tooltip.Root",
        "svelte:component",
    ]
    "###);
}
