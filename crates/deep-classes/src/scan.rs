//! Discovery of class attributes passed to child components.

use source_map::Span;
use svelte_parser::{walk, Attribute, SvelteDocument, TemplateNode};

/// A literal `class` value on a component usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassUsage<'doc> {
    /// The verbatim class string.
    pub group: &'doc str,
    /// Where the string sits in the parsed text.
    pub span: Span,
}

/// Collects class usages on component nodes in document order.
///
/// Only the leading literal part of a value is taken. Empty values,
/// expression values and boolean attributes are skipped.
pub fn component_classes(document: &SvelteDocument) -> Vec<ClassUsage<'_>> {
    let mut usages = Vec::new();
    walk(&document.fragment.nodes, &mut |node| {
        let attributes = match node {
            TemplateNode::Component(component) => &component.attributes,
            TemplateNode::SvelteElement(element) if element.kind.is_component() => {
                &element.attributes
            }
            _ => return,
        };
        let Some(Attribute::Normal(class)) = attributes
            .iter()
            .find(|attr| attr.name() == Some("class"))
        else {
            return;
        };
        if let Some(text) = class.value.leading_text().filter(|t| !t.raw.is_empty()) {
            usages.push(ClassUsage {
                group: &text.raw,
                span: text.span,
            });
        }
    });
    usages
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use svelte_parser::parse;

    fn groups(source: &str) -> Vec<String> {
        let document = parse(source).into_result().unwrap();
        component_classes(&document)
            .into_iter()
            .map(|usage| {
                assert_eq!(&source[usage.span.range()], usage.group);
                usage.group.to_string()
            })
            .collect()
    }

    #[test]
    fn test_only_components_are_scanned() {
        assert_eq!(
            groups(r#"<div class="a"><Button class="b" /><span class="c"/></div>"#),
            vec!["b"]
        );
    }

    #[test]
    fn test_nested_and_block_children() {
        let source = r#"{#if x}<Outer class="o"><Inner class="i"/></Outer>{:else}<Alt class="e"/>{/if}
{#each xs as x}<Item class="it"/>{/each}"#;
        assert_eq!(groups(source), vec!["o", "i", "e", "it"]);
    }

    #[test]
    fn test_svelte_self_and_component() {
        let source = r#"<svelte:self class="s"/><svelte:component this={C} class="c"/><svelte:window class="w"/>"#;
        assert_eq!(groups(source), vec!["s", "c"]);
    }

    #[test]
    fn test_skipped_values() {
        let source = r#"<A class={x}/><B class/><C class=""/><D {...p}/><E class:active={on}/>"#;
        assert!(groups(source).is_empty());
    }

    #[test]
    fn test_concat_takes_leading_text() {
        assert_eq!(
            groups(r#"<A class="p-2 {extra}"/><B class="{extra} p-2"/>"#),
            vec!["p-2 "]
        );
    }

    #[test]
    fn test_duplicates_are_reported_per_occurrence() {
        assert_eq!(
            groups(r#"<A class="x y"/><B class="x y"/>"#),
            vec!["x y", "x y"]
        );
    }
}
