//! Global style rules for class groups and prefixed utility classes.

use crate::naming::{deep_name, escape_class};
use indexmap::IndexSet;
use regex::Regex;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::sync::OnceLock;

/// Marker that makes a class global.
pub const GLOBAL_PREFIX: &str = "gl:";

/// A text direction selected by a class prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `rtl:`
    Rtl,
    /// `ltr:`
    Ltr,
}

impl Direction {
    /// Both directions, in emission order.
    pub const ALL: [Direction; 2] = [Direction::Rtl, Direction::Ltr];

    /// Returns the value used in the `[dir=...]` attribute selector.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Rtl => "rtl",
            Direction::Ltr => "ltr",
        }
    }

    /// Returns the class prefix, e.g. `rtl:`.
    pub fn prefix(self) -> &'static str {
        match self {
            Direction::Rtl => "rtl:",
            Direction::Ltr => "ltr:",
        }
    }

    /// Returns the prefix that replaces [`Direction::prefix`] in output.
    pub fn renamed_prefix(self) -> &'static str {
        match self {
            Direction::Rtl => "rtl_",
            Direction::Ltr => "ltr_",
        }
    }

    fn token_pattern(self) -> &'static Regex {
        static RTL: OnceLock<Regex> = OnceLock::new();
        static LTR: OnceLock<Regex> = OnceLock::new();
        match self {
            Direction::Rtl => {
                RTL.get_or_init(|| Regex::new(r"rtl:[A-Za-z0-9:()\[\]-]+").unwrap())
            }
            Direction::Ltr => {
                LTR.get_or_init(|| Regex::new(r"ltr:[A-Za-z0-9:()\[\]-]+").unwrap())
            }
        }
    }
}

fn global_token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"gl:[A-Za-z0-9:()\[\]-]+").unwrap())
}

/// One `:global(...) { @apply ...; }` rule.
///
/// Renders with a leading space so rules can be concatenated directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// Restricts the rule to an ancestor with this `dir` attribute.
    pub direction: Option<Direction>,
    /// The escaped class selector, including the leading `.`.
    pub selector: String,
    /// The utility classes passed to `@apply`.
    pub apply: String,
}

impl fmt::Display for StyleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(direction) => write!(
                f,
                " :global([dir={}] {}) {{ @apply {}; }}",
                direction.as_str(),
                self.selector,
                self.apply
            ),
            None => write!(f, " :global({}) {{ @apply {}; }}", self.selector, self.apply),
        }
    }
}

fn class_selector(class: &str) -> String {
    format!(".{}", escape_class(class))
}

/// Builds the rules for one class group.
///
/// The plain rule is always emitted. With `rtl` on, the tokens carrying a
/// direction prefix also get one rule per direction, prefix removed.
pub fn group_rules(group: &str, rtl: bool) -> Vec<StyleRule> {
    let selector = class_selector(&deep_name(group));
    let tokens: Vec<&str> = group.split(' ').collect();

    let plain: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| Direction::ALL.iter().all(|d| !t.contains(d.prefix())))
        .collect();
    let mut rules = vec![StyleRule {
        direction: None,
        selector: selector.clone(),
        apply: plain.join(" "),
    }];

    if rtl {
        for direction in Direction::ALL {
            let prefixed: Vec<String> = tokens
                .iter()
                .filter(|t| t.contains(direction.prefix()))
                .map(|t| t.replacen(direction.prefix(), "", 1))
                .collect();
            if !prefixed.is_empty() {
                rules.push(StyleRule {
                    direction: Some(direction),
                    selector: selector.clone(),
                    apply: prefixed.join(" "),
                });
            }
        }
    }
    rules
}

/// Distinct matches of `pattern` in order of first appearance.
fn distinct_tokens<'t>(pattern: &Regex, text: &'t str) -> IndexSet<&'t str, FxBuildHasher> {
    pattern.find_iter(text).map(|m| m.as_str()).collect()
}

/// Builds one rule per distinct `rtl:` token, then per distinct `ltr:` token.
pub fn directional_rules(text: &str) -> Vec<StyleRule> {
    let mut rules = Vec::new();
    for direction in Direction::ALL {
        for token in distinct_tokens(direction.token_pattern(), text) {
            let class = &token[direction.prefix().len()..];
            rules.push(StyleRule {
                direction: Some(direction),
                selector: class_selector(&format!("{}{class}", direction.renamed_prefix())),
                apply: class.to_string(),
            });
        }
    }
    rules
}

/// Builds one rule per distinct `gl:` token.
pub fn global_rules(text: &str) -> Vec<StyleRule> {
    distinct_tokens(global_token_pattern(), text)
        .into_iter()
        .map(|token| {
            let class = &token[GLOBAL_PREFIX.len()..];
            StyleRule {
                direction: None,
                selector: class_selector(&format!("gl_{class}")),
                apply: class.to_string(),
            }
        })
        .collect()
}

/// Concatenates rendered rules.
pub fn render_rules(rules: &[StyleRule]) -> String {
    rules.iter().map(ToString::to_string).collect()
}
