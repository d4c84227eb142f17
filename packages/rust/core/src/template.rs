//! `{placeholder}` template rendering.
//!
//! Placeholders are `{identifier}` where the identifier matches
//! `[A-Za-z_][A-Za-z0-9_]*`. Any other brace usage (`{ }`, `{1}`, JSON
//! snippets) is literal text. Rendering is a single left-to-right pass:
//! substituted values are inserted verbatim and never re-scanned.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use contentcrew_shared::{ContentCrewError, Result};

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex")
});

/// Template variable bindings (`name -> value`).
pub type Variables = HashMap<String, String>;

/// Render `template` against `variables`.
///
/// Fails with [`ContentCrewError::MissingVariable`] naming the first unbound
/// placeholder.
pub fn render(template: &str, variables: &Variables) -> Result<String> {
    render_with(template, |name| variables.get(name).map(String::as_str))
}

/// Render `template`, resolving each placeholder through `lookup`.
pub fn render_with<'a, F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = lookup(name.as_str())
            .ok_or_else(|| ContentCrewError::missing_variable(name.as_str()))?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Placeholder names referenced by `template`, in order of appearance
/// (duplicates included).
pub fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Whether `name` is usable as a placeholder (and therefore as a stage id).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
