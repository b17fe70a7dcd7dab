//! Extraction of `{{placeholder}}` variables from prompt and request templates.

use crate::property::Property;
use itertools::Itertools;

/// Returns the placeholder names of `template` in order of first appearance.
///
/// A placeholder is an identifier wrapped in double braces, surrounding spaces allowed:
/// `{{ city }}`. Anything else between braces is left alone.
pub fn placeholder_names(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            break;
        };
        let candidate = after_open[..end].trim();
        if is_identifier(candidate) {
            names.push(candidate.to_string());
        }
        rest = &after_open[end + 2..];
    }
    names.into_iter().unique().collect()
}

/// String input properties for every placeholder found across `templates`.
pub fn placeholder_properties<'a>(templates: impl IntoIterator<Item = &'a str>) -> Vec<Property> {
    templates
        .into_iter()
        .flat_map(placeholder_names)
        .unique()
        .map(Property::string)
        .collect()
}

fn is_identifier(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_placeholders_in_order_without_duplicates() {
        let names = placeholder_names("Go from {{origin}} to {{ destination }} and back to {{origin}}");
        assert_eq!(names, vec!["origin", "destination"]);
    }

    #[test]
    fn ignores_non_identifiers_and_unclosed_braces() {
        assert!(placeholder_names("{{ 1abc }} {{a b}} {{open").is_empty());
        assert_eq!(placeholder_names("{{}}{{x}}"), vec!["x"]);
    }

    #[test]
    fn properties_are_strings_shared_across_templates() {
        let properties = placeholder_properties(["Do {{x}}", "then {{y}} with {{x}}"]);
        let titles: Vec<&str> = properties.iter().map(Property::title).collect();
        assert_eq!(titles, vec!["x", "y"]);
        assert!(properties.iter().all(|p| p.json_type() == &crate::property::JsonType::String));
    }
}
