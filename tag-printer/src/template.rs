//! Label template placeholder substitution
//!
//! A purely textual pass: every `{{key}}` occurrence is replaced by the
//! matching value. A missing key is left literally in the output so a
//! malformed label is obvious on the physical printout instead of silently
//! losing a field. No nesting, conditionals, or escaping.

use std::collections::HashMap;

/// Result of one substitution pass
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Template text with every known placeholder substituted
    pub text: String,
    /// Keys that occurred in the template but not in the value map,
    /// in order of first occurrence
    pub missing: Vec<String>,
}

impl Rendered {
    /// True when every placeholder was substituted
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Substitute `{{key}}` placeholders in `template` from `values`
///
/// Repeated placeholders are all substituted; keys present in `values` but
/// absent from the template are ignored. An unterminated `{{` is copied
/// through verbatim.
pub fn render(template: &str, values: &HashMap<String, String>) -> Rendered {
    let mut text = String::with_capacity(template.len());
    let mut missing: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        text.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            // No closing braces: not a placeholder, copy through.
            text.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let key = &after_open[..end];
        match values.get(key) {
            Some(value) => text.push_str(value),
            None => {
                text.push_str("{{");
                text.push_str(key);
                text.push_str("}}");
                if !missing.iter().any(|k| k == key) {
                    missing.push(key.to_string());
                }
            }
        }
        rest = &after_open[end + 2..];
    }
    text.push_str(rest);

    Rendered { text, missing }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_known_keys() {
        let out = render("{{a}} and {{b}}", &values(&[("a", "X"), ("b", "Y")]));
        assert_eq!(out.text, "X and Y");
        assert!(out.is_complete());
    }

    #[test]
    fn test_missing_key_left_literal() {
        let out = render("{{a}} and {{b}}", &values(&[("a", "X")]));
        assert_eq!(out.text, "X and {{b}}");
        assert_eq!(out.missing, vec!["b".to_string()]);
    }

    #[test]
    fn test_repeated_placeholder() {
        let out = render("{{a}}{{a}}", &values(&[("a", "Y")]));
        assert_eq!(out.text, "YY");
        assert!(out.is_complete());
    }

    #[test]
    fn test_extraneous_values_ignored() {
        let out = render("plain text", &values(&[("unused", "Z")]));
        assert_eq!(out.text, "plain text");
        assert!(out.is_complete());
    }

    #[test]
    fn test_repeated_missing_key_reported_once() {
        let out = render("{{x}} {{x}} {{y}}", &values(&[]));
        assert_eq!(out.text, "{{x}} {{x}} {{y}}");
        assert_eq!(out.missing, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_unterminated_braces_copied_through() {
        let out = render("price {{amount", &values(&[("amount", "5")]));
        assert_eq!(out.text, "price {{amount");
        assert!(out.missing.is_empty());
    }

    #[test]
    fn test_full_label_render() {
        let vals = values(&[
            ("companyName", "Demo Mart"),
            ("barcode_value", "955001"),
            ("description", "INSTANT NOODLES 5PK"),
            ("unit_price_integer", "RM 4.50"),
            ("copies", "3"),
        ]);
        let out = render(crate::LabelLanguage::Tpsl.default_template(), &vals);
        assert!(out.is_complete());
        assert!(out.text.contains("\"Demo Mart\""));
        assert!(out.text.contains("PRINT 3"));
        assert!(!out.text.contains("{{"));
    }
}
