//! Preview CSS from a descriptor's `css_template`

use super::Attributes;
use once_cell::sync::Lazy;
use regex::Regex;

static CSS_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([\w-]+)\s*\}\}").expect("css placeholder pattern is valid"));

/// Fill `{{attr}}` placeholders in `template` from `values`.
///
/// Placeholders with no value are removed, and any declaration left without a
/// value is dropped.
pub fn interpolate_css(template: &str, values: &Attributes) -> String {
    let filled = CSS_PLACEHOLDER_RE.replace_all(template, |caps: &regex::Captures| {
        values.get(&caps[1]).unwrap_or_default().to_string()
    });
    filled
        .split(';')
        .map(str::trim)
        .filter(|declaration| match declaration.split_once(':') {
            Some((property, value)) => !property.trim().is_empty() && !value.trim().is_empty(),
            None => false,
        })
        .map(|declaration| {
            let (property, value) = declaration.split_once(':').unwrap_or((declaration, ""));
            format!("{}: {}", property.trim(), value.trim())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_known_placeholders() {
        let values: Attributes = [("color", "red"), ("size", "12px")].into_iter().collect();
        assert_eq!(
            interpolate_css("color: {{color}}; font-size: {{ size }};", &values),
            "color: red; font-size: 12px"
        );
    }

    #[test]
    fn drops_empty_declarations() {
        let values: Attributes = [("color", "red")].into_iter().collect();
        assert_eq!(
            interpolate_css("color: {{color}}; background: {{bg}}; ;", &values),
            "color: red"
        );
        assert_eq!(interpolate_css("border: {{w}}", &Attributes::new()), "");
    }
}
