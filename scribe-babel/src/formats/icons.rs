//! Icon mapping for the tree visualization format

/// Get the Unicode icon for a given rich-document node type
///
/// Node types are the serialized `type` tags (`paragraph`, `shortcodeBlock`, ...).
pub fn get_icon(node_type: &str) -> &'static str {
    match node_type {
        "document" => "⧉",
        "paragraph" => "¶",
        "heading" => "§",
        "bulletList" | "orderedList" => "☰",
        "listItem" => "•",
        "blockquote" => "❝",
        "githubAlert" => "⚠",
        "codeBlock" => "𝒱",
        "table" => "▦",
        "tableRow" => "▤",
        "horizontalRule" => "⎯",
        "shortcodeBlock" | "shortcode" => "⟦",
        "rawBlock" => "⟨",
        "preservedBlock" | "preserved" => "◆",
        "summaryDelimiter" => "✂",
        "text" => "◦",
        "strong" => "𝐁",
        "emphasis" => "𝐼",
        "strike" => "≠",
        "code" => "ƒ",
        "link" => "⊕",
        "image" => "▣",
        "hardBreak" => "↵",
        "htmlInline" => "<",
        _ => "○",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_mappings() {
        assert_eq!(get_icon("document"), "⧉");
        assert_eq!(get_icon("paragraph"), "¶");
        assert_eq!(get_icon("orderedList"), get_icon("bulletList"));
        assert_eq!(get_icon("shortcodeBlock"), "⟦");
        assert_eq!(get_icon("summaryDelimiter"), "✂");
    }

    #[test]
    fn test_unknown_icon() {
        assert_eq!(get_icon("whatever"), "○");
    }
}
