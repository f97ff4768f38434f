/// 送信メッセージ用のテキストユーティリティ。

/// Escape HTML entities for Telegram `parse_mode=HTML` payloads.
///
/// Feed headlines and summaries are untrusted text; anything that could open
/// a tag or break an attribute is replaced before interpolation.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"S&P" isn't</b>"#),
            "&lt;b&gt;&quot;S&amp;P&quot; isn&#x27;t&lt;/b&gt;"
        );
    }

    #[test]
    fn passes_plain_text_through() {
        assert_eq!(escape_html("Fed raises rates"), "Fed raises rates");
    }
}
