const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&#39;", "'"),
    ("&rsquo;", "\u{2019}"),
    ("&lsquo;", "\u{2018}"),
    ("&laquo;", "\u{ab}"),
    ("&raquo;", "\u{bb}"),
    ("&hellip;", "\u{2026}"),
    ("&eacute;", "é"),
    ("&egrave;", "è"),
    ("&agrave;", "à"),
    ("&ccedil;", "ç"),
    ("&amp;", "&"),
];

/// Plain-text snippet of a feed summary, the way a card shows it:
/// - `<script>` and `<style>` blocks are dropped with their content
/// - other tags are stripped
/// - a handful of common entities are decoded
/// - whitespace runs collapse to one space
pub fn text_snippet(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    let mut buf = input.to_string();
    for tag in ["script", "style"] {
        let open = format!("<{tag}");
        let close = format!("</{tag}>");
        loop {
            let lower = buf.to_ascii_lowercase();
            let Some(start) = lower.find(&open) else {
                break;
            };
            match lower[start..].find(&close) {
                Some(end_rel) => buf.replace_range(start..start + end_rel + close.len(), ""),
                None => buf.truncate(start),
            }
        }
    }

    let mut text = String::with_capacity(buf.len());
    let mut in_tag = false;
    for ch in buf.chars() {
        match ch {
            '<' => {
                in_tag = true;
                // tags separate words: "<p>a</p><p>b</p>" reads "a b"
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    // &amp; last so "&amp;lt;" stays literal "&lt;"
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_blocks() {
        let html = "<p>Le <b>conseil</b> a voté.</p><script>track()</script><STYLE>p{}</STYLE><p>Suite</p>";
        assert_eq!(text_snippet(html), "Le conseil a voté. Suite");
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(
            text_snippet("Sant&eacute; &amp; services &laquo;&nbsp;essentiels&nbsp;&raquo;"),
            "Santé & services « essentiels »"
        );
        assert_eq!(text_snippet("&amp;lt;"), "&lt;");
    }

    #[test]
    fn unclosed_script_drops_the_rest() {
        assert_eq!(text_snippet("Avant<script>var x = 1;"), "Avant");
    }

    #[test]
    fn blank_input_is_empty() {
        assert_eq!(text_snippet("   "), "");
        assert_eq!(text_snippet("<br/>"), "");
    }
}
