use std::time::Duration;

/// Rounded share of `part` in `total`, 0 when there is nothing to score.
pub fn percentage(part: usize, total: usize) -> u32 {
    match total {
        positive if positive > 0 => ((part as f64 / total as f64) * 100.0).round() as u32,
        _ => 0,
    }
}

/// `mm:ss`, with minutes allowed to grow past 59
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

const MARKUP_TAGS: &[&str] = &[
    "b", "br", "code", "div", "em", "i", "p", "pre", "small", "span", "strong", "sub", "sup", "u",
];

/// Flattens the light HTML found in question text to plain text.
/// `<br>` becomes a newline, known tags are dropped and common entities decoded.
/// Anything else in angle brackets, such as `Vec<u8>`, is kept as written.
pub fn strip_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match tail.find('>').and_then(|close| tag_name(&tail[1..close]).map(|n| (close, n))) {
            Some((close, name)) => {
                if name == "br" || (name == "p" && tail[1..].starts_with('/')) {
                    out.push('\n');
                }
                rest = &tail[close + 1..];
            }
            None => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    decode_entities(&out)
}

fn tag_name(inner: &str) -> Option<String> {
    let name = inner
        .trim()
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()?
        .to_ascii_lowercase();
    MARKUP_TAGS.contains(&name.as_str()).then_some(name)
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(3, 4), 75);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn test_percentage_empty_total() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(3, 0), 0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_millis(61_900)), "01:01");
        assert_eq!(format_clock(Duration::from_secs(3600)), "60:00");
    }

    #[test]
    fn test_strip_markup_tags() {
        assert_eq!(
            strip_markup("Which is <strong>bold</strong>?"),
            "Which is bold?"
        );
        assert_eq!(strip_markup("line one<br>line two<br/>"), "line one\nline two\n");
    }

    #[test]
    fn test_strip_markup_entities() {
        assert_eq!(strip_markup("a &lt; b &amp;&amp; c"), "a < b && c");
        assert_eq!(strip_markup("Vec&lt;u8&gt;"), "Vec<u8>");
    }

    #[test]
    fn test_strip_markup_keeps_unterminated_bracket() {
        assert_eq!(strip_markup("1 < 2"), "1 < 2");
    }

    #[test]
    fn test_strip_markup_keeps_generics() {
        assert_eq!(strip_markup("Vec<Box<dyn Trait>>"), "Vec<Box<dyn Trait>>");
        assert_eq!(strip_markup("<code>Option<T></code>"), "Option<T>");
    }

    #[test]
    fn test_strip_markup_paragraphs() {
        assert_eq!(strip_markup("<p>one</p><p>two</p>"), "one\ntwo\n");
    }

    #[test]
    fn test_strip_markup_plain_text_untouched() {
        assert_eq!(strip_markup("plain"), "plain");
    }
}
