use std::sync::OnceLock;

use regex::Regex;

static MARKUP: OnceLock<Regex> = OnceLock::new();

/// Scrub free-form user text before it enters the task model. Everything
/// this returns is rendered verbatim later, so markup tags, terminal escape
/// sequences and control characters must not survive.
pub fn sanitize(raw: &str) -> String {
    let markup = MARKUP.get_or_init(|| Regex::new("<[^>]*>").expect("static pattern"));

    let stripped = markup.replace_all(raw, "");
    let mut out = String::with_capacity(stripped.len());
    let mut in_escape = false;
    let mut pending_space = false;

    for ch in stripped.chars() {
        if in_escape {
            // CSI sequences end on an alphabetic final byte.
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }
        if ch == '\u{1b}' {
            in_escape = true;
            continue;
        }
        if ch.is_control() || ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn strips_markup_tags() {
        assert_eq!(sanitize("<script>alert(1)</script>"), "alert(1)");
        assert_eq!(sanitize("<b>bold</b> move"), "bold move");
    }

    #[test]
    fn strips_terminal_escapes_and_controls() {
        assert_eq!(sanitize("\u{1b}[31mred\u{1b}[0m alert\u{7}"), "red alert");
    }

    #[test]
    fn collapses_and_trims_whitespace() {
        assert_eq!(sanitize("  buy\t\tmilk \n today  "), "buy milk today");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize("mua sữa"), "mua sữa");
        assert_eq!(sanitize("a < b"), "a < b");
    }

    #[test]
    fn pure_markup_becomes_empty() {
        assert_eq!(sanitize("<div></div>"), "");
    }
}
