/// Escape a TEXT value for a calendar content line.
///
/// Backslashes must be escaped first; doing commas or semicolons first would
/// double the backslashes they introduce.
pub(crate) fn escape_text(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace("\r\n", "\\n")
        .replace(['\r', '\n'], "\\n")
}

/// Inverse of [`escape_text`]. Unknown escapes are kept verbatim.
pub(crate) fn unescape_text(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('n' | 'N') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_each_special_once() {
        let escaped = escape_text(r"a;b,c\d");
        assert_eq!(escaped, r"a\;b\,c\\d");
        assert_eq!(escaped.matches(r"\;").count(), 1);
        assert_eq!(escaped.matches(r"\,").count(), 1);
        assert_eq!(escaped.matches(r"\\").count(), 1);
    }

    #[test]
    fn test_escape_does_not_double_escape() {
        assert_eq!(escape_text(r"\,"), r"\\\,");
    }

    #[test]
    fn test_escape_line_breaks() {
        assert_eq!(escape_text("one\ntwo\r\nthree"), r"one\ntwo\nthree");
    }

    #[test]
    fn test_unescape_inverts_escape() {
        let raw = "path C:\\lab; temp 1,5\nnext line";
        assert_eq!(unescape_text(&escape_text(raw)), raw);
    }

    #[test]
    fn test_unescape_keeps_unknown_sequences() {
        assert_eq!(unescape_text(r"a\tb"), r"a\tb");
        assert_eq!(unescape_text("trailing\\"), "trailing\\");
    }
}
