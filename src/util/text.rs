use std::borrow::Cow;

/// True for characters XML 1.0 cannot carry: C0 controls other than tab,
/// newline and carriage return, plus DEL.
fn is_forbidden_control(c: char) -> bool {
    (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{7f}'
}

/// Removes control characters that would make the generated feed invalid XML.
///
/// Returns `Cow::Borrowed` when there is nothing to strip, which is the
/// common case for change log text.
///
/// # Examples
///
/// ```
/// use sl_feeds::util::strip_control_chars;
///
/// assert_eq!(strip_control_chars("tab\tkept"), "tab\tkept");
/// assert_eq!(strip_control_chars("bell\u{7}gone"), "bellgone");
/// ```
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_forbidden_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| !is_forbidden_control(*c)).collect())
}

/// Escapes `&`, `<`, `>` and `"` so text can be embedded in an HTML fragment.
///
/// Item descriptions are HTML; change logs routinely contain e-mail
/// addresses like `<volkerdi@slackware.com>` that must survive as text.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}
