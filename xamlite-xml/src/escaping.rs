//! XML escaping for text content and attribute values, and quoting for
//! values inside markup-extension braces.

use std::borrow::Cow;
use std::fmt::{self, Write};

/// Wraps a `fmt::Write` and escapes XML special characters as text passes through.
pub(crate) struct EscapingWriter<'a> {
    inner: &'a mut dyn Write,
    attribute: bool,
}

impl<'a> EscapingWriter<'a> {
    /// Escapes `&` `<` `>`.
    pub(crate) fn text(inner: &'a mut dyn Write) -> Self {
        Self {
            inner,
            attribute: false,
        }
    }

    /// Escapes `&` `<` `>` `"`, and the whitespace characters attribute
    /// normalization would otherwise fold into spaces.
    pub(crate) fn attribute(inner: &'a mut dyn Write) -> Self {
        Self {
            inner,
            attribute: true,
        }
    }
}

impl Write for EscapingWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut start = 0;
        for (i, c) in s.char_indices() {
            let escaped = match c {
                '&' => "&amp;",
                '<' => "&lt;",
                '>' => "&gt;",
                '"' if self.attribute => "&quot;",
                '\n' if self.attribute => "&#xA;",
                '\r' if self.attribute => "&#xD;",
                '\t' if self.attribute => "&#x9;",
                _ => continue,
            };
            self.inner.write_str(&s[start..i])?;
            self.inner.write_str(escaped)?;
            start = i + c.len_utf8();
        }
        self.inner.write_str(&s[start..])
    }
}

/// Quote a value written inside `{...}` when it would otherwise be read as
/// syntax: separators, braces, quotes, backslashes, or surrounding spaces.
///
/// Quoted values are wrapped in `'` with `\` before any `'` or `\`.
pub(crate) fn brace_value(text: &str) -> Cow<'_, str> {
    let plain = !text.is_empty()
        && text.trim() == text
        && !text.contains([',', '{', '}', '=', '\'', '"', '\\']);
    if plain {
        return Cow::Borrowed(text);
    }
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}
