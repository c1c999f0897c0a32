use std::borrow::Cow;

/// Output options for [`XmlTextSink`](crate::XmlTextSink).
#[derive(Debug, Clone)]
pub struct XmlWriterSettings {
    /// Whether to pretty-print with indentation (default: false)
    pub pretty: bool,
    /// Indentation string for pretty-printing (default: "  ")
    pub indent: Cow<'static, str>,
    /// Whether elements without content are written as `<a />` (default: true)
    pub self_closing: bool,
}

impl Default for XmlWriterSettings {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: Cow::Borrowed("  "),
            self_closing: true,
        }
    }
}

impl XmlWriterSettings {
    /// Compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty-printing with default indentation.
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Set a custom indentation string (implies pretty-printing).
    pub fn indent(mut self, indent: impl Into<Cow<'static, str>>) -> Self {
        self.indent = indent.into();
        self.pretty = true;
        self
    }

    /// Write empty elements as a start and an end tag instead of `<a />`.
    pub fn self_closing(mut self, self_closing: bool) -> Self {
        self.self_closing = self_closing;
        self
    }
}
