//! A [`MarkupSink`] that writes XML text.

use std::fmt::{self, Write};

use xamlite::NamespaceDeclaration;

use crate::escaping::EscapingWriter;
use crate::{MarkupSink, XmlWriterSettings};

/// Misuse of an [`XmlTextSink`], or a failure of the underlying writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum XmlSinkError {
    /// The underlying writer failed.
    Fmt,
    /// An attribute or namespace declaration arrived after the start tag was closed.
    StartTagClosed,
    /// Markup arrived while an attribute was open.
    AttributeOpen,
    /// `end_attribute` without an open attribute.
    NoOpenAttribute,
    /// `end_element` without an open element.
    NoOpenElement,
    /// The document was finished with elements still open.
    Unclosed {
        /// Number of open elements.
        open: usize,
    },
}

impl From<fmt::Error> for XmlSinkError {
    fn from(_: fmt::Error) -> Self {
        XmlSinkError::Fmt
    }
}

impl fmt::Display for XmlSinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlSinkError::Fmt => f.write_str("the output writer failed"),
            XmlSinkError::StartTagClosed => {
                f.write_str("attributes must be written before the element's content")
            }
            XmlSinkError::AttributeOpen => f.write_str("an attribute is still open"),
            XmlSinkError::NoOpenAttribute => f.write_str("no attribute is open"),
            XmlSinkError::NoOpenElement => f.write_str("no element is open"),
            XmlSinkError::Unclosed { open } => {
                write!(f, "the document ended with {open} open element(s)")
            }
        }
    }
}

impl std::error::Error for XmlSinkError {}

struct OpenElement {
    name: String,
    has_children: bool,
    has_text: bool,
}

/// Writes markup as XML text into a [`fmt::Write`], a `String` by default.
///
/// Start tags stay open until content arrives, so empty elements can be
/// written as `<a />`. Pretty-printing indents child elements but leaves
/// elements holding text on one line.
pub struct XmlTextSink<W = String> {
    out: W,
    settings: XmlWriterSettings,
    stack: Vec<OpenElement>,
    start_tag_open: bool,
    in_attribute: bool,
}

impl XmlTextSink<String> {
    /// Compact output into a new string.
    pub fn new() -> Self {
        Self::with_settings(XmlWriterSettings::default())
    }

    /// Output into a new string with the given settings.
    pub fn with_settings(settings: XmlWriterSettings) -> Self {
        Self::from_writer(String::new(), settings)
    }
}

impl Default for XmlTextSink<String> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> XmlTextSink<W> {
    /// Output into `out`.
    pub fn from_writer(out: W, settings: XmlWriterSettings) -> Self {
        Self {
            out,
            settings,
            stack: Vec::new(),
            start_tag_open: false,
            in_attribute: false,
        }
    }

    /// The settings in use.
    pub fn settings(&self) -> &XmlWriterSettings {
        &self.settings
    }

    /// Check the document is complete and return the writer.
    pub fn finish(self) -> Result<W, XmlSinkError> {
        if self.in_attribute {
            return Err(XmlSinkError::AttributeOpen);
        }
        if !self.stack.is_empty() {
            return Err(XmlSinkError::Unclosed {
                open: self.stack.len(),
            });
        }
        Ok(self.out)
    }

    fn close_start_tag(&mut self) -> Result<(), XmlSinkError> {
        if self.in_attribute {
            return Err(XmlSinkError::AttributeOpen);
        }
        if self.start_tag_open {
            self.out.write_char('>')?;
            self.start_tag_open = false;
        }
        Ok(())
    }

    fn require_start_tag(&self) -> Result<(), XmlSinkError> {
        if self.in_attribute {
            Err(XmlSinkError::AttributeOpen)
        } else if !self.start_tag_open {
            Err(XmlSinkError::StartTagClosed)
        } else {
            Ok(())
        }
    }

    fn newline_and_indent(&mut self, depth: usize) -> fmt::Result {
        if self.settings.pretty {
            self.out.write_char('\n')?;
            for _ in 0..depth {
                self.out.write_str(&self.settings.indent)?;
            }
        }
        Ok(())
    }
}

fn qualified(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_owned()
    } else {
        format!("{prefix}:{local_name}")
    }
}

impl<W: Write> MarkupSink for XmlTextSink<W> {
    type Error = XmlSinkError;

    fn start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        _namespace: &str,
    ) -> Result<(), Self::Error> {
        self.close_start_tag()?;
        let depth = self.stack.len();
        let indent = match self.stack.last_mut() {
            Some(parent) => {
                parent.has_children = true;
                !parent.has_text
            }
            None => false,
        };
        if indent {
            self.newline_and_indent(depth)?;
        }
        let name = qualified(prefix, local_name);
        write!(self.out, "<{name}")?;
        self.stack.push(OpenElement {
            name,
            has_children: false,
            has_text: false,
        });
        self.start_tag_open = true;
        Ok(())
    }

    fn namespace(&mut self, declaration: &NamespaceDeclaration) -> Result<(), Self::Error> {
        self.require_start_tag()?;
        if declaration.prefix().is_empty() {
            self.out.write_str(" xmlns=\"")?;
        } else {
            write!(self.out, " xmlns:{}=\"", declaration.prefix())?;
        }
        EscapingWriter::attribute(&mut self.out).write_str(declaration.namespace())?;
        self.out.write_char('"')?;
        Ok(())
    }

    fn start_attribute(&mut self, prefix: &str, local_name: &str) -> Result<(), Self::Error> {
        self.require_start_tag()?;
        write!(self.out, " {}=\"", qualified(prefix, local_name))?;
        self.in_attribute = true;
        Ok(())
    }

    fn end_attribute(&mut self) -> Result<(), Self::Error> {
        if !self.in_attribute {
            return Err(XmlSinkError::NoOpenAttribute);
        }
        self.out.write_char('"')?;
        self.in_attribute = false;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), Self::Error> {
        if self.in_attribute {
            EscapingWriter::attribute(&mut self.out).write_str(text)?;
            return Ok(());
        }
        self.close_start_tag()?;
        if let Some(element) = self.stack.last_mut() {
            element.has_text = true;
        }
        EscapingWriter::text(&mut self.out).write_str(text)?;
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), Self::Error> {
        if self.in_attribute {
            return Err(XmlSinkError::AttributeOpen);
        }
        let element = self.stack.pop().ok_or(XmlSinkError::NoOpenElement)?;
        if self.start_tag_open {
            self.start_tag_open = false;
            if self.settings.self_closing {
                self.out.write_str(" />")?;
                return Ok(());
            }
            self.out.write_char('>')?;
        } else if element.has_children && !element.has_text {
            self.newline_and_indent(self.stack.len())?;
        }
        write!(self.out, "</{}>", element.name)?;
        Ok(())
    }
}
