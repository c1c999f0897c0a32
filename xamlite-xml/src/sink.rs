//! The markup events [`XmlWriter`](crate::XmlWriter) produces.

use std::fmt::Debug;

use xamlite::NamespaceDeclaration;

/// Receives elements, attributes and text.
///
/// Calls arrive in document order. Attributes and namespace declarations
/// only arrive while the most recent start tag is still open, that is
/// before any text or child element of that element.
pub trait MarkupSink {
    /// Sink-specific error type.
    type Error: Debug;

    /// Open an element; `prefix` is empty for the default namespace.
    fn start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        namespace: &str,
    ) -> Result<(), Self::Error>;

    /// Declare a namespace on the open start tag.
    fn namespace(&mut self, declaration: &NamespaceDeclaration) -> Result<(), Self::Error>;

    /// Open an attribute on the open start tag; `prefix` is empty for none.
    ///
    /// Its value is the concatenation of the [`text`](Self::text) calls up
    /// to [`end_attribute`](Self::end_attribute).
    fn start_attribute(&mut self, prefix: &str, local_name: &str) -> Result<(), Self::Error>;

    /// Close the open attribute.
    fn end_attribute(&mut self) -> Result<(), Self::Error>;

    /// Attribute value text inside an attribute, element content otherwise.
    fn text(&mut self, text: &str) -> Result<(), Self::Error>;

    /// Close the innermost open element.
    fn end_element(&mut self) -> Result<(), Self::Error>;
}
