//! Node stream events and the writer trait.

use std::fmt;

use xamlite_schema::{NamespaceDeclaration, Value, XamlMember, XamlType};

/// One event of a node stream.
#[derive(Debug, Clone, PartialEq)]
pub enum XamlNode {
    /// Bind a prefix for the object that follows.
    NamespaceDeclaration(NamespaceDeclaration),
    /// Open an object of the given type.
    StartObject(XamlType),
    /// Open the current value of the enclosing member, to populate it in place.
    GetObject,
    /// Open a member of the current object.
    StartMember(XamlMember),
    /// A value for the open member.
    Value(Value),
    /// Close the open member.
    EndMember,
    /// Close the current object.
    EndObject,
}

impl XamlNode {
    /// The event's kind.
    pub fn node_type(&self) -> XamlNodeType {
        match self {
            XamlNode::NamespaceDeclaration(_) => XamlNodeType::NamespaceDeclaration,
            XamlNode::StartObject(_) => XamlNodeType::StartObject,
            XamlNode::GetObject => XamlNodeType::GetObject,
            XamlNode::StartMember(_) => XamlNodeType::StartMember,
            XamlNode::Value(_) => XamlNodeType::Value,
            XamlNode::EndMember => XamlNodeType::EndMember,
            XamlNode::EndObject => XamlNodeType::EndObject,
        }
    }
}

impl fmt::Display for XamlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XamlNode::NamespaceDeclaration(decl) => write!(f, "NamespaceDeclaration {decl}"),
            XamlNode::StartObject(ty) => write!(f, "StartObject {ty}"),
            XamlNode::GetObject => f.write_str("GetObject"),
            XamlNode::StartMember(member) => write!(f, "StartMember {member}"),
            XamlNode::Value(value) => write!(f, "Value {value:?}"),
            XamlNode::EndMember => f.write_str("EndMember"),
            XamlNode::EndObject => f.write_str("EndObject"),
        }
    }
}

/// Kind of a [`XamlNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XamlNodeType {
    /// [`XamlNode::NamespaceDeclaration`]
    NamespaceDeclaration,
    /// [`XamlNode::StartObject`]
    StartObject,
    /// [`XamlNode::GetObject`]
    GetObject,
    /// [`XamlNode::StartMember`]
    StartMember,
    /// [`XamlNode::Value`]
    Value,
    /// [`XamlNode::EndMember`]
    EndMember,
    /// [`XamlNode::EndObject`]
    EndObject,
}

impl fmt::Display for XamlNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A consumer of node stream events.
pub trait XamlWriter {
    /// Error raised by the writer.
    type Error;

    /// Handle a namespace declaration.
    fn write_namespace(&mut self, declaration: NamespaceDeclaration) -> Result<(), Self::Error>;

    /// Handle `StartObject`.
    fn write_start_object(&mut self, ty: &XamlType) -> Result<(), Self::Error>;

    /// Handle `GetObject`.
    fn write_get_object(&mut self) -> Result<(), Self::Error>;

    /// Handle `StartMember`.
    fn write_start_member(&mut self, member: &XamlMember) -> Result<(), Self::Error>;

    /// Handle `Value`.
    fn write_value(&mut self, value: Value) -> Result<(), Self::Error>;

    /// Handle `EndMember`.
    fn write_end_member(&mut self) -> Result<(), Self::Error>;

    /// Handle `EndObject`.
    fn write_end_object(&mut self) -> Result<(), Self::Error>;

    /// Synthesize the closing events for everything still open.
    fn close(&mut self) -> Result<(), Self::Error>;

    /// Dispatch one event.
    fn write_node(&mut self, node: XamlNode) -> Result<(), Self::Error> {
        match node {
            XamlNode::NamespaceDeclaration(decl) => self.write_namespace(decl),
            XamlNode::StartObject(ty) => self.write_start_object(&ty),
            XamlNode::GetObject => self.write_get_object(),
            XamlNode::StartMember(member) => self.write_start_member(&member),
            XamlNode::Value(value) => self.write_value(value),
            XamlNode::EndMember => self.write_end_member(),
            XamlNode::EndObject => self.write_end_object(),
        }
    }
}

/// Feed every node into `writer`, stopping at the first error.
///
/// The writer is not closed.
pub fn transform<I, W>(nodes: I, writer: &mut W) -> Result<(), W::Error>
where
    I: IntoIterator<Item = XamlNode>,
    W: XamlWriter + ?Sized,
{
    for node in nodes {
        writer.write_node(node)?;
    }
    Ok(())
}
