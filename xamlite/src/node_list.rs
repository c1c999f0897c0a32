//! Recording node streams.

use xamlite_schema::{NamespaceDeclaration, Value, XamlMember, XamlType};

use crate::tracing_macros::trace;
use crate::{StateManager, XamlError, XamlNode, XamlNodeType, XamlWriter};

/// A [`XamlWriter`] that checks event order and keeps the events.
///
/// Useful as a buffer between a graph walker and another writer, and to see
/// which events forced close synthesizes.
#[derive(Debug, Clone)]
pub struct NodeList {
    nodes: Vec<XamlNode>,
    manager: StateManager,
    depth: usize,
}

impl Default for NodeList {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeList {
    /// An empty recorder.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            manager: StateManager::for_object_writer(),
            depth: 0,
        }
    }

    /// The recorded events.
    pub fn nodes(&self) -> &[XamlNode] {
        &self.nodes
    }

    /// Take the recorded events.
    pub fn into_nodes(self) -> Vec<XamlNode> {
        self.nodes
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over the recorded events.
    pub fn iter(&self) -> std::slice::Iter<'_, XamlNode> {
        self.nodes.iter()
    }
}

impl XamlWriter for NodeList {
    type Error = XamlError;

    fn write_namespace(&mut self, declaration: NamespaceDeclaration) -> Result<(), XamlError> {
        self.manager.namespace()?;
        self.nodes.push(XamlNode::NamespaceDeclaration(declaration));
        Ok(())
    }

    fn write_start_object(&mut self, ty: &XamlType) -> Result<(), XamlError> {
        self.manager.start_object()?;
        self.depth += 1;
        self.nodes.push(XamlNode::StartObject(ty.clone()));
        Ok(())
    }

    fn write_get_object(&mut self) -> Result<(), XamlError> {
        self.manager.get_object()?;
        self.depth += 1;
        self.nodes.push(XamlNode::GetObject);
        Ok(())
    }

    fn write_start_member(&mut self, member: &XamlMember) -> Result<(), XamlError> {
        self.manager.start_member()?;
        self.nodes.push(XamlNode::StartMember(member.clone()));
        Ok(())
    }

    fn write_value(&mut self, value: Value) -> Result<(), XamlError> {
        self.manager.value()?;
        self.nodes.push(XamlNode::Value(value));
        Ok(())
    }

    fn write_end_member(&mut self) -> Result<(), XamlError> {
        self.manager.end_member()?;
        self.nodes.push(XamlNode::EndMember);
        Ok(())
    }

    fn write_end_object(&mut self) -> Result<(), XamlError> {
        self.manager.end_object(self.depth > 1)?;
        self.depth = self.depth.saturating_sub(1);
        self.nodes.push(XamlNode::EndObject);
        Ok(())
    }

    fn close(&mut self) -> Result<(), XamlError> {
        while let Some(step) = self.manager.closing_step() {
            trace!(%step, depth = self.depth, "forced close");
            match step {
                XamlNodeType::EndObject => self.write_end_object()?,
                _ => {
                    self.manager.on_closing_item();
                    self.write_end_member()?;
                }
            }
        }
        Ok(())
    }
}

impl IntoIterator for NodeList {
    type Item = XamlNode;
    type IntoIter = std::vec::IntoIter<XamlNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a XamlNode;
    type IntoIter = std::slice::Iter<'a, XamlNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
