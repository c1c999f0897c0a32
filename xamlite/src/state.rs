//! Well-formedness of the node stream.
//!
//! Both writers drive a [`StateManager`] before acting on an event. The
//! manager only knows the last transition; writers keep their own frame
//! stacks for everything that depends on nesting.

use std::fmt;

use crate::{XamlError, XamlErrorKind, XamlNodeType};

/// Position of a writer in the node grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteState {
    /// Nothing written yet.
    Initial,
    /// Only namespace declarations written.
    NamespaceDone,
    /// An object was just started.
    ObjectStarted,
    /// A member was just started and has no content yet.
    MemberStarted,
    /// A member was closed, or `GetObject` opened the member's current value.
    MemberDone,
    /// A value was written into the open member.
    ValueWritten,
    /// A nested object was closed inside the open member.
    ObjectWritten,
    /// The root object was closed.
    Ended,
}

impl fmt::Display for WriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Validates event order.
///
/// The two writers differ in three places, fixed at construction:
/// whether namespace declarations may follow a value or an object start,
/// whether a member may hold several values, and whether a member may be
/// closed with no content.
#[derive(Debug, Clone)]
pub struct StateManager {
    state: WriteState,
    accept_multiple_values: bool,
    namespace_anywhere: bool,
    parallel_values: bool,
    empty_members: bool,
}

impl StateManager {
    /// Rules for object construction: several values per member and empty
    /// members are fine, namespaces may not follow a value or object start.
    pub fn for_object_writer() -> Self {
        Self::new(false, true, true)
    }

    /// Rules for markup output: namespaces anywhere, one value per member
    /// unless positional parameters are open, no empty members.
    pub fn for_markup_writer() -> Self {
        Self::new(true, false, false)
    }

    fn new(namespace_anywhere: bool, parallel_values: bool, empty_members: bool) -> Self {
        Self {
            state: WriteState::Initial,
            accept_multiple_values: false,
            namespace_anywhere,
            parallel_values,
            empty_members,
        }
    }

    /// Current state.
    pub fn state(&self) -> WriteState {
        self.state
    }

    /// True once the root object has been closed.
    pub fn is_ended(&self) -> bool {
        self.state == WriteState::Ended
    }

    /// True while a positional-parameter member is open.
    pub fn accepts_multiple_values(&self) -> bool {
        self.accept_multiple_values
    }

    /// Allow or forbid consecutive values in the open member.
    pub fn set_accept_multiple_values(&mut self, accept: bool) {
        self.accept_multiple_values = accept;
    }

    /// Check a namespace declaration.
    pub fn namespace(&mut self) -> Result<(), XamlError> {
        match self.state {
            WriteState::Initial | WriteState::NamespaceDone => {
                self.state = WriteState::NamespaceDone;
                Ok(())
            }
            WriteState::Ended => Err(self.reject(XamlNodeType::NamespaceDeclaration)),
            WriteState::ObjectStarted | WriteState::ValueWritten if !self.namespace_anywhere => {
                Err(self.reject(XamlNodeType::NamespaceDeclaration))
            }
            _ => Ok(()),
        }
    }

    /// Check `StartObject`.
    pub fn start_object(&mut self) -> Result<(), XamlError> {
        let allowed = match self.state {
            WriteState::Initial
            | WriteState::NamespaceDone
            | WriteState::MemberStarted
            | WriteState::ObjectWritten => true,
            WriteState::ValueWritten => self.multiple_values_allowed(),
            _ => false,
        };
        self.advance(allowed, XamlNodeType::StartObject, WriteState::ObjectStarted)
    }

    /// Check `GetObject`.
    pub fn get_object(&mut self) -> Result<(), XamlError> {
        let allowed = self.state == WriteState::MemberStarted;
        self.advance(allowed, XamlNodeType::GetObject, WriteState::MemberDone)
    }

    /// Check `StartMember`.
    pub fn start_member(&mut self) -> Result<(), XamlError> {
        let allowed = matches!(
            self.state,
            WriteState::ObjectStarted | WriteState::MemberDone
        );
        self.advance(allowed, XamlNodeType::StartMember, WriteState::MemberStarted)
    }

    /// Check `Value`.
    pub fn value(&mut self) -> Result<(), XamlError> {
        let allowed = match self.state {
            WriteState::MemberStarted => true,
            WriteState::ValueWritten | WriteState::ObjectWritten => {
                self.multiple_values_allowed()
            }
            _ => false,
        };
        self.advance(allowed, XamlNodeType::Value, WriteState::ValueWritten)
    }

    /// Check `EndMember`.
    pub fn end_member(&mut self) -> Result<(), XamlError> {
        let allowed = match self.state {
            WriteState::ValueWritten | WriteState::ObjectWritten => true,
            WriteState::MemberStarted => self.empty_members,
            _ => false,
        };
        self.advance(allowed, XamlNodeType::EndMember, WriteState::MemberDone)
    }

    /// Check `EndObject`; closing the root ends the stream.
    pub fn end_object(&mut self, has_parent: bool) -> Result<(), XamlError> {
        let allowed = matches!(
            self.state,
            WriteState::ObjectStarted | WriteState::MemberDone
        );
        let next = if has_parent {
            WriteState::ObjectWritten
        } else {
            WriteState::Ended
        };
        self.advance(allowed, XamlNodeType::EndObject, next)
    }

    /// Treat an empty open member as holding a value so forced close can end it.
    pub fn on_closing_item(&mut self) {
        if self.state == WriteState::MemberStarted {
            self.state = WriteState::ValueWritten;
        }
    }

    /// The event forced close has to synthesize next, if anything is open.
    pub fn closing_step(&self) -> Option<XamlNodeType> {
        match self.state {
            WriteState::ObjectStarted | WriteState::MemberDone => Some(XamlNodeType::EndObject),
            WriteState::MemberStarted | WriteState::ValueWritten | WriteState::ObjectWritten => {
                Some(XamlNodeType::EndMember)
            }
            WriteState::Initial | WriteState::NamespaceDone | WriteState::Ended => None,
        }
    }

    fn multiple_values_allowed(&self) -> bool {
        self.parallel_values || self.accept_multiple_values
    }

    fn advance(
        &mut self,
        allowed: bool,
        node: XamlNodeType,
        next: WriteState,
    ) -> Result<(), XamlError> {
        if !allowed {
            return Err(self.reject(node));
        }
        self.state = next;
        Ok(())
    }

    fn reject(&self, node: XamlNodeType) -> XamlError {
        XamlErrorKind::InvalidTransition {
            node,
            state: self.state,
        }
        .into()
    }
}
