//! Markup serialization of node streams.
//!
//! The writer decides per member whether it becomes an attribute, a member
//! element, or nothing at all (items, initialization text, content property
//! and read-only collections are written straight into the object's
//! element). Namespace declarations that arrive mid-stream are held back
//! and emitted on the next start tag.

use std::fmt;

use xamlite::schema::{NamespaceScope, SchemaError, ValueContext, XAML_NAMESPACE};
use xamlite::{
    NamespaceDeclaration, SchemaContext, StateManager, Value, XamlError, XamlErrorKind,
    XamlLanguage, XamlMember, XamlNodeType, XamlType, XamlWriter,
};

use crate::MarkupSink;
use crate::escaping::brace_value;
use crate::tracing_macros::{debug, trace};

/// Error raised by [`XmlWriter`].
#[derive(Debug)]
pub enum XmlWriteError<E> {
    /// The stream is ill-formed or cannot be expressed as markup.
    Xaml(XamlError),
    /// The sink failed.
    Sink(E),
}

impl<E> XmlWriteError<E> {
    /// The stream error, if this is one.
    pub fn as_xaml(&self) -> Option<&XamlError> {
        match self {
            XmlWriteError::Xaml(e) => Some(e),
            XmlWriteError::Sink(_) => None,
        }
    }
}

impl<E> From<XamlError> for XmlWriteError<E> {
    fn from(e: XamlError) -> Self {
        XmlWriteError::Xaml(e)
    }
}

impl<E: fmt::Display> fmt::Display for XmlWriteError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlWriteError::Xaml(e) => write!(f, "{e}"),
            XmlWriteError::Sink(e) => write!(f, "markup sink error: {e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for XmlWriteError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XmlWriteError::Xaml(e) => std::error::Error::source(e),
            XmlWriteError::Sink(e) => Some(e),
        }
    }
}

impl<E: std::error::Error + 'static> miette::Diagnostic for XmlWriteError<E> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            XmlWriteError::Xaml(e) => miette::Diagnostic::code(e),
            XmlWriteError::Sink(_) => Some(Box::new("xaml::xml::sink")),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            XmlWriteError::Xaml(e) => miette::Diagnostic::help(e),
            XmlWriteError::Sink(_) => None,
        }
    }
}

/// Where a member's content goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Written into the owner's element without a wrapper.
    Inline,
    /// Decided by the first thing written into the member.
    Deferred,
    Attribute,
    Element,
}

/// What is about to be written into the open member.
#[derive(Clone, Copy)]
enum Next<'a> {
    Value,
    Object(&'a XamlType),
    Other,
}

struct MemberState {
    member: XamlMember,
    placement: Placement,
}

struct Frame {
    ty: XamlType,
    get_object: bool,
    /// Written as `{...}` inside an attribute value.
    braced: bool,
    /// Index of the next positional parameter while `_PositionalParameters` is open.
    positional_index: Option<usize>,
    members: Vec<MemberState>,
}

impl Frame {
    fn new(ty: XamlType, get_object: bool) -> Self {
        Self {
            ty,
            get_object,
            braced: false,
            positional_index: None,
            members: Vec::new(),
        }
    }
}

/// What the sink has been told about the innermost element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Start,
    /// The start tag is open and takes attributes.
    StartTag,
    Attribute,
    /// Text or child elements were written; the start tag is closed.
    Content,
}

/// Writes a node stream as markup into a [`MarkupSink`].
pub struct XmlWriter<'s, S> {
    schema: &'s SchemaContext,
    sink: S,
    sink_state: SinkState,
    manager: StateManager,
    frames: Vec<Frame>,
    /// Every declaration seen so far, for prefix lookup.
    namespaces: Vec<NamespaceDeclaration>,
    /// Due on the open start tag.
    pending: Vec<NamespaceDeclaration>,
    /// Arrived since the last start tag; due on the next one.
    arrived: Vec<NamespaceDeclaration>,
    inside_top_level_positional: bool,
}

type WriteResult<E> = Result<(), XmlWriteError<E>>;

impl<'s, S: MarkupSink> XmlWriter<'s, S> {
    /// A writer resolving value text against `schema`.
    pub fn new(schema: &'s SchemaContext, sink: S) -> Self {
        debug!("creating XML writer");
        Self {
            schema,
            sink,
            sink_state: SinkState::Start,
            manager: StateManager::for_markup_writer(),
            frames: Vec::new(),
            namespaces: Vec::new(),
            pending: Vec::new(),
            arrived: Vec::new(),
            inside_top_level_positional: false,
        }
    }

    /// The sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Give up the writer and return the sink.
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn scope(&self) -> NamespaceScope<'_> {
        NamespaceScope::new(self.schema, &self.namespaces)
    }

    fn prefix_for(&self, namespace: &str) -> Result<String, XamlError> {
        self.scope()
            .prefix_for_namespace(namespace)
            .map(str::to_owned)
            .ok_or_else(|| {
                SchemaError::UnknownNamespace {
                    namespace: namespace.to_owned(),
                }
                .into()
            })
    }

    fn top(&self) -> Result<&Frame, XamlError> {
        self.frames.last().ok_or_else(|| no_frame(XamlNodeType::EndMember))
    }

    fn top_mut(&mut self) -> Result<&mut Frame, XamlError> {
        self.frames
            .last_mut()
            .ok_or_else(|| no_frame(XamlNodeType::EndMember))
    }

    fn current_member(&self) -> Option<&MemberState> {
        self.frames.last().and_then(|f| f.members.last())
    }

    fn set_placement(&mut self, placement: Placement) {
        if let Some(state) = self.frames.last_mut().and_then(|f| f.members.last_mut()) {
            state.placement = placement;
        }
    }

    // Sink calls, tracking what the sink can accept next.

    fn sink_start_element(
        &mut self,
        prefix: &str,
        local_name: &str,
        ns: &str,
    ) -> WriteResult<S::Error> {
        self.sink
            .start_element(prefix, local_name, ns)
            .map_err(XmlWriteError::Sink)?;
        self.sink_state = SinkState::StartTag;
        Ok(())
    }

    fn sink_end_element(&mut self) -> WriteResult<S::Error> {
        self.sink.end_element().map_err(XmlWriteError::Sink)?;
        self.sink_state = SinkState::Content;
        Ok(())
    }

    fn sink_start_attribute(
        &mut self,
        prefix: &str,
        local_name: &str,
    ) -> WriteResult<S::Error> {
        self.sink
            .start_attribute(prefix, local_name)
            .map_err(XmlWriteError::Sink)?;
        self.sink_state = SinkState::Attribute;
        Ok(())
    }

    fn sink_end_attribute(&mut self) -> WriteResult<S::Error> {
        self.sink.end_attribute().map_err(XmlWriteError::Sink)?;
        self.sink_state = SinkState::StartTag;
        Ok(())
    }

    fn sink_text(&mut self, text: &str) -> WriteResult<S::Error> {
        self.sink.text(text).map_err(XmlWriteError::Sink)?;
        if self.sink_state != SinkState::Attribute {
            self.sink_state = SinkState::Content;
        }
        Ok(())
    }

    /// Emit the declarations due on the open start tag, then queue the ones
    /// that arrived since for the next start tag.
    fn flush_namespaces(&mut self) -> WriteResult<S::Error> {
        for declaration in std::mem::take(&mut self.pending) {
            self.sink
                .namespace(&declaration)
                .map_err(XmlWriteError::Sink)?;
        }
        self.pending = std::mem::take(&mut self.arrived);
        Ok(())
    }

    /// True for members whose content is the owner's own element body.
    fn is_inline(owner: &XamlType, member: &XamlMember) -> bool {
        let ty = member.ty();
        member == XamlLanguage::initialization()
            || member == XamlLanguage::items()
            || (member.is_read_only() && (ty.is_collection() || ty.is_dictionary()))
            || owner.content_property() == Some(member)
    }

    fn is_top_level(&self) -> bool {
        self.frames.len() == 1
    }

    fn placement(&self, owner: &XamlType, member: &XamlMember) -> Placement {
        let is_key = member == XamlLanguage::key();
        let member_ty = match self.frames.len().checked_sub(2) {
            Some(parent) if is_key => self.frames[parent]
                .ty
                .key_type()
                .unwrap_or(member.ty())
                .clone(),
            _ => member.ty().clone(),
        };

        if member_ty.has_positional_parameters() {
            return Placement::Attribute;
        }
        if self.sink_state == SinkState::Content {
            return Placement::Element;
        }
        if owner.is_dictionary() && !is_key {
            return Placement::Element;
        }
        if !member.allowed_locations().allows_attribute() {
            return Placement::Element;
        }
        // A start tag cannot also introduce bindings that arrived after it.
        if !self.arrived.is_empty() {
            return Placement::Element;
        }
        if !member.is_directive() && !owner.members().contains(member) {
            return Placement::Deferred;
        }
        if member.value_serializer().is_some()
            || member_ty.is_content_value()
            || owner.is_content_value()
        {
            return Placement::Deferred;
        }
        Placement::Element
    }

    fn start_member_attribute(
        &mut self,
        owner: &XamlType,
        member: &XamlMember,
    ) -> WriteResult<S::Error> {
        self.set_placement(Placement::Attribute);
        if owner.namespace() == member.namespace() && !member.is_directive() {
            self.sink_start_attribute("", member.name())
        } else {
            let prefix = self.prefix_for(member.namespace())?;
            self.sink_start_attribute(&prefix, member.name())
        }
    }

    fn start_member_element(
        &mut self,
        owner: &XamlType,
        member: &XamlMember,
    ) -> WriteResult<S::Error> {
        self.set_placement(Placement::Element);
        let prefix = self.prefix_for(member.namespace())?;
        let name = if member.is_directive() {
            member.name().to_owned()
        } else {
            format!("{}.{}", owner.xml_name(), member.name())
        };
        self.flush_namespaces()?;
        self.sink_start_element(&prefix, &name, member.namespace())
    }

    /// Settle a deferred member once its first content is known.
    fn resolve_deferred(&mut self, next: Next<'_>) -> WriteResult<S::Error> {
        let Some(state) = self.current_member() else {
            return Ok(());
        };
        if state.placement != Placement::Deferred {
            return Ok(());
        }
        let member = state.member.clone();
        let owner = self.top()?.ty.clone();
        let attribute = match next {
            Next::Value => true,
            Next::Object(ty) => ty.has_positional_parameters(),
            Next::Other => false,
        };
        trace!(%member, attribute, "placing deferred member");
        if attribute {
            self.start_member_attribute(&owner, &member)
        } else {
            self.start_member_element(&owner, &member)
        }
    }

    fn open_member(&mut self, member: &XamlMember) -> WriteResult<S::Error> {
        let frame = self.top()?;
        let owner = frame.ty.clone();
        let positional_index = frame.positional_index;
        let first_in_frame = frame.members.len() == 1;
        if Self::is_inline(&owner, member) {
            self.set_placement(Placement::Inline);
            return Ok(());
        }

        if member == XamlLanguage::positional_parameters()
            && self.is_top_level()
            && owner.has_positional_parameters()
        {
            let first = owner
                .constructor_arguments()
                .and_then(|args| args.first())
                .map(|arg| arg.name().to_owned())
                .unwrap_or_default();
            self.set_placement(Placement::Attribute);
            self.sink_start_attribute("", &first)?;
            self.inside_top_level_positional = true;
            return Ok(());
        }

        // Arguments of an object written inside an attribute value.
        if self.sink_state == SinkState::Attribute {
            self.sink_text(if first_in_frame { " " } else { ", " })?;
            if positional_index.is_none() {
                self.sink_text(member.name())?;
                self.sink_text("=")?;
            }
            return Ok(());
        }
        match self.placement(&owner, member) {
            Placement::Attribute => self.start_member_attribute(&owner, member),
            Placement::Element => self.start_member_element(&owner, member),
            placement => {
                self.set_placement(placement);
                Ok(())
            }
        }
    }

    fn value_text(&self, member: &XamlMember, value: &Value) -> Result<String, XamlError> {
        let value_ty = value.xaml_type();
        let serializer = member
            .value_serializer()
            .or_else(|| value_ty.value_serializer())
            .filter(|s| s.can_convert_to_string(value))
            .ok_or_else(|| {
                XamlError::from(XamlErrorKind::UnsupportedValue {
                    reason: format!(
                        "value '{value}' of type {value_ty} in {member} has no text form"
                    ),
                })
            })?;
        Ok(serializer.convert_to_string(&self.scope(), value)?)
    }

    /// Text of `value` for the open member, or why markup cannot hold it.
    fn open_member_value_text(&self, value: &Value) -> Result<String, XamlError> {
        let frame = self.top()?;
        let member = frame
            .members
            .last()
            .map(|state| state.member.clone())
            .ok_or_else(|| no_frame(XamlNodeType::Value))?;
        if self.inside_top_level_positional && frame.positional_index.is_some_and(|n| n > 0) {
            return Err(XamlErrorKind::MultiplePositionalParameters {
                ty: frame.ty.to_string(),
            }
            .into());
        }
        let text = self.value_text(&member, value)?;
        if frame.braced {
            return Ok(brace_value(&text).into_owned());
        }
        Ok(text)
    }

    fn type_arguments_text(&self, ty: &XamlType) -> Result<String, XamlError> {
        let scope = self.scope();
        let names = ty
            .type_arguments()
            .iter()
            .map(|arg| scope.qualified_name(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names.join(", "))
    }
}

fn no_frame(node: XamlNodeType) -> XamlError {
    XamlErrorKind::InvalidTransition {
        node,
        state: xamlite::WriteState::Initial,
    }
    .into()
}

impl<S: MarkupSink> XamlWriter for XmlWriter<'_, S> {
    type Error = XmlWriteError<S::Error>;

    fn write_namespace(&mut self, declaration: NamespaceDeclaration) -> WriteResult<S::Error> {
        self.manager.namespace()?;
        trace!(%declaration, "queueing namespace");
        self.namespaces.push(declaration.clone());
        self.arrived.push(declaration);
        Ok(())
    }

    fn write_start_object(&mut self, ty: &XamlType) -> WriteResult<S::Error> {
        let saved = self.manager.clone();
        self.manager.start_object()?;
        trace!(%ty, "start object");
        let prefix = match self.prefix_for(ty.namespace()) {
            Ok(prefix) => prefix,
            Err(e) => {
                self.manager = saved;
                return Err(e.into());
            }
        };
        self.resolve_deferred(Next::Object(ty))?;

        let braced = self.sink_state == SinkState::Attribute;
        if braced {
            self.sink_text("{")?;
            if !prefix.is_empty() {
                self.sink_text(&prefix)?;
                self.sink_text(":")?;
            }
            self.sink_text(&ty.xml_name())?;
        } else {
            self.flush_namespaces()?;
            self.sink_start_element(&prefix, &ty.xml_name(), ty.namespace())?;
            if !ty.type_arguments().is_empty() {
                let text = self.type_arguments_text(ty)?;
                let xaml = self.prefix_for(XAML_NAMESPACE)?;
                self.sink_start_attribute(&xaml, "TypeArguments")?;
                self.sink_text(&text)?;
                self.sink_end_attribute()?;
            }
        }
        let mut frame = Frame::new(ty.clone(), false);
        frame.braced = braced;
        self.frames.push(frame);
        Ok(())
    }

    fn write_get_object(&mut self) -> WriteResult<S::Error> {
        let saved = self.manager.clone();
        self.manager.get_object()?;
        let member = self
            .current_member()
            .map(|state| state.member.clone())
            .ok_or_else(|| no_frame(XamlNodeType::GetObject))?;
        let ty = member.ty().clone();
        if !ty.is_collection() && !ty.is_dictionary() {
            self.manager = saved;
            return Err(XamlError::from(XamlErrorKind::NotACollection {
                member: member.to_string(),
            })
            .into());
        }
        trace!(%member, "get object");
        self.resolve_deferred(Next::Other)?;
        self.frames.push(Frame::new(ty, true));
        Ok(())
    }

    fn write_start_member(&mut self, member: &XamlMember) -> WriteResult<S::Error> {
        let saved = self.manager.clone();
        self.manager.start_member()?;
        let positional = member == XamlLanguage::positional_parameters();
        if positional {
            self.manager.set_accept_multiple_values(true);
        }
        let frame = self.top()?;
        if frame.members.iter().any(|state| state.member == *member) {
            let err = XamlErrorKind::DuplicateMember {
                member: member.to_string(),
                owner: frame.ty.to_string(),
            };
            self.manager = saved;
            return Err(XamlError::from(err).into());
        }
        let frame = self.top_mut()?;
        frame.members.push(MemberState {
            member: member.clone(),
            placement: Placement::Inline,
        });
        if positional {
            frame.positional_index = Some(0);
        }
        trace!(%member, "start member");
        self.open_member(member)
    }

    fn write_value(&mut self, value: Value) -> WriteResult<S::Error> {
        let saved = self.manager.clone();
        self.manager.value()?;
        let text = match self.open_member_value_text(&value) {
            Ok(text) => text,
            Err(e) => {
                self.manager = saved;
                return Err(e.into());
            }
        };
        self.resolve_deferred(Next::Value)?;
        if self.sink_state != SinkState::Attribute {
            self.flush_namespaces()?;
        }

        let frame = self.top_mut()?;
        let separate = match frame.positional_index {
            None => false,
            Some(n) => {
                frame.positional_index = Some(n + 1);
                n > 0
            }
        };
        if separate {
            self.sink_text(", ")?;
        }
        self.sink_text(&text)
    }

    fn write_end_member(&mut self) -> WriteResult<S::Error> {
        self.manager.end_member()?;
        self.resolve_deferred(Next::Other)?;
        let state = self
            .current_member()
            .ok_or_else(|| no_frame(XamlNodeType::EndMember))?;
        let member = state.member.clone();
        let placement = state.placement;

        match placement {
            Placement::Attribute => {
                self.inside_top_level_positional = false;
                self.sink_end_attribute()?;
            }
            Placement::Element => {
                self.flush_namespaces()?;
                self.sink_end_element()?;
            }
            Placement::Inline | Placement::Deferred => {}
        }

        if member == *XamlLanguage::positional_parameters() {
            self.manager.set_accept_multiple_values(false);
            self.top_mut()?.positional_index = None;
        }
        trace!(%member, "end member");
        Ok(())
    }

    fn write_end_object(&mut self) -> WriteResult<S::Error> {
        self.manager.end_object(self.frames.len() > 1)?;
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| no_frame(XamlNodeType::EndObject))?;
        trace!(ty = %frame.ty, "end object");
        if frame.get_object {
            return Ok(());
        }
        if self.sink_state == SinkState::Attribute {
            return self.sink_text("}");
        }
        self.flush_namespaces()?;
        self.sink_end_element()
    }

    fn close(&mut self) -> WriteResult<S::Error> {
        while !self.frames.is_empty() {
            match self.manager.closing_step() {
                Some(XamlNodeType::EndObject) => self.write_end_object()?,
                Some(_) => {
                    self.manager.on_closing_item();
                    self.write_end_member()?;
                }
                None => break,
            }
        }
        Ok(())
    }
}
