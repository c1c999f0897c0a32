//! Building live object graphs from a node stream.

use std::fmt;
use std::mem;
use std::rc::Rc;

use xamlite_schema::{
    NamespaceDeclaration, NamespaceScope, SchemaContext, SchemaError, Value, XamlLanguage,
    XamlMember, XamlType,
};

use crate::tracing_macros::{debug, trace, trace_span};
use crate::{
    Coercer, LineInfo, StateManager, WriteState, XamlError, XamlErrorKind, XamlNode, XamlNodeType,
    XamlWriter,
};

/// What to do when a dictionary item repeats a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateKeyPolicy {
    /// Fail with a structural error.
    #[default]
    Reject,
    /// Keep the later item.
    Overwrite,
}

/// Arguments of a [`SetValueHandler`] call.
pub struct SetValueEvent<'a> {
    /// The object whose member is being set.
    pub instance: &'a Value,
    /// The member.
    pub member: &'a XamlMember,
    /// The coerced value.
    pub value: &'a Value,
}

/// Intercepts member assignment; when installed, members are not set on the instance.
pub type SetValueHandler = Rc<dyn Fn(&SetValueEvent<'_>)>;

/// Knobs for [`ObjectWriter`].
#[derive(Clone, Default)]
pub struct ObjectWriterSettings {
    set_value_handler: Option<SetValueHandler>,
    duplicate_keys: DuplicateKeyPolicy,
    root_object: Option<Value>,
}

impl ObjectWriterSettings {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route member assignment through `handler` instead of the member setter.
    pub fn on_set_value(mut self, handler: impl Fn(&SetValueEvent<'_>) + 'static) -> Self {
        self.set_value_handler = Some(Rc::new(handler));
        self
    }

    /// Choose how repeated dictionary keys are handled.
    pub fn duplicate_keys(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Populate `instance` instead of constructing the root object.
    pub fn root_object(mut self, instance: Value) -> Self {
        self.root_object = Some(instance);
        self
    }
}

impl fmt::Debug for ObjectWriterSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectWriterSettings")
            .field("set_value_handler", &self.set_value_handler.is_some())
            .field("duplicate_keys", &self.duplicate_keys)
            .field("root_object", &self.root_object)
            .finish()
    }
}

enum Instance {
    /// Not created yet; `needs_arguments` defers creation until arguments arrive.
    Pending { needs_arguments: bool },
    /// `x:FactoryMethod` named the method; creation waits for `x:Arguments`.
    AwaitingFactory { method: String },
    Ready(Value),
}

struct Content {
    key: Option<Value>,
    value: Value,
}

struct ObjectFrame {
    ty: XamlType,
    instance: Instance,
    key: Option<Value>,
    contents: Vec<Content>,
    written: Vec<XamlMember>,
    member: Option<XamlMember>,
}

impl ObjectFrame {
    fn new(ty: XamlType, instance: Instance) -> Self {
        Self {
            ty,
            instance,
            key: None,
            contents: Vec::new(),
            written: Vec::new(),
            member: None,
        }
    }

    fn mark_written(&mut self, member: &XamlMember) {
        if !self.written.contains(member) {
            self.written.push(member.clone());
        }
    }

    /// True once an ordinary member has been written; directives don't count.
    fn has_written_members(&self) -> bool {
        self.written.iter().any(|member| !member.is_directive())
    }

    /// Give the object its value from `x:Initialization`, `x:Arguments` or
    /// positional parameters.
    ///
    /// An instance created eagerly may be replaced while none of its members
    /// have been written.
    fn set_instance(&mut self, value: Value) -> Result<(), XamlError> {
        if matches!(self.instance, Instance::Ready(_)) && self.has_written_members() {
            return Err(XamlErrorKind::AlreadyInstantiated {
                ty: self.ty.to_string(),
            }
            .into());
        }
        self.instance = Instance::Ready(value);
        Ok(())
    }

    fn ready_value(&self) -> Result<Value, XamlError> {
        match &self.instance {
            Instance::Ready(value) => Ok(value.clone()),
            _ => Err(instantiation(
                &self.ty,
                SchemaError::custom("the object has not been created yet"),
            )),
        }
    }
}

/// Members that collect several values instead of holding one.
fn accepts_many(member: &XamlMember) -> bool {
    member == XamlLanguage::items()
        || member == XamlLanguage::positional_parameters()
        || member == XamlLanguage::arguments()
        || (!member.is_directive() && (member.ty().is_collection() || member.ty().is_dictionary()))
}

/// Consumes a node stream and builds the object graph it describes.
///
/// Objects are created as soon as the stream allows: at `StartObject` for
/// default-constructible types that are not written as text, at the first
/// ordinary member otherwise, or when constructor or factory arguments
/// close. Child values are buffered on their parent's frame and applied
/// when the parent's member closes.
pub struct ObjectWriter<'s> {
    schema: &'s SchemaContext,
    settings: ObjectWriterSettings,
    manager: StateManager,
    namespaces: Vec<NamespaceDeclaration>,
    frames: Vec<ObjectFrame>,
    result: Option<Value>,
    line_info: Option<LineInfo>,
}

impl<'s> ObjectWriter<'s> {
    /// A writer with default settings.
    pub fn new(schema: &'s SchemaContext) -> Self {
        Self::with_settings(schema, ObjectWriterSettings::default())
    }

    /// A writer with explicit settings.
    pub fn with_settings(schema: &'s SchemaContext, settings: ObjectWriterSettings) -> Self {
        Self {
            schema,
            settings,
            manager: StateManager::for_object_writer(),
            namespaces: Vec::new(),
            frames: Vec::new(),
            result: None,
            line_info: None,
        }
    }

    /// The completed root object, once the root has been closed.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Take the completed root object.
    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }

    /// Consume the writer, returning the completed root object.
    pub fn into_result(self) -> Option<Value> {
        self.result
    }

    /// Position of the next event, attached to any error it raises.
    pub fn set_line_info(&mut self, line: usize, column: usize) {
        self.line_info = Some(LineInfo { line, column });
    }

    fn coerce(&self, ty: &XamlType, value: Value) -> Result<Value, XamlError> {
        let scope = NamespaceScope::new(self.schema, &self.namespaces);
        Coercer::new(&scope).coerce(ty, value)
    }

    fn top(&mut self) -> Result<&mut ObjectFrame, XamlError> {
        let state = self.manager.state();
        self.frames
            .last_mut()
            .ok_or_else(|| no_frame(XamlNodeType::StartMember, state))
    }

    fn open_member(&mut self, node: XamlNodeType) -> Result<XamlMember, XamlError> {
        let state = self.manager.state();
        self.frames
            .last()
            .and_then(|frame| frame.member.clone())
            .ok_or_else(|| no_frame(node, state))
    }

    fn namespace_impl(&mut self, declaration: NamespaceDeclaration) -> Result<(), XamlError> {
        self.manager.namespace()?;
        trace!(%declaration, "namespace");
        self.namespaces.push(declaration);
        Ok(())
    }

    fn start_object_impl(&mut self, ty: &XamlType) -> Result<(), XamlError> {
        let saved = self.manager.clone();
        self.manager.start_object()?;
        trace!(%ty, depth = self.frames.len(), "start object");
        self.push_object(ty).inspect_err(|_| self.manager = saved)
    }

    fn push_object(&mut self, ty: &XamlType) -> Result<(), XamlError> {
        let parent_member = match self.frames.last() {
            Some(parent) => {
                let member = parent
                    .member
                    .clone()
                    .ok_or_else(|| no_frame(XamlNodeType::StartObject, self.manager.state()))?;
                if !accepts_many(&member) && parent.written.contains(&member) {
                    return Err(duplicate_member(&member, &parent.ty));
                }
                Some(member)
            }
            None => None,
        };

        let instance = match self.settings.root_object.take() {
            Some(root) if self.frames.is_empty() => Instance::Ready(root),
            other => {
                self.settings.root_object = other;
                Instance::Pending {
                    needs_arguments: ty.construction_requires_arguments()
                        || ty.has_positional_parameters(),
                }
            }
        };
        self.frames.push(ObjectFrame::new(ty.clone(), instance));

        if !ty.is_content_value()
            && let Err(e) = self.instantiate_if_required(true)
        {
            self.frames.pop();
            return Err(e);
        }
        if let Some(member) = parent_member.filter(|m| !accepts_many(m)) {
            let parent = self.frames.len() - 2;
            self.frames[parent].mark_written(&member);
        }
        Ok(())
    }

    fn get_object_impl(&mut self) -> Result<(), XamlError> {
        let saved = self.manager.clone();
        self.manager.get_object()?;
        self.push_existing_object()
            .inspect_err(|_| self.manager = saved)
    }

    fn push_existing_object(&mut self) -> Result<(), XamlError> {
        let member = self.open_member(XamlNodeType::GetObject)?;
        self.instantiate_if_required(false)?;
        let owner = self.top()?.ready_value()?;
        let current = member.get(&owner)?;
        if current.is_null() {
            return Err(XamlErrorKind::NullExistingValue {
                member: member.to_string(),
            }
            .into());
        }
        trace!(%member, "get object");
        let ty = current.xaml_type();
        self.frames
            .push(ObjectFrame::new(ty, Instance::Ready(current)));
        Ok(())
    }

    fn start_member_impl(&mut self, member: &XamlMember) -> Result<(), XamlError> {
        let saved = self.manager.clone();
        self.manager.start_member()?;
        trace!(%member, "start member");
        if member == XamlLanguage::positional_parameters() {
            self.manager.set_accept_multiple_values(true);
        }
        if !member.is_directive()
            && let Err(e) = self.instantiate_if_required(false)
        {
            self.manager = saved;
            return Err(e);
        }
        self.top()?.member = Some(member.clone());
        Ok(())
    }

    fn value_impl(&mut self, value: Value) -> Result<(), XamlError> {
        let saved = self.manager.clone();
        self.manager.value()?;
        self.accept_value(value)
            .inspect_err(|_| self.manager = saved)
    }

    fn accept_value(&mut self, value: Value) -> Result<(), XamlError> {
        let member = self.open_member(XamlNodeType::Value)?;
        trace!(%member, ?value, "value");

        let frame = self
            .frames
            .last()
            .ok_or_else(|| no_frame(XamlNodeType::Value, self.manager.state()))?;
        if !accepts_many(&member) && frame.written.contains(&member) {
            return Err(duplicate_member(&member, &frame.ty));
        }

        if member == *XamlLanguage::initialization() {
            let ty = frame.ty.clone();
            let value = self.coerce(&ty, value)?;
            let frame = self.top()?;
            frame.set_instance(value)?;
            frame.mark_written(&member);
        } else if member == *XamlLanguage::key() {
            let key_type = self.dictionary_key_type();
            let value = self.coerce(&key_type, value)?;
            let frame = self.top()?;
            frame.key = Some(value);
            frame.mark_written(&member);
        } else {
            let value = self.coerce_content(&member, value)?;
            let frame = self.top()?;
            frame.contents.push(Content { key: None, value });
            if !accepts_many(&member) {
                frame.mark_written(&member);
            }
        }
        Ok(())
    }

    /// Declared type of one content entry of `member`; `None` keeps the value as written.
    fn content_type(&self, member: &XamlMember) -> Option<XamlType> {
        if member == XamlLanguage::positional_parameters() || member == XamlLanguage::arguments() {
            return None;
        }
        if member == XamlLanguage::items() {
            return self
                .frames
                .last()
                .and_then(|frame| frame.ty.item_type().cloned());
        }
        if member.ty().is_collection() || member.ty().is_dictionary() {
            return member.ty().item_type().cloned();
        }
        Some(member.ty().clone())
    }

    /// Coerce one content entry of `member`.
    ///
    /// Collection-typed members take either a whole collection (or null) or
    /// items for the collection they hold.
    fn coerce_content(&self, member: &XamlMember, value: Value) -> Result<Value, XamlError> {
        let ty = member.ty();
        if !member.is_directive()
            && (ty.is_collection() || ty.is_dictionary())
            && (value.is_null() || ty.is_assignable_from(&value.xaml_type()))
        {
            return self.coerce(ty, value);
        }
        match self.content_type(member) {
            Some(target) => self.coerce(&target, value),
            None => Ok(value),
        }
    }

    /// Key type of the dictionary the current object is an item of.
    fn dictionary_key_type(&self) -> XamlType {
        let parent = self.frames.len().checked_sub(2).and_then(|i| self.frames.get(i));
        parent
            .and_then(|parent| {
                let member = parent.member.as_ref()?;
                let dictionary = if member == XamlLanguage::items() {
                    &parent.ty
                } else {
                    member.ty()
                };
                dictionary.key_type().cloned()
            })
            .unwrap_or_else(|| XamlLanguage::object().clone())
    }

    fn end_member_impl(&mut self) -> Result<(), XamlError> {
        let saved = self.manager.clone();
        self.manager.end_member()?;
        let frame = self.top()?;
        let member = frame
            .member
            .take()
            .ok_or_else(|| no_frame(XamlNodeType::EndMember, saved.state()))?;
        let contents = mem::take(&mut frame.contents);
        trace_span!("end member", %member, contents = contents.len());

        // A rejected member stays open without its contents.
        if let Err(e) = self.finish_member(&member, contents) {
            self.manager = saved;
            self.top()?.member = Some(member);
            return Err(e);
        }
        self.top()?.mark_written(&member);
        Ok(())
    }

    fn finish_member(
        &mut self,
        member: &XamlMember,
        contents: Vec<Content>,
    ) -> Result<(), XamlError> {
        if member == XamlLanguage::positional_parameters() {
            self.manager.set_accept_multiple_values(false);
            match self.pending_factory() {
                Some(method) => self.invoke_factory(&method, contents),
                None => self.fill_constructed_object(contents),
            }
        } else if member == XamlLanguage::factory_method() {
            self.record_factory_method(contents)
        } else if member == XamlLanguage::arguments() {
            match self.pending_factory() {
                Some(method) => self.invoke_factory(&method, contents),
                None => self.fill_constructed_object(contents),
            }
        } else if member == XamlLanguage::items() {
            self.instantiate_if_required(false)?;
            let frame = self.top()?;
            let ty = frame.ty.clone();
            let instance = frame.ready_value()?;
            self.add_items(&ty, &instance, contents)
        } else if member.is_directive() {
            // x:Initialization and x:Key are applied as their values arrive.
            Ok(())
        } else {
            self.apply_member(member, contents)
        }
    }

    fn pending_factory(&self) -> Option<String> {
        match self.frames.last().map(|f| &f.instance) {
            Some(Instance::AwaitingFactory { method }) => Some(method.clone()),
            _ => None,
        }
    }

    fn record_factory_method(&mut self, contents: Vec<Content>) -> Result<(), XamlError> {
        let method = match contents.as_slice() {
            [Content {
                value: Value::String(name),
                ..
            }] => name.clone(),
            other => {
                let found = match other {
                    [] => "nothing".to_owned(),
                    [single] => {
                        format!("'{}' (of type {})", single.value, single.value.xaml_type())
                    }
                    many => format!("{} values", many.len()),
                };
                return Err(XamlErrorKind::InvalidFactoryMethod { found }.into());
            }
        };
        let frame = self.top()?;
        if matches!(frame.instance, Instance::Ready(_)) && frame.has_written_members() {
            return Err(XamlErrorKind::LateFactoryMethod {
                ty: frame.ty.to_string(),
            }
            .into());
        }
        debug!(ty = %frame.ty, %method, "factory method recorded");
        frame.instance = Instance::AwaitingFactory { method };
        Ok(())
    }

    fn invoke_factory(&mut self, method: &str, contents: Vec<Content>) -> Result<(), XamlError> {
        let ty = self.top()?.ty.clone();
        let factory = ty.factory_method(method, contents.len()).ok_or_else(|| {
            XamlErrorKind::NoFactoryMethod {
                name: method.to_owned(),
                ty: ty.to_string(),
                arity: contents.len(),
            }
        })?;
        let args = factory
            .parameters()
            .iter()
            .zip(contents)
            .map(|(param, content)| self.coerce(param, content.value))
            .collect::<Result<Vec<_>, _>>()?;
        let value = factory
            .invoke(&args)
            .map_err(|source| instantiation(&ty, source))?;
        debug!(%ty, method, "created by factory method");
        self.top()?.set_instance(value)
    }

    fn fill_constructed_object(&mut self, contents: Vec<Content>) -> Result<(), XamlError> {
        let ty = self.top()?.ty.clone();
        let count = contents.len();
        let param_types: Vec<XamlType> = match ty.constructor_arguments() {
            Some(args) => args.iter().map(|arg| arg.ty().clone()).collect(),
            None => ty
                .positional_parameters(count)
                .ok_or_else(|| XamlErrorKind::NoConstructorSlots {
                    ty: ty.to_string(),
                    count,
                })?,
        };
        if param_types.len() != count {
            return Err(XamlErrorKind::ArgumentCount {
                ty: ty.to_string(),
                expected: param_types.len(),
                actual: count,
            }
            .into());
        }
        let args = param_types
            .iter()
            .zip(contents)
            .map(|(param, content)| self.coerce(param, content.value))
            .collect::<Result<Vec<_>, _>>()?;
        let value = ty
            .create_instance(&args)
            .map_err(|source| instantiation(&ty, source))?;
        debug!(%ty, count, "created from constructor arguments");
        self.top()?.set_instance(value)
    }

    fn add_items(
        &self,
        ty: &XamlType,
        instance: &Value,
        contents: Vec<Content>,
    ) -> Result<(), XamlError> {
        if ty.is_dictionary() {
            let replace = self.settings.duplicate_keys == DuplicateKeyPolicy::Overwrite;
            for content in contents {
                let key = content.key.ok_or_else(|| XamlErrorKind::MissingKey {
                    owner: ty.to_string(),
                })?;
                ty.add_to_dictionary(instance, key, content.value, replace)
                    .map_err(|e| match e {
                        SchemaError::DuplicateKey { key } => XamlErrorKind::DuplicateKey {
                            key,
                            owner: ty.to_string(),
                        }
                        .into(),
                        other => XamlError::from(other),
                    })?;
            }
        } else {
            for content in contents {
                ty.add_to_collection(instance, content.value)?;
            }
        }
        Ok(())
    }

    fn apply_member(
        &mut self,
        member: &XamlMember,
        contents: Vec<Content>,
    ) -> Result<(), XamlError> {
        let owner_ty = self.top()?.ty.clone();
        let owner = self.top()?.ready_value()?;
        let member_ty = member.ty();
        let is_container = member_ty.is_collection() || member_ty.is_dictionary();

        let single_assignable = match contents.as_slice() {
            [single] => {
                !is_container
                    || (single.key.is_none()
                        && (single.value.is_null()
                            || member_ty.is_assignable_from(&single.value.xaml_type())))
            }
            _ => false,
        };

        if single_assignable {
            let Some(Content { value, .. }) = contents.into_iter().next() else {
                return Ok(());
            };
            if is_container && member.is_read_only() {
                return Ok(());
            }
            return self.set_value(&owner, member, value);
        }

        if contents.is_empty() {
            return Ok(());
        }
        if !is_container {
            return Err(duplicate_member(member, &owner_ty));
        }

        let mut target = member.get(&owner)?;
        if target.is_null() {
            if member.is_read_only() {
                return Err(XamlErrorKind::NullExistingValue {
                    member: member.to_string(),
                }
                .into());
            }
            target = member_ty
                .create_instance(&[])
                .map_err(|source| instantiation(member_ty, source))?;
            self.set_value(&owner, member, target.clone())?;
        }
        trace!(%member, items = contents.len(), "populating implicit collection");
        self.add_items(member_ty, &target, contents)
    }

    fn set_value(&self, owner: &Value, member: &XamlMember, value: Value) -> Result<(), XamlError> {
        if let Some(handler) = &self.settings.set_value_handler {
            handler(&SetValueEvent {
                instance: owner,
                member,
                value: &value,
            });
            return Ok(());
        }
        member.set(owner, value)?;
        Ok(())
    }

    fn instantiate_if_required(&mut self, wait_for_arguments: bool) -> Result<(), XamlError> {
        let frame = self.top()?;
        let method = match &frame.instance {
            Instance::Ready(_) => return Ok(()),
            Instance::Pending { needs_arguments } => {
                if wait_for_arguments && *needs_arguments {
                    return Ok(());
                }
                let value = frame
                    .ty
                    .create_instance(&[])
                    .map_err(|source| instantiation(&frame.ty, source))?;
                debug!(ty = %frame.ty, "instantiated");
                frame.instance = Instance::Ready(value);
                return Ok(());
            }
            Instance::AwaitingFactory { method } => {
                if wait_for_arguments {
                    return Ok(());
                }
                method.clone()
            }
        };
        self.invoke_factory(&method, Vec::new())
    }

    fn end_object_impl(&mut self) -> Result<(), XamlError> {
        let saved = self.manager.clone();
        self.manager.end_object(self.frames.len() > 1)?;
        let value = match self.finish_object() {
            Ok(value) => value,
            Err(e) => {
                self.manager = saved;
                return Err(e);
            }
        };
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| no_frame(XamlNodeType::EndObject, self.manager.state()))?;
        trace!(ty = %frame.ty, depth = self.frames.len(), "end object");

        let Some(parent) = self.frames.last() else {
            self.result = Some(value);
            return Ok(());
        };
        let member = parent
            .member
            .clone()
            .ok_or_else(|| no_frame(XamlNodeType::EndObject, self.manager.state()))?;
        if member == *XamlLanguage::key() {
            self.top()?.key = Some(value);
        } else if member == *XamlLanguage::initialization() {
            let ty = parent.ty.clone();
            let value = self.coerce(&ty, value)?;
            self.top()?.set_instance(value)?;
        } else {
            let parent = self.top()?;
            parent.contents.push(Content {
                key: frame.key,
                value,
            });
            if !accepts_many(&member) {
                parent.mark_written(&member);
            }
        }
        Ok(())
    }

    /// The finished value of the innermost object, which stays on the stack.
    fn finish_object(&mut self) -> Result<Value, XamlError> {
        self.instantiate_if_required(false)?;
        let frame = self.top()?;
        let ty = frame.ty.clone();
        let value = frame.ready_value()?;
        self.coerce(&ty, value)
    }

    fn close_impl(&mut self) -> Result<(), XamlError> {
        while !self.frames.is_empty() {
            match self.manager.closing_step() {
                Some(XamlNodeType::EndObject) => self.end_object_impl()?,
                Some(_) => {
                    self.manager.on_closing_item();
                    self.end_member_impl()?;
                }
                None => break,
            }
        }
        Ok(())
    }
}

fn no_frame(node: XamlNodeType, state: WriteState) -> XamlError {
    XamlErrorKind::InvalidTransition { node, state }.into()
}

fn duplicate_member(member: &XamlMember, owner: &XamlType) -> XamlError {
    XamlErrorKind::DuplicateMember {
        member: member.to_string(),
        owner: owner.to_string(),
    }
    .into()
}

fn instantiation(ty: &XamlType, source: SchemaError) -> XamlError {
    XamlErrorKind::Instantiation {
        ty: ty.to_string(),
        source,
    }
    .into()
}

impl XamlWriter for ObjectWriter<'_> {
    type Error = XamlError;

    fn write_namespace(&mut self, declaration: NamespaceDeclaration) -> Result<(), XamlError> {
        let line_info = self.line_info;
        self.namespace_impl(declaration)
            .map_err(|e| e.with_line_info(line_info))
    }

    fn write_start_object(&mut self, ty: &XamlType) -> Result<(), XamlError> {
        let line_info = self.line_info;
        self.start_object_impl(ty)
            .map_err(|e| e.with_line_info(line_info))
    }

    fn write_get_object(&mut self) -> Result<(), XamlError> {
        let line_info = self.line_info;
        self.get_object_impl()
            .map_err(|e| e.with_line_info(line_info))
    }

    fn write_start_member(&mut self, member: &XamlMember) -> Result<(), XamlError> {
        let line_info = self.line_info;
        self.start_member_impl(member)
            .map_err(|e| e.with_line_info(line_info))
    }

    fn write_value(&mut self, value: Value) -> Result<(), XamlError> {
        let line_info = self.line_info;
        self.value_impl(value)
            .map_err(|e| e.with_line_info(line_info))
    }

    fn write_end_member(&mut self) -> Result<(), XamlError> {
        let line_info = self.line_info;
        self.end_member_impl()
            .map_err(|e| e.with_line_info(line_info))
    }

    fn write_end_object(&mut self) -> Result<(), XamlError> {
        let line_info = self.line_info;
        self.end_object_impl()
            .map_err(|e| e.with_line_info(line_info))
    }

    fn close(&mut self) -> Result<(), XamlError> {
        let line_info = self.line_info;
        self.close_impl().map_err(|e| e.with_line_info(line_info))
    }
}

/// Build the object graph described by `nodes`, closing anything left open.
pub fn load(
    schema: &SchemaContext,
    nodes: impl IntoIterator<Item = XamlNode>,
) -> Result<Value, XamlError> {
    let mut writer = ObjectWriter::new(schema);
    crate::transform(nodes, &mut writer)?;
    writer.close()?;
    writer.into_result().ok_or_else(|| {
        XamlErrorKind::UnsupportedValue {
            reason: "the node stream contains no root object".to_owned(),
        }
        .into()
    })
}
