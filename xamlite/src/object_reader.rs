//! Walking live object graphs into node streams.
//!
//! The walk runs twice: once to find every namespace the graph needs and
//! assign prefixes, once to emit nodes. Type references are written as text,
//! so prefixes must be known before the first value is emitted.

use indexmap::IndexSet;
use xamlite_schema::{
    NamespaceDeclaration, NamespaceScope, ObjectData, ObjectRef, SchemaContext, Value,
    ValueContext, ValueSerializer, XAML_NAMESPACE, XAML_PREFIX, XamlLanguage, XamlMember,
    XamlType,
};

use crate::tracing_macros::{debug, trace};
use crate::{XamlError, XamlErrorKind, XamlNode};

/// Turns an object graph into the node stream that rebuilds it.
pub struct ObjectReader<'s> {
    schema: &'s SchemaContext,
    namespaces: Vec<NamespaceDeclaration>,
    nodes: Vec<XamlNode>,
}

impl<'s> ObjectReader<'s> {
    /// A reader resolving types and prefixes in `schema`.
    pub fn new(schema: &'s SchemaContext) -> Self {
        Self {
            schema,
            namespaces: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Namespace declarations of the last graph read.
    pub fn namespaces(&self) -> &[NamespaceDeclaration] {
        &self.namespaces
    }

    /// Walk `root`, returning namespace declarations followed by the object's nodes.
    pub fn read(&mut self, root: &Value) -> Result<Vec<XamlNode>, XamlError> {
        let mut used = IndexSet::new();
        collect_namespaces(root, &mut used, &mut Vec::new())?;
        self.namespaces = assign_prefixes(self.schema, &root.xaml_type(), used);
        debug!(namespaces = self.namespaces.len(), "reading object graph");

        self.nodes = self
            .namespaces
            .iter()
            .cloned()
            .map(XamlNode::NamespaceDeclaration)
            .collect();
        self.write_value(root, None)?;
        Ok(std::mem::take(&mut self.nodes))
    }

    fn scope(&self) -> NamespaceScope<'_> {
        NamespaceScope::new(self.schema, &self.namespaces)
    }

    fn write_value(&mut self, value: &Value, key: Option<&Value>) -> Result<(), XamlError> {
        match value {
            Value::Null => {
                self.nodes
                    .push(XamlNode::StartObject(XamlLanguage::null().clone()));
                self.write_key(key)?;
            }
            Value::Type(ty) => {
                let name = self.scope().qualified_name(ty)?;
                self.nodes
                    .push(XamlNode::StartObject(XamlLanguage::type_extension().clone()));
                self.write_key(key)?;
                self.write_text_member(XamlLanguage::positional_parameters(), name);
            }
            Value::Object(object) => {
                let ty = object.xaml_type();
                self.nodes.push(XamlNode::StartObject(ty.clone()));
                self.write_key(key)?;
                self.write_object(&ty, object, value)?;
            }
            scalar => {
                let ty = scalar.xaml_type();
                let text = self.text(ty.value_serializer(), scalar)?.ok_or_else(|| {
                    unsupported(format!("value '{scalar}' of type {ty} has no text form"))
                })?;
                self.nodes.push(XamlNode::StartObject(ty));
                self.write_key(key)?;
                self.write_text_member(XamlLanguage::initialization(), text);
            }
        }
        self.nodes.push(XamlNode::EndObject);
        Ok(())
    }

    fn write_key(&mut self, key: Option<&Value>) -> Result<(), XamlError> {
        let Some(key) = key else {
            return Ok(());
        };
        self.nodes
            .push(XamlNode::StartMember(XamlLanguage::key().clone()));
        let ty = key.xaml_type();
        match self.text(ty.value_serializer(), key)? {
            Some(text) if !key.is_object() => self.nodes.push(XamlNode::Value(text.into())),
            _ => self.write_value(key, None)?,
        }
        self.nodes.push(XamlNode::EndMember);
        Ok(())
    }

    fn write_text_member(&mut self, member: &XamlMember, text: String) {
        self.nodes.push(XamlNode::StartMember(member.clone()));
        self.nodes.push(XamlNode::Value(text.into()));
        self.nodes.push(XamlNode::EndMember);
    }

    fn write_object(
        &mut self,
        ty: &XamlType,
        object: &ObjectRef,
        value: &Value,
    ) -> Result<(), XamlError> {
        let mut skipped: Vec<&str> = Vec::new();
        if ty.has_positional_parameters() {
            let args = ty.constructor_arguments().unwrap_or_default();
            self.nodes.push(XamlNode::StartMember(
                XamlLanguage::positional_parameters().clone(),
            ));
            for arg in args {
                let field = object.borrow().field(arg.name()).cloned().unwrap_or_default();
                let text = self.text(arg.ty().value_serializer(), &field)?.ok_or_else(|| {
                    unsupported(format!(
                        "positional parameter {} of {ty} has no text form",
                        arg.name()
                    ))
                })?;
                self.nodes.push(XamlNode::Value(text.into()));
                skipped.push(arg.name());
            }
            self.nodes.push(XamlNode::EndMember);
        } else if ty.construction_requires_arguments() {
            let args = ty.constructor_arguments().ok_or_else(|| {
                unsupported(format!(
                    "{ty} cannot be created without arguments and declares no constructor arguments"
                ))
            })?;
            self.nodes
                .push(XamlNode::StartMember(XamlLanguage::arguments().clone()));
            for arg in args {
                let field = object.borrow().field(arg.name()).cloned().unwrap_or_default();
                self.write_value(&field, None)?;
                skipped.push(arg.name());
            }
            self.nodes.push(XamlNode::EndMember);
        }

        let content = ty
            .content_property()
            .filter(|c| !skipped.contains(&c.name()));
        let members = ty
            .members()
            .iter()
            .filter(|m| !skipped.contains(&m.name()) && content.is_none_or(|c| c != *m))
            .chain(content);
        for member in members {
            self.write_member(member, value)?;
        }
        self.write_items(object)
    }

    fn write_items(&mut self, object: &ObjectRef) -> Result<(), XamlError> {
        let data = object.borrow().data().clone();
        match data {
            ObjectData::List(list) if !list.is_empty() => {
                self.nodes
                    .push(XamlNode::StartMember(XamlLanguage::items().clone()));
                for item in list.items() {
                    self.write_value(item, None)?;
                }
                self.nodes.push(XamlNode::EndMember);
            }
            ObjectData::Dictionary(dict) if !dict.is_empty() => {
                self.nodes
                    .push(XamlNode::StartMember(XamlLanguage::items().clone()));
                for (key, item) in dict.entries() {
                    self.write_value(item, Some(key))?;
                }
                self.nodes.push(XamlNode::EndMember);
            }
            _ => {}
        }
        Ok(())
    }

    fn write_member(&mut self, member: &XamlMember, owner: &Value) -> Result<(), XamlError> {
        let Some(value) = written_value(member, owner)? else {
            return Ok(());
        };
        let ty = member.ty();

        if member.is_read_only() {
            trace!(%member, "writing read-only collection in place");
            self.nodes.push(XamlNode::StartMember(member.clone()));
            self.nodes.push(XamlNode::GetObject);
            if let Value::Object(object) = &value {
                self.write_items(object)?;
            }
            self.nodes.push(XamlNode::EndObject);
            self.nodes.push(XamlNode::EndMember);
            return Ok(());
        }

        trace!(%member, "writing member");
        self.nodes.push(XamlNode::StartMember(member.clone()));
        let serializer = member.value_serializer().or_else(|| ty.value_serializer());
        match self.text(serializer, &value)? {
            Some(text) if member.is_content_value() && !value.is_null() => {
                self.nodes.push(XamlNode::Value(text.into()));
            }
            _ => self.write_value(&value, None)?,
        }
        self.nodes.push(XamlNode::EndMember);
        Ok(())
    }

    fn text(
        &self,
        serializer: Option<&dyn ValueSerializer>,
        value: &Value,
    ) -> Result<Option<String>, XamlError> {
        let Some(serializer) = serializer else {
            return Ok(None);
        };
        if !serializer.can_convert_to_string(value) {
            return Ok(None);
        }
        Ok(Some(serializer.convert_to_string(&self.scope(), value)?))
    }
}

/// Walk `root` into a node stream.
pub fn read_object(schema: &SchemaContext, root: &Value) -> Result<Vec<XamlNode>, XamlError> {
    ObjectReader::new(schema).read(root)
}

fn unsupported(reason: String) -> XamlError {
    XamlErrorKind::UnsupportedValue { reason }.into()
}

/// The value `member` is written with, or `None` when it is left out:
/// read-only members unless they hold a populated collection, other members
/// while they hold their default.
fn written_value(member: &XamlMember, owner: &Value) -> Result<Option<Value>, XamlError> {
    let value = member.get(owner)?;
    if member.is_read_only() {
        let ty = member.ty();
        let populated = value.as_object().is_some_and(|object| {
            let object = object.borrow();
            object.as_list().is_some_and(|l| !l.is_empty())
                || object.as_dictionary().is_some_and(|d| !d.is_empty())
        });
        let container = ty.is_collection() || ty.is_dictionary();
        return Ok((container && populated).then_some(value));
    }
    Ok((value != member.default_value()).then_some(value))
}

/// Items of a list, or keys and items of a dictionary.
fn items_of(object: &ObjectRef, used: &mut IndexSet<String>) -> Vec<Value> {
    match object.borrow().data() {
        ObjectData::Record(_) => Vec::new(),
        ObjectData::List(list) => list.items().to_vec(),
        ObjectData::Dictionary(dict) => {
            used.insert(XAML_NAMESPACE.to_owned());
            dict.entries()
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect()
        }
    }
}

fn add_type_namespaces(ty: &XamlType, used: &mut IndexSet<String>) {
    used.insert(ty.namespace().to_owned());
    if !ty.type_arguments().is_empty() {
        used.insert(XAML_NAMESPACE.to_owned());
    }
    for arg in ty.type_arguments() {
        add_type_namespaces(arg, used);
    }
}

/// Record the namespaces `value` is written in, failing on cycles.
///
/// Members are visited with the same rules the node walk applies, so
/// fields that are never written declare nothing.
fn collect_namespaces(
    value: &Value,
    used: &mut IndexSet<String>,
    path: &mut Vec<ObjectRef>,
) -> Result<(), XamlError> {
    let object = match value {
        Value::Object(object) => object,
        Value::Type(ty) => {
            used.insert(XAML_NAMESPACE.to_owned());
            add_type_namespaces(ty, used);
            return Ok(());
        }
        _ => {
            used.insert(XAML_NAMESPACE.to_owned());
            return Ok(());
        }
    };
    if path.iter().any(|seen| seen.ptr_eq(object)) {
        return Err(unsupported(format!(
            "the graph refers back to an enclosing {}",
            object.xaml_type()
        )));
    }

    let ty = object.xaml_type();
    add_type_namespaces(&ty, used);
    if ty.has_positional_parameters() || ty.construction_requires_arguments() {
        used.insert(XAML_NAMESPACE.to_owned());
    }

    let mut children = Vec::new();
    let args = if ty.has_positional_parameters() || ty.construction_requires_arguments() {
        ty.constructor_arguments().unwrap_or_default()
    } else {
        &[]
    };
    for arg in args {
        children.push(object.borrow().field(arg.name()).cloned().unwrap_or_default());
    }
    for member in ty.members() {
        if args.iter().any(|arg| arg.name() == member.name()) {
            continue;
        }
        let Some(field) = written_value(member, value)? else {
            continue;
        };
        match &field {
            // Written through GetObject: only the items appear.
            Value::Object(collection) if member.is_read_only() => {
                children.extend(items_of(collection, used));
            }
            _ => children.push(field),
        }
    }
    children.extend(items_of(object, used));
    path.push(object.clone());
    for child in &children {
        collect_namespaces(child, used, path)?;
    }
    path.pop();
    Ok(())
}

/// Bind the root namespace to the empty prefix and every other one to a
/// registered or generated prefix, sorted by prefix.
fn assign_prefixes(
    schema: &SchemaContext,
    root: &XamlType,
    used: IndexSet<String>,
) -> Vec<NamespaceDeclaration> {
    let mut declarations: Vec<NamespaceDeclaration> = Vec::new();
    let mut generated = 0usize;
    for namespace in used {
        let prefix = if namespace == XAML_NAMESPACE {
            XAML_PREFIX.to_owned()
        } else if namespace == root.namespace() {
            String::new()
        } else {
            match schema.preferred_prefix(&namespace) {
                Some(p) if !declarations.iter().any(|d| d.prefix() == p) => p.to_owned(),
                _ => loop {
                    let candidate = format!("ns{generated}");
                    generated += 1;
                    if !declarations.iter().any(|d| d.prefix() == candidate) {
                        break candidate;
                    }
                },
            }
        };
        declarations.push(NamespaceDeclaration::new(prefix, namespace));
    }
    declarations.sort_by(|a, b| a.prefix().cmp(b.prefix()));
    declarations
}
