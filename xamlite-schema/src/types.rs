//! Type descriptors and their builder.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::invoker::{DictionaryInvoker, ListCapacityInvoker, ListInvoker, RecordInvoker};
use crate::{
    COLLECTIONS_NAMESPACE, MarkupExtension, MemberBuilder, ObjectRef, SchemaError, TypeConverter,
    TypeInvoker, Value, ValueContext, ValueSerializer, XamlLanguage, XamlMember,
};

/// Structural category of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Accepts any value (`x:Object`).
    Any,
    /// A value type written as text: booleans, numbers, strings.
    Scalar,
    /// An object with named members.
    Record,
    /// An ordered collection of `item`.
    List {
        /// Element type.
        item: XamlType,
    },
    /// A keyed collection.
    Dictionary {
        /// Key type.
        key: XamlType,
        /// Value type.
        item: XamlType,
    },
}

/// One named parameter of a constructor overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructorArgument {
    name: String,
    ty: XamlType,
}

impl ConstructorArgument {
    /// A parameter named `name` of type `ty`.
    pub fn new(name: impl Into<String>, ty: XamlType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Parameter name; matches the member the argument initializes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type.
    pub fn ty(&self) -> &XamlType {
        &self.ty
    }
}

type FactoryFn = dyn Fn(&[Value]) -> Result<Value, SchemaError> + Send + Sync;

/// A named static method that produces an instance.
#[derive(Clone)]
pub struct FactoryMethod {
    name: String,
    parameters: Vec<XamlType>,
    invoke: Arc<FactoryFn>,
}

impl FactoryMethod {
    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter types in order.
    pub fn parameters(&self) -> &[XamlType] {
        &self.parameters
    }

    /// Call the method with already-coerced arguments.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, SchemaError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

struct ExtensionInfo {
    return_type: Option<XamlType>,
    provider: Arc<dyn MarkupExtension>,
}

struct TypeData {
    name: String,
    namespace: String,
    type_arguments: Vec<XamlType>,
    base: Option<XamlType>,
    kind: TypeKind,
    members: Vec<XamlMember>,
    content_property: Option<String>,
    constructors: Vec<Vec<ConstructorArgument>>,
    constructor_arguments: Option<Vec<ConstructorArgument>>,
    default_constructible: bool,
    factory_methods: Vec<FactoryMethod>,
    converter: Option<Arc<dyn TypeConverter>>,
    serializer: Option<Arc<dyn ValueSerializer>>,
    extension: Option<ExtensionInfo>,
    invoker: Arc<dyn TypeInvoker>,
}

/// Shared descriptor of a type.
///
/// Two descriptors are equal when their namespace, name and type arguments
/// match, so `XamlType::list_of(int32)` built twice compares equal.
#[derive(Clone)]
pub struct XamlType(Arc<TypeData>);

impl XamlType {
    /// Start describing a record type.
    pub fn builder(namespace: impl Into<String>, name: impl Into<String>) -> XamlTypeBuilder {
        XamlTypeBuilder::new(namespace, name)
    }

    /// `List(item)` in the generic collections namespace.
    pub fn list_of(item: &XamlType) -> XamlType {
        list_type(item.clone(), XamlLanguage::int32().clone())
    }

    /// `Dictionary(key, item)` in the generic collections namespace.
    pub fn dictionary_of(key: &XamlType, item: &XamlType) -> XamlType {
        XamlTypeBuilder::new(COLLECTIONS_NAMESPACE, "Dictionary")
            .type_arguments([key.clone(), item.clone()])
            .kind(TypeKind::Dictionary {
                key: key.clone(),
                item: item.clone(),
            })
            .invoker(DictionaryInvoker)
            .build()
    }

    /// Unqualified name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name as written in markup; markup extensions drop the `Extension` suffix.
    pub fn xml_name(&self) -> Cow<'_, str> {
        match self.0.name.strip_suffix("Extension") {
            Some(short) if self.is_markup_extension() && !short.is_empty() => Cow::Borrowed(short),
            _ => Cow::Borrowed(&self.0.name),
        }
    }

    /// Namespace URI.
    pub fn namespace(&self) -> &str {
        &self.0.namespace
    }

    /// Generic type arguments, empty for non-generic types.
    pub fn type_arguments(&self) -> &[XamlType] {
        &self.0.type_arguments
    }

    /// Base type, if any.
    pub fn base_type(&self) -> Option<&XamlType> {
        self.0.base.as_ref()
    }

    /// Structural category.
    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// All members, inherited ones first.
    pub fn members(&self) -> &[XamlMember] {
        &self.0.members
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&XamlMember> {
        self.0.members.iter().find(|m| m.name() == name)
    }

    /// The member that receives un-named content, if declared.
    pub fn content_property(&self) -> Option<&XamlMember> {
        self.0
            .content_property
            .as_deref()
            .and_then(|name| self.member(name))
    }

    /// True for list types.
    pub fn is_collection(&self) -> bool {
        matches!(self.0.kind, TypeKind::List { .. })
    }

    /// True for dictionary types.
    pub fn is_dictionary(&self) -> bool {
        matches!(self.0.kind, TypeKind::Dictionary { .. })
    }

    /// Element type of a list, value type of a dictionary.
    pub fn item_type(&self) -> Option<&XamlType> {
        match &self.0.kind {
            TypeKind::List { item } | TypeKind::Dictionary { item, .. } => Some(item),
            _ => None,
        }
    }

    /// Key type of a dictionary.
    pub fn key_type(&self) -> Option<&XamlType> {
        match &self.0.kind {
            TypeKind::Dictionary { key, .. } => Some(key),
            _ => None,
        }
    }

    /// True when instances are markup extensions that provide another value.
    pub fn is_markup_extension(&self) -> bool {
        self.0.extension.is_some()
    }

    /// Declared return type of a markup extension; `None` means unconstrained.
    pub fn markup_extension_return_type(&self) -> Option<&XamlType> {
        self.0
            .extension
            .as_ref()
            .and_then(|ext| ext.return_type.as_ref())
    }

    /// Ask a markup extension instance for the value it stands for.
    ///
    /// Instances of other types provide themselves.
    pub fn provide_value(
        &self,
        instance: &ObjectRef,
        ctx: &dyn ValueContext,
    ) -> Result<Value, SchemaError> {
        match &self.0.extension {
            Some(ext) => ext.provider.provide_value(instance, ctx),
            None => Ok(Value::Object(instance.clone())),
        }
    }

    /// Converter from other representations, usually text.
    pub fn type_converter(&self) -> Option<&dyn TypeConverter> {
        self.0.converter.as_deref()
    }

    /// Serializer to text.
    pub fn value_serializer(&self) -> Option<&dyn ValueSerializer> {
        self.0.serializer.as_deref()
    }

    /// True when values of the type round-trip through text.
    pub fn is_content_value(&self) -> bool {
        if self == XamlLanguage::string() {
            return true;
        }
        self.value_serializer().is_some()
            && self
                .type_converter()
                .is_some_and(|c| c.can_convert_from(XamlLanguage::string()))
    }

    /// Ordered constructor-argument metadata, if the type declares it.
    pub fn constructor_arguments(&self) -> Option<&[ConstructorArgument]> {
        self.0.constructor_arguments.as_deref()
    }

    /// Constructor overloads.
    pub fn constructors(&self) -> &[Vec<ConstructorArgument>] {
        &self.0.constructors
    }

    /// Parameter types of the first constructor overload with `count` parameters.
    pub fn positional_parameters(&self, count: usize) -> Option<Vec<XamlType>> {
        self.0
            .constructors
            .iter()
            .find(|ctor| ctor.len() == count)
            .map(|ctor| ctor.iter().map(|arg| arg.ty.clone()).collect())
    }

    /// True for markup extensions whose constructor arguments are all text-convertible.
    pub fn has_positional_parameters(&self) -> bool {
        self.is_markup_extension()
            && self.constructor_arguments().is_some_and(|args| {
                !args.is_empty() && args.iter().all(|arg| arg.ty.is_content_value())
            })
    }

    /// True when the type has no default constructor.
    pub fn construction_requires_arguments(&self) -> bool {
        !self.0.default_constructible
    }

    /// True when the type can be created without arguments.
    pub fn is_default_constructible(&self) -> bool {
        self.0.default_constructible
    }

    /// Factory method by name and arity.
    pub fn factory_method(&self, name: &str, arity: usize) -> Option<&FactoryMethod> {
        self.0
            .factory_methods
            .iter()
            .find(|m| m.name == name && m.parameters.len() == arity)
    }

    /// True when a factory method with this name exists at any arity.
    pub fn has_factory_method(&self, name: &str) -> bool {
        self.0.factory_methods.iter().any(|m| m.name == name)
    }

    /// Create an instance; `args` picks the constructor overload by count.
    pub fn create_instance(&self, args: &[Value]) -> Result<Value, SchemaError> {
        self.0.invoker.create_instance(self, args)
    }

    /// Append `item` to a list instance.
    pub fn add_to_collection(&self, instance: &Value, item: Value) -> Result<(), SchemaError> {
        self.0.invoker.add_to_collection(self, instance, item)
    }

    /// Store `item` under `key` in a dictionary instance.
    ///
    /// An existing key is an error unless `replace` is set.
    pub fn add_to_dictionary(
        &self,
        instance: &Value,
        key: Value,
        item: Value,
        replace: bool,
    ) -> Result<(), SchemaError> {
        self.0
            .invoker
            .add_to_dictionary(self, instance, key, item, replace)
    }

    /// True when a value of type `other` may be stored where `self` is declared.
    pub fn is_assignable_from(&self, other: &XamlType) -> bool {
        if self == other || self.0.kind == TypeKind::Any {
            return true;
        }
        let mut base = other.base_type();
        while let Some(b) = base {
            if b == self {
                return true;
            }
            base = b.base_type();
        }
        false
    }
}

pub(crate) fn list_type(item: XamlType, int32: XamlType) -> XamlType {
    XamlTypeBuilder::new(COLLECTIONS_NAMESPACE, "List")
        .type_arguments([item.clone()])
        .kind(TypeKind::List { item })
        .member_with(XamlMember::builder("Capacity", int32.clone()).invoker(ListCapacityInvoker))
        .constructor([("capacity", int32)])
        .invoker(ListInvoker)
        .build()
}

impl PartialEq for XamlType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.name == other.0.name
                && self.0.namespace == other.0.namespace
                && self.0.type_arguments == other.0.type_arguments)
    }
}

impl Eq for XamlType {}

impl Hash for XamlType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.namespace.hash(state);
        self.0.name.hash(state);
        self.0.type_arguments.hash(state);
    }
}

impl fmt::Display for XamlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)?;
        if let Some((first, rest)) = self.0.type_arguments.split_first() {
            write!(f, "({first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for XamlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XamlType({{{}}}{self})", self.0.namespace)
    }
}

/// Builder for [`XamlType`].
pub struct XamlTypeBuilder {
    name: String,
    namespace: String,
    type_arguments: Vec<XamlType>,
    base: Option<XamlType>,
    kind: TypeKind,
    members: Vec<MemberBuilder>,
    content_property: Option<String>,
    constructors: Vec<Vec<ConstructorArgument>>,
    constructor_arguments: Option<Vec<ConstructorArgument>>,
    default_constructible: bool,
    factory_methods: Vec<FactoryMethod>,
    converter: Option<Arc<dyn TypeConverter>>,
    serializer: Option<Arc<dyn ValueSerializer>>,
    extension: Option<ExtensionInfo>,
    invoker: Option<Arc<dyn TypeInvoker>>,
}

impl XamlTypeBuilder {
    /// A default-constructible record type with no members.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            type_arguments: Vec::new(),
            base: None,
            kind: TypeKind::Record,
            members: Vec::new(),
            content_property: None,
            constructors: Vec::new(),
            constructor_arguments: None,
            default_constructible: true,
            factory_methods: Vec::new(),
            converter: None,
            serializer: None,
            extension: None,
            invoker: None,
        }
    }

    /// Set the structural category.
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the generic type arguments.
    pub fn type_arguments(mut self, args: impl IntoIterator<Item = XamlType>) -> Self {
        self.type_arguments = args.into_iter().collect();
        self
    }

    /// Derive from `base`, inheriting its members.
    pub fn base(mut self, base: &XamlType) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Add a read-write member stored in the record.
    pub fn member(self, name: impl Into<String>, ty: &XamlType) -> Self {
        self.member_with(XamlMember::builder(name, ty.clone()))
    }

    /// Add a member with no setter.
    pub fn read_only_member(self, name: impl Into<String>, ty: &XamlType) -> Self {
        self.member_with(XamlMember::builder(name, ty.clone()).read_only())
    }

    /// Add a fully configured member.
    pub fn member_with(mut self, member: MemberBuilder) -> Self {
        self.members.push(member);
        self
    }

    /// Name the member that receives un-named content.
    pub fn content_property(mut self, name: impl Into<String>) -> Self {
        self.content_property = Some(name.into());
        self
    }

    /// Add a constructor overload.
    pub fn constructor<N: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = (N, XamlType)>,
    ) -> Self {
        self.constructors.push(
            params
                .into_iter()
                .map(|(name, ty)| ConstructorArgument::new(name, ty))
                .collect(),
        );
        self
    }

    /// Add a constructor overload and publish it as the ordered constructor-argument metadata.
    pub fn constructor_arguments<N: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = (N, XamlType)>,
    ) -> Self {
        let args: Vec<ConstructorArgument> = params
            .into_iter()
            .map(|(name, ty)| ConstructorArgument::new(name, ty))
            .collect();
        self.constructors.push(args.clone());
        self.constructor_arguments = Some(args);
        self
    }

    /// Require constructor arguments or a factory method to create instances.
    pub fn no_default_constructor(mut self) -> Self {
        self.default_constructible = false;
        self
    }

    /// Add a named factory method.
    pub fn factory_method(
        mut self,
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = XamlType>,
        invoke: impl Fn(&[Value]) -> Result<Value, SchemaError> + Send + Sync + 'static,
    ) -> Self {
        self.factory_methods.push(FactoryMethod {
            name: name.into(),
            parameters: parameters.into_iter().collect(),
            invoke: Arc::new(invoke),
        });
        self
    }

    /// Attach a converter.
    pub fn type_converter(mut self, converter: impl TypeConverter + 'static) -> Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// Attach a serializer.
    pub fn value_serializer(mut self, serializer: impl ValueSerializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Make instances markup extensions that provide a value of `return_type`.
    pub fn markup_extension(
        mut self,
        return_type: Option<&XamlType>,
        provider: impl MarkupExtension + 'static,
    ) -> Self {
        self.extension = Some(ExtensionInfo {
            return_type: return_type.cloned(),
            provider: Arc::new(provider),
        });
        self
    }

    /// Replace the default record invoker.
    pub fn invoker(mut self, invoker: impl TypeInvoker + 'static) -> Self {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> XamlType {
        let mut members: Vec<XamlMember> = self
            .base
            .as_ref()
            .map(|base| base.members().to_vec())
            .unwrap_or_default();
        for member in self.members {
            let member = member.build(&self.name, &self.namespace);
            members.retain(|m| m.name() != member.name());
            members.push(member);
        }
        XamlType(Arc::new(TypeData {
            name: self.name,
            namespace: self.namespace,
            type_arguments: self.type_arguments,
            base: self.base,
            kind: self.kind,
            members,
            content_property: self.content_property,
            constructors: self.constructors,
            constructor_arguments: self.constructor_arguments,
            default_constructible: self.default_constructible,
            factory_methods: self.factory_methods,
            converter: self.converter,
            serializer: self.serializer,
            extension: self.extension,
            invoker: self.invoker.unwrap_or_else(|| Arc::new(RecordInvoker)),
        }))
    }
}
