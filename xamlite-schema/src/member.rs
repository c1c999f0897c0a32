//! Member descriptors: properties and directives.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::invoker::DirectiveInvoker;
use crate::{
    MemberInvoker, RecordMemberInvoker, SchemaError, TypeKind, Value, ValueSerializer,
    XAML_NAMESPACE, XamlLanguage, XamlType,
};

/// Where a directive may appear in markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllowedLocations {
    attribute: bool,
    member_element: bool,
}

impl AllowedLocations {
    /// Never written directly.
    pub const NONE: Self = Self {
        attribute: false,
        member_element: false,
    };
    /// Only as an attribute.
    pub const ATTRIBUTE: Self = Self {
        attribute: true,
        member_element: false,
    };
    /// Only as a member element.
    pub const MEMBER_ELEMENT: Self = Self {
        attribute: false,
        member_element: true,
    };
    /// Attribute or member element.
    pub const ANY: Self = Self {
        attribute: true,
        member_element: true,
    };

    /// True when attribute form is allowed.
    pub const fn allows_attribute(self) -> bool {
        self.attribute
    }

    /// True when member-element form is allowed.
    pub const fn allows_member_element(self) -> bool {
        self.member_element
    }
}

type DefaultFn = dyn Fn() -> Value + Send + Sync;

struct MemberData {
    name: String,
    declaring_type: Option<String>,
    namespace: String,
    ty: XamlType,
    read_only: bool,
    directive: Option<AllowedLocations>,
    serializer: Option<Arc<dyn ValueSerializer>>,
    default: Option<Arc<DefaultFn>>,
    invoker: Arc<dyn MemberInvoker>,
}

/// Shared descriptor of a member.
///
/// Ordinary members belong to a declaring type; directives such as
/// `x:Key` belong to the XAML namespace and carry allowed locations.
#[derive(Clone)]
pub struct XamlMember(Arc<MemberData>);

impl XamlMember {
    /// Start describing a member named `name` of type `ty`.
    pub fn builder(name: impl Into<String>, ty: XamlType) -> MemberBuilder {
        MemberBuilder {
            name: name.into(),
            ty,
            read_only: false,
            serializer: None,
            default: None,
            invoker: None,
        }
    }

    pub(crate) fn directive(name: &str, ty: XamlType, allowed: AllowedLocations) -> Self {
        XamlMember(Arc::new(MemberData {
            name: name.to_owned(),
            declaring_type: None,
            namespace: XAML_NAMESPACE.to_owned(),
            ty,
            read_only: false,
            directive: Some(allowed),
            serializer: None,
            default: None,
            invoker: Arc::new(DirectiveInvoker),
        }))
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name of the declaring type; `None` for directives.
    pub fn declaring_type_name(&self) -> Option<&str> {
        self.0.declaring_type.as_deref()
    }

    /// Namespace URI the member is written in.
    pub fn namespace(&self) -> &str {
        &self.0.namespace
    }

    /// Declared value type.
    pub fn ty(&self) -> &XamlType {
        &self.0.ty
    }

    /// True when the member has no setter.
    pub fn is_read_only(&self) -> bool {
        self.0.read_only
    }

    /// True for language directives.
    pub fn is_directive(&self) -> bool {
        self.0.directive.is_some()
    }

    /// Where the member may appear; ordinary members may appear anywhere.
    pub fn allowed_locations(&self) -> AllowedLocations {
        self.0.directive.unwrap_or(AllowedLocations::ANY)
    }

    /// Member-level serializer, overriding the value type's.
    pub fn value_serializer(&self) -> Option<&dyn ValueSerializer> {
        self.0.serializer.as_deref()
    }

    /// True when values of this member are written as text.
    pub fn is_content_value(&self) -> bool {
        self.0.serializer.is_some() || self.0.ty.is_content_value()
    }

    /// The value a fresh record holds for this member.
    ///
    /// Read-only collections start empty, scalars other than strings start
    /// at their zero value, everything else starts null.
    pub fn default_value(&self) -> Value {
        if let Some(default) = &self.0.default {
            return default();
        }
        let ty = &self.0.ty;
        if self.0.read_only && (ty.is_collection() || ty.is_dictionary()) {
            return ty.create_instance(&[]).unwrap_or_default();
        }
        if *ty.kind() == TypeKind::Scalar
            && ty != XamlLanguage::string()
            && ty != XamlLanguage::type_reference()
        {
            return ty.create_instance(&[]).unwrap_or_default();
        }
        Value::Null
    }

    /// Read the member from `instance`.
    pub fn get(&self, instance: &Value) -> Result<Value, SchemaError> {
        self.0.invoker.get(self, instance)
    }

    /// Write the member on `instance`.
    pub fn set(&self, instance: &Value, value: Value) -> Result<(), SchemaError> {
        self.0.invoker.set(self, instance, value)
    }
}

impl PartialEq for XamlMember {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.name == other.0.name
                && self.0.declaring_type == other.0.declaring_type
                && self.0.namespace == other.0.namespace)
    }
}

impl Eq for XamlMember {}

impl Hash for XamlMember {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
        self.0.declaring_type.hash(state);
        self.0.namespace.hash(state);
    }
}

impl fmt::Display for XamlMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.declaring_type {
            Some(owner) => write!(f, "{owner}.{}", self.0.name),
            None => write!(f, "x:{}", self.0.name),
        }
    }
}

impl fmt::Debug for XamlMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XamlMember({self}: {})", self.0.ty)
    }
}

/// Builder for an ordinary member, finished by [`crate::XamlTypeBuilder`].
pub struct MemberBuilder {
    name: String,
    ty: XamlType,
    read_only: bool,
    serializer: Option<Arc<dyn ValueSerializer>>,
    default: Option<Arc<DefaultFn>>,
    invoker: Option<Arc<dyn MemberInvoker>>,
}

impl MemberBuilder {
    /// Drop the setter.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Serialize values of this member with `serializer`.
    pub fn value_serializer(mut self, serializer: impl ValueSerializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Override the default value of fresh records.
    pub fn default_value(mut self, default: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(Arc::new(default));
        self
    }

    /// Store the member somewhere other than the record's fields.
    pub fn invoker(mut self, invoker: impl MemberInvoker + 'static) -> Self {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    pub(crate) fn build(self, declaring_type: &str, namespace: &str) -> XamlMember {
        XamlMember(Arc::new(MemberData {
            name: self.name,
            declaring_type: Some(declaring_type.to_owned()),
            namespace: namespace.to_owned(),
            ty: self.ty,
            read_only: self.read_only,
            directive: None,
            serializer: self.serializer,
            default: self.default,
            invoker: self
                .invoker
                .unwrap_or_else(|| Arc::new(RecordMemberInvoker)),
        }))
    }
}
