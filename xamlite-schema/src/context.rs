//! Type registry and the namespace scope converters run in.

use indexmap::IndexMap;

use crate::{
    COLLECTIONS_NAMESPACE, NamespaceDeclaration, SYSTEM_NAMESPACE, SchemaError, XAML_NAMESPACE,
    XAML_PREFIX, XamlLanguage, XamlType, XamlTypeName,
};

/// What converters, serializers and markup extensions can ask about their surroundings.
pub trait ValueContext {
    /// The registry types are resolved against.
    fn schema(&self) -> &SchemaContext;

    /// Namespace bound to `prefix`, innermost declaration first.
    fn namespace_for_prefix(&self, prefix: &str) -> Option<&str>;

    /// Prefix bound to `namespace`, innermost declaration first.
    fn prefix_for_namespace(&self, namespace: &str) -> Option<&str>;

    /// Resolve a qualified type name such as `x:Int32` or `List(x:String)`.
    fn resolve_type(&self, name: &str) -> Result<XamlType, SchemaError> {
        let type_name = XamlTypeName::parse(name, &|prefix| {
            self.namespace_for_prefix(prefix).map(str::to_owned)
        })?;
        self.schema().get_type(&type_name)
    }

    /// Format `ty` with the prefixes in scope.
    fn qualified_name(&self, ty: &XamlType) -> Result<String, SchemaError> {
        XamlTypeName::from_type(ty).to_qualified_string(&|namespace| {
            self.prefix_for_namespace(namespace).map(str::to_owned)
        })
    }
}

/// A [`ValueContext`] over a slice of namespace declarations.
///
/// Later declarations shadow earlier ones.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceScope<'a> {
    schema: &'a SchemaContext,
    declarations: &'a [NamespaceDeclaration],
}

impl<'a> NamespaceScope<'a> {
    /// A scope over `declarations`.
    pub fn new(schema: &'a SchemaContext, declarations: &'a [NamespaceDeclaration]) -> Self {
        Self {
            schema,
            declarations,
        }
    }
}

impl ValueContext for NamespaceScope<'_> {
    fn schema(&self) -> &SchemaContext {
        self.schema
    }

    fn namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.prefix() == prefix)
            .map(NamespaceDeclaration::namespace)
    }

    fn prefix_for_namespace(&self, namespace: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|d| d.namespace() == namespace)
            .map(NamespaceDeclaration::prefix)
    }
}

/// Registry of known types, keyed by namespace and name.
///
/// A fresh context knows the built-in language types and generic `List`
/// and `Dictionary`.
#[derive(Debug, Clone)]
pub struct SchemaContext {
    types: IndexMap<(String, String), XamlType>,
    prefixes: IndexMap<String, String>,
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaContext {
    /// A registry seeded with the built-in language.
    pub fn new() -> Self {
        let mut schema = Self {
            types: IndexMap::new(),
            prefixes: IndexMap::new(),
        };
        for ty in XamlLanguage::types() {
            schema.register(ty.clone());
        }
        schema
            .register_prefix(XAML_NAMESPACE, XAML_PREFIX)
            .register_prefix(SYSTEM_NAMESPACE, "s")
            .register_prefix(COLLECTIONS_NAMESPACE, "scg");
        schema
    }

    /// Add a type builder-style.
    pub fn with_type(mut self, ty: XamlType) -> Self {
        self.register(ty);
        self
    }

    /// Add or replace a type.
    pub fn register(&mut self, ty: XamlType) -> &mut Self {
        self.types
            .insert((ty.namespace().to_owned(), ty.name().to_owned()), ty);
        self
    }

    /// Prefer `prefix` when a writer has to invent a declaration for `namespace`.
    pub fn register_prefix(
        &mut self,
        namespace: impl Into<String>,
        prefix: impl Into<String>,
    ) -> &mut Self {
        self.prefixes.insert(namespace.into(), prefix.into());
        self
    }

    /// The preferred prefix for `namespace`.
    pub fn preferred_prefix(&self, namespace: &str) -> Option<&str> {
        self.prefixes.get(namespace).map(String::as_str)
    }

    /// Find a non-generic type; markup extensions also answer to their short name.
    pub fn lookup(&self, namespace: &str, name: &str) -> Option<&XamlType> {
        self.types
            .get(&(namespace.to_owned(), name.to_owned()))
            .or_else(|| {
                self.types
                    .get(&(namespace.to_owned(), format!("{name}Extension")))
            })
    }

    /// Resolve a type name, instantiating generic collections on demand.
    pub fn get_type(&self, name: &XamlTypeName) -> Result<XamlType, SchemaError> {
        if name.type_arguments().is_empty() {
            return self
                .lookup(name.namespace(), name.name())
                .cloned()
                .ok_or_else(|| SchemaError::UnknownType {
                    name: name.to_string(),
                });
        }
        let args = name
            .type_arguments()
            .iter()
            .map(|arg| self.get_type(arg))
            .collect::<Result<Vec<_>, _>>()?;
        match (name.namespace(), name.name(), args.as_slice()) {
            (COLLECTIONS_NAMESPACE, "List", [item]) => Ok(XamlType::list_of(item)),
            (COLLECTIONS_NAMESPACE, "Dictionary", [key, item]) => {
                Ok(XamlType::dictionary_of(key, item))
            }
            _ => Err(SchemaError::UnknownType {
                name: name.to_string(),
            }),
        }
    }

    /// All registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &XamlType> {
        self.types.values()
    }
}
