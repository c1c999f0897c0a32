#![warn(missing_docs)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

mod context;
mod convert;
mod error;
mod invoker;
mod language;
mod member;
mod name;
mod types;
mod value;

pub use context::{NamespaceScope, SchemaContext, ValueContext};
pub use convert::{MarkupExtension, TypeConverter, ValueSerializer};
pub use error::SchemaError;
pub use invoker::{
    DictionaryInvoker, ListInvoker, MemberInvoker, RecordInvoker, RecordMemberInvoker,
    TypeInvoker,
};
pub use language::{
    COLLECTIONS_NAMESPACE, SYSTEM_NAMESPACE, XAML_NAMESPACE, XAML_PREFIX, XamlLanguage,
};
pub use member::{AllowedLocations, MemberBuilder, XamlMember};
pub use name::{NamespaceDeclaration, XamlTypeName};
pub use types::{ConstructorArgument, FactoryMethod, TypeKind, XamlType, XamlTypeBuilder};
pub use value::{DictionaryData, ListData, Object, ObjectData, ObjectRef, Value};
