#![warn(missing_docs)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

mod coerce;
mod error;
mod node;
mod node_list;
mod object_reader;
mod object_writer;
mod state;
mod tracing_macros;

pub use coerce::Coercer;
pub use error::{ErrorCategory, LineInfo, XamlError, XamlErrorKind};
pub use node::{XamlNode, XamlNodeType, XamlWriter, transform};
pub use node_list::NodeList;
pub use object_reader::{ObjectReader, read_object};
pub use object_writer::{
    DuplicateKeyPolicy, ObjectWriter, ObjectWriterSettings, SetValueEvent, SetValueHandler, load,
};
pub use state::{StateManager, WriteState};

pub use xamlite_schema as schema;
pub use xamlite_schema::{
    NamespaceDeclaration, SchemaContext, SchemaError, Value, XamlLanguage, XamlMember, XamlType,
};
