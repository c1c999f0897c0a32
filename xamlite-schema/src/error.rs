//! Errors reported by types, members, converters and name resolution.

use std::fmt;

/// Error raised by the type capability provider.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// No type is registered under the name.
    UnknownType {
        /// The name that failed to resolve.
        name: String,
    },
    /// A qualified name used a prefix with no namespace declaration in scope.
    UnknownPrefix {
        /// The unbound prefix.
        prefix: String,
    },
    /// A namespace has no prefix in scope, so a qualified name cannot be written.
    UnknownNamespace {
        /// The namespace without a prefix.
        namespace: String,
    },
    /// A type name string did not follow `prefix:Name(Arg, ...)` syntax.
    InvalidTypeName {
        /// The text being parsed.
        text: String,
        /// What went wrong.
        reason: &'static str,
    },
    /// A converter rejected its input.
    Conversion {
        /// Display form of the input.
        value: String,
        /// The type being converted to.
        target: String,
        /// Why the conversion failed.
        reason: String,
    },
    /// The type cannot be created without arguments.
    NoDefaultConstructor {
        /// The type being instantiated.
        ty: String,
    },
    /// No constructor overload takes this many arguments.
    NoMatchingConstructor {
        /// The type being instantiated.
        ty: String,
        /// Number of arguments supplied.
        arity: usize,
    },
    /// An accessor was handed an instance of the wrong shape.
    WrongInstance {
        /// The shape the accessor needs (`record`, `list`, ...).
        expected: &'static str,
        /// The runtime type it got.
        ty: String,
    },
    /// A dictionary already holds the key.
    DuplicateKey {
        /// Display form of the key.
        key: String,
    },
    /// The member has no setter.
    ReadOnlyMember {
        /// The member being set.
        member: String,
    },
    /// A list capacity below the current item count, or negative.
    InvalidCapacity {
        /// Requested capacity.
        capacity: i64,
        /// Items currently held.
        count: usize,
    },
    /// A markup extension or accessor found a required value missing.
    MissingValue {
        /// The member that had no value.
        member: String,
        /// The type that owns it.
        ty: String,
    },
    /// Error raised by a user-supplied converter, invoker or extension.
    Custom(String),
}

impl SchemaError {
    /// Build a [`SchemaError::Custom`] from any message.
    pub fn custom(message: impl fmt::Display) -> Self {
        SchemaError::Custom(message.to_string())
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnknownType { name } => write!(f, "unknown type {name}"),
            SchemaError::UnknownPrefix { prefix } => {
                write!(f, "no namespace declared for prefix '{prefix}'")
            }
            SchemaError::UnknownNamespace { namespace } => {
                write!(f, "no prefix declared for namespace '{namespace}'")
            }
            SchemaError::InvalidTypeName { text, reason } => {
                write!(f, "invalid type name '{text}': {reason}")
            }
            SchemaError::Conversion {
                value,
                target,
                reason,
            } => write!(f, "cannot convert '{value}' to {target}: {reason}"),
            SchemaError::NoDefaultConstructor { ty } => {
                write!(f, "type {ty} has no default constructor")
            }
            SchemaError::NoMatchingConstructor { ty, arity } => {
                write!(f, "type {ty} has no constructor taking {arity} argument(s)")
            }
            SchemaError::WrongInstance { expected, ty } => {
                write!(f, "expected a {expected} instance, got {ty}")
            }
            SchemaError::DuplicateKey { key } => write!(f, "key '{key}' is already present"),
            SchemaError::ReadOnlyMember { member } => write!(f, "member {member} is read-only"),
            SchemaError::InvalidCapacity { capacity, count } => {
                write!(f, "capacity {capacity} is invalid for a list holding {count} item(s)")
            }
            SchemaError::MissingValue { member, ty } => {
                write!(f, "{ty} requires a value for {member}")
            }
            SchemaError::Custom(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for SchemaError {}
