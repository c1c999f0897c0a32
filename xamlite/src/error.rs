//! Errors raised while driving a node stream through a writer.

use std::fmt;

use xamlite_schema::{SchemaError, Value, XamlType};

use crate::{WriteState, XamlNodeType};

/// Broad classification of a [`XamlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The stream broke the node grammar or wrote a member twice.
    Structural,
    /// A value could not be made to conform to its declared type.
    Coercion,
    /// No constructor or factory method could produce the instance.
    Construction,
    /// The graph is valid but has no markup rendering.
    UnsupportedGraph,
    /// A type, member or name lookup failed in the schema.
    Schema,
}

/// Position in the source markup, as reported by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineInfo {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl fmt::Display for LineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, position {}", self.line, self.column)
    }
}

/// Error raised by the writers and the graph walker.
#[derive(Debug)]
pub struct XamlError {
    kind: XamlErrorKind,
    line_info: Option<LineInfo>,
}

impl XamlError {
    /// Wrap a kind without position information.
    pub fn new(kind: XamlErrorKind) -> Self {
        Self {
            kind,
            line_info: None,
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> &XamlErrorKind {
        &self.kind
    }

    /// Broad classification.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Source position of the event that failed, if the source reported one.
    pub fn line_info(&self) -> Option<LineInfo> {
        self.line_info
    }

    pub(crate) fn with_line_info(mut self, line_info: Option<LineInfo>) -> Self {
        if self.line_info.is_none() {
            self.line_info = line_info;
        }
        self
    }

    pub(crate) fn coercion(value: &Value, target: &XamlType, reason: Option<String>) -> Self {
        let value_type = match value {
            Value::Null => "(null)".to_owned(),
            other => other.xaml_type().to_string(),
        };
        XamlErrorKind::Coercion {
            value: value.to_string(),
            value_type,
            target: target.to_string(),
            reason,
        }
        .into()
    }
}

impl<K: Into<XamlErrorKind>> From<K> for XamlError {
    fn from(kind: K) -> Self {
        XamlError::new(kind.into())
    }
}

impl fmt::Display for XamlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(line_info) = self.line_info {
            write!(f, " ({line_info})")?;
        }
        Ok(())
    }
}

impl std::error::Error for XamlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            XamlErrorKind::Instantiation { source, .. } | XamlErrorKind::Schema(source) => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl miette::Diagnostic for XamlError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.kind {
            XamlErrorKind::InvalidTransition { .. } => {
                "objects contain members, members contain values or objects; close each before its parent"
            }
            XamlErrorKind::DuplicateMember { .. } => "each member may be written once per object",
            XamlErrorKind::MissingKey { .. } => "give every dictionary item an x:Key",
            XamlErrorKind::MultiplePositionalParameters { .. } => {
                "nest the object under a collection or member element so its arguments can be written as element content"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }
}

/// Specific error kinds.
#[derive(Debug)]
#[non_exhaustive]
pub enum XamlErrorKind {
    /// The event is illegal in the current write state.
    InvalidTransition {
        /// The rejected event.
        node: XamlNodeType,
        /// State the writer was in.
        state: WriteState,
    },
    /// A member received a second value on the same object.
    DuplicateMember {
        /// The member.
        member: String,
        /// The object's type.
        owner: String,
    },
    /// A dictionary already holds the key.
    DuplicateKey {
        /// Display form of the key.
        key: String,
        /// The dictionary type.
        owner: String,
    },
    /// A dictionary item arrived without `x:Key`.
    MissingKey {
        /// The dictionary type.
        owner: String,
    },
    /// The object already has its value.
    AlreadyInstantiated {
        /// The object's type.
        ty: String,
    },
    /// `GetObject` or an implicit collection found the member unset.
    NullExistingValue {
        /// The member that was read.
        member: String,
    },
    /// `GetObject` was written into a member that does not hold a collection.
    NotACollection {
        /// The member that was read.
        member: String,
    },
    /// A value could not be converted to the declared type.
    Coercion {
        /// Display form of the value.
        value: String,
        /// The value's runtime type.
        value_type: String,
        /// The declared type.
        target: String,
        /// Failure reported by the converter or constructor, if any.
        reason: Option<String>,
    },
    /// `x:FactoryMethod` did not hold exactly one string.
    InvalidFactoryMethod {
        /// What was found instead.
        found: String,
    },
    /// `x:FactoryMethod` arrived after the object was created.
    LateFactoryMethod {
        /// The object's type.
        ty: String,
    },
    /// No factory method matches name and arity.
    NoFactoryMethod {
        /// Method name.
        name: String,
        /// The object's type.
        ty: String,
        /// Number of arguments.
        arity: usize,
    },
    /// No constructor overload takes this many positional arguments.
    NoConstructorSlots {
        /// The object's type.
        ty: String,
        /// Number of arguments.
        count: usize,
    },
    /// Argument count does not match the constructor-argument metadata.
    ArgumentCount {
        /// The object's type.
        ty: String,
        /// Parameters declared.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },
    /// The type could not construct an instance.
    Instantiation {
        /// The object's type.
        ty: String,
        /// The constructor's error.
        source: SchemaError,
    },
    /// A top-level markup extension has more than one positional parameter.
    MultiplePositionalParameters {
        /// The extension type.
        ty: String,
    },
    /// The object graph cannot be described as nodes.
    UnsupportedValue {
        /// Why.
        reason: String,
    },
    /// A schema lookup or member accessor failed.
    Schema(SchemaError),
}

impl XamlErrorKind {
    /// Broad classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            XamlErrorKind::InvalidTransition { .. }
            | XamlErrorKind::DuplicateMember { .. }
            | XamlErrorKind::DuplicateKey { .. }
            | XamlErrorKind::MissingKey { .. }
            | XamlErrorKind::AlreadyInstantiated { .. }
            | XamlErrorKind::NullExistingValue { .. }
            | XamlErrorKind::NotACollection { .. }
            | XamlErrorKind::InvalidFactoryMethod { .. }
            | XamlErrorKind::LateFactoryMethod { .. } => ErrorCategory::Structural,
            XamlErrorKind::Coercion { .. } => ErrorCategory::Coercion,
            XamlErrorKind::NoFactoryMethod { .. }
            | XamlErrorKind::NoConstructorSlots { .. }
            | XamlErrorKind::ArgumentCount { .. }
            | XamlErrorKind::Instantiation { .. } => ErrorCategory::Construction,
            XamlErrorKind::MultiplePositionalParameters { .. }
            | XamlErrorKind::UnsupportedValue { .. } => ErrorCategory::UnsupportedGraph,
            XamlErrorKind::Schema(_) => ErrorCategory::Schema,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            XamlErrorKind::InvalidTransition { .. } => "xaml::invalid_transition",
            XamlErrorKind::DuplicateMember { .. } => "xaml::duplicate_member",
            XamlErrorKind::DuplicateKey { .. } => "xaml::duplicate_key",
            XamlErrorKind::MissingKey { .. } => "xaml::missing_key",
            XamlErrorKind::AlreadyInstantiated { .. } => "xaml::already_instantiated",
            XamlErrorKind::NullExistingValue { .. } => "xaml::null_existing_value",
            XamlErrorKind::NotACollection { .. } => "xaml::not_a_collection",
            XamlErrorKind::Coercion { .. } => "xaml::coercion",
            XamlErrorKind::InvalidFactoryMethod { .. } => "xaml::invalid_factory_method",
            XamlErrorKind::LateFactoryMethod { .. } => "xaml::late_factory_method",
            XamlErrorKind::NoFactoryMethod { .. } => "xaml::no_factory_method",
            XamlErrorKind::NoConstructorSlots { .. } => "xaml::no_constructor",
            XamlErrorKind::ArgumentCount { .. } => "xaml::argument_count",
            XamlErrorKind::Instantiation { .. } => "xaml::instantiation",
            XamlErrorKind::MultiplePositionalParameters { .. } => {
                "xaml::multiple_positional_parameters"
            }
            XamlErrorKind::UnsupportedValue { .. } => "xaml::unsupported_value",
            XamlErrorKind::Schema(_) => "xaml::schema",
        }
    }
}

impl From<SchemaError> for XamlErrorKind {
    fn from(e: SchemaError) -> Self {
        XamlErrorKind::Schema(e)
    }
}

impl fmt::Display for XamlErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XamlErrorKind::InvalidTransition { node, state } => {
                write!(f, "{node} is not allowed in state {state}")
            }
            XamlErrorKind::DuplicateMember { member, owner } => {
                write!(f, "member {member} is already set on {owner}")
            }
            XamlErrorKind::DuplicateKey { key, owner } => {
                write!(f, "key '{key}' is already present in {owner}")
            }
            XamlErrorKind::MissingKey { owner } => {
                write!(f, "an item of {owner} has no x:Key")
            }
            XamlErrorKind::AlreadyInstantiated { ty } => {
                write!(f, "the {ty} object already has a value")
            }
            XamlErrorKind::NullExistingValue { member } => {
                write!(f, "cannot populate {member}: its current value is null")
            }
            XamlErrorKind::NotACollection { member } => {
                write!(f, "GetObject needs a collection member, but {member} is not one")
            }
            XamlErrorKind::Coercion {
                value,
                value_type,
                target,
                reason: Some(reason),
            } => write!(
                f,
                "could not convert '{value}' (of type {value_type}) to {target}: {reason}"
            ),
            XamlErrorKind::Coercion {
                value,
                value_type,
                target,
                reason: None,
            } => write!(
                f,
                "value '{value}' (of type {value_type}) is not of or convertible to type {target}"
            ),
            XamlErrorKind::InvalidFactoryMethod { found } => {
                write!(f, "x:FactoryMethod must hold one string, found {found}")
            }
            XamlErrorKind::LateFactoryMethod { ty } => {
                write!(f, "x:FactoryMethod must precede the members of {ty}")
            }
            XamlErrorKind::NoFactoryMethod { name, ty, arity } => {
                write!(f, "{ty} has no factory method {name} taking {arity} argument(s)")
            }
            XamlErrorKind::NoConstructorSlots { ty, count } => {
                write!(f, "{ty} has no constructor taking {count} argument(s)")
            }
            XamlErrorKind::ArgumentCount {
                ty,
                expected,
                actual,
            } => write!(
                f,
                "{ty} declares {expected} constructor argument(s) but {actual} were supplied"
            ),
            XamlErrorKind::Instantiation { ty, source } => {
                write!(f, "failed to create an instance of {ty}: {source}")
            }
            XamlErrorKind::MultiplePositionalParameters { ty } => write!(
                f,
                "{ty} has more than one positional parameter and cannot be written as a top-level attribute"
            ),
            XamlErrorKind::UnsupportedValue { reason } => f.write_str(reason),
            XamlErrorKind::Schema(e) => write!(f, "{e}"),
        }
    }
}
