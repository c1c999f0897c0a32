//! Namespace declarations and qualified type names.

use std::fmt;

use crate::{SchemaError, XamlType};

/// A prefix-to-namespace binding carried by the node stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceDeclaration {
    prefix: String,
    namespace: String,
}

impl NamespaceDeclaration {
    /// Bind `prefix` (empty for the default namespace) to `namespace`.
    pub fn new(prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
        }
    }

    /// The prefix; empty for the default namespace.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The namespace URI.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for NamespaceDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "xmlns=\"{}\"", self.namespace)
        } else {
            write!(f, "xmlns:{}=\"{}\"", self.prefix, self.namespace)
        }
    }
}

/// A resolved type name: namespace, local name and type arguments.
///
/// The text form is `prefix:Name(Arg1, Arg2)`; prefixes are resolved while
/// parsing and looked up again when formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XamlTypeName {
    namespace: String,
    name: String,
    type_arguments: Vec<XamlTypeName>,
}

impl XamlTypeName {
    /// A non-generic name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            type_arguments: Vec::new(),
        }
    }

    /// Attach type arguments.
    pub fn with_type_arguments(mut self, args: impl IntoIterator<Item = XamlTypeName>) -> Self {
        self.type_arguments = args.into_iter().collect();
        self
    }

    /// The name of an existing type.
    pub fn from_type(ty: &XamlType) -> Self {
        Self {
            namespace: ty.namespace().to_owned(),
            name: ty.name().to_owned(),
            type_arguments: ty.type_arguments().iter().map(Self::from_type).collect(),
        }
    }

    /// Namespace URI.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type arguments.
    pub fn type_arguments(&self) -> &[XamlTypeName] {
        &self.type_arguments
    }

    /// Parse `prefix:Name(Arg, ...)`, resolving prefixes with `resolve`.
    pub fn parse(
        text: &str,
        resolve: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, SchemaError> {
        let mut parser = NameParser {
            text,
            pos: 0,
            resolve,
        };
        let name = parser.parse_name()?;
        parser.skip_whitespace();
        if parser.pos != text.len() {
            return Err(parser.error("unexpected characters after type name"));
        }
        Ok(name)
    }

    /// Format with prefixes found by `lookup`; the empty prefix omits the colon.
    pub fn to_qualified_string(
        &self,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<String, SchemaError> {
        let prefix = lookup(&self.namespace).ok_or_else(|| SchemaError::UnknownNamespace {
            namespace: self.namespace.clone(),
        })?;
        let mut out = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{prefix}:{}", self.name)
        };
        if !self.type_arguments.is_empty() {
            let args = self
                .type_arguments
                .iter()
                .map(|arg| arg.to_qualified_string(lookup))
                .collect::<Result<Vec<_>, _>>()?;
            out.push('(');
            out.push_str(&args.join(", "));
            out.push(')');
        }
        Ok(out)
    }
}

impl fmt::Display for XamlTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)?;
        if let Some((first, rest)) = self.type_arguments.split_first() {
            write!(f, "({first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

struct NameParser<'a> {
    text: &'a str,
    pos: usize,
    resolve: &'a dyn Fn(&str) -> Option<String>,
}

impl NameParser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, reason: &'static str) -> SchemaError {
        SchemaError::InvalidTypeName {
            text: self.text.to_owned(),
            reason,
        }
    }

    fn parse_name(&mut self) -> Result<XamlTypeName, SchemaError> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self
            .peek()
            .filter(|c| !c.is_whitespace() && !matches!(*c, '(' | ')' | ','))
        {
            self.pos += c.len_utf8();
        }
        let qualified = &self.text[start..self.pos];
        let (prefix, local) = qualified.split_once(':').unwrap_or(("", qualified));
        if local.is_empty() || local.contains(':') {
            return Err(self.error("expected a name of the form prefix:Name"));
        }
        let namespace = (self.resolve)(prefix).ok_or_else(|| SchemaError::UnknownPrefix {
            prefix: prefix.to_owned(),
        })?;
        let mut name = XamlTypeName::new(namespace, local);

        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.pos += 1;
            loop {
                name.type_arguments.push(self.parse_name()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some(')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("unterminated type argument list")),
                }
            }
        }
        Ok(name)
    }
}
