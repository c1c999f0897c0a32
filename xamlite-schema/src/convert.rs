//! Converters, serializers and markup extensions.

use crate::{ObjectRef, SchemaError, Value, ValueContext, XamlLanguage, XamlType};

/// Converts values of other types, typically text, into the owning type.
pub trait TypeConverter: Send + Sync {
    /// True when values of `source` can be converted.
    fn can_convert_from(&self, source: &XamlType) -> bool;

    /// Convert `value`.
    fn convert_from(&self, ctx: &dyn ValueContext, value: &Value) -> Result<Value, SchemaError>;
}

/// Turns values into text for attribute and element content.
pub trait ValueSerializer: Send + Sync {
    /// True when `value` has a text form.
    fn can_convert_to_string(&self, value: &Value) -> bool {
        !value.is_object()
    }

    /// The text form of `value`.
    fn convert_to_string(&self, ctx: &dyn ValueContext, value: &Value)
    -> Result<String, SchemaError>;
}

/// An object that stands in for the value it provides.
pub trait MarkupExtension: Send + Sync {
    /// Produce the value the extension instance describes.
    fn provide_value(
        &self,
        instance: &ObjectRef,
        ctx: &dyn ValueContext,
    ) -> Result<Value, SchemaError>;
}

impl<F> MarkupExtension for F
where
    F: Fn(&ObjectRef, &dyn ValueContext) -> Result<Value, SchemaError> + Send + Sync,
{
    fn provide_value(
        &self,
        instance: &ObjectRef,
        ctx: &dyn ValueContext,
    ) -> Result<Value, SchemaError> {
        self(instance, ctx)
    }
}

fn conversion_error(value: &Value, target: &str, reason: impl ToString) -> SchemaError {
    SchemaError::Conversion {
        value: value.to_string(),
        target: target.to_owned(),
        reason: reason.to_string(),
    }
}

/// Text and numeric-widening conversions for the built-in scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarConverter {
    String,
    Boolean,
    Int32,
    Int64,
    Double,
}

impl ScalarConverter {
    fn target(self) -> &'static str {
        match self {
            ScalarConverter::String => "String",
            ScalarConverter::Boolean => "Boolean",
            ScalarConverter::Int32 => "Int32",
            ScalarConverter::Int64 => "Int64",
            ScalarConverter::Double => "Double",
        }
    }
}

impl TypeConverter for ScalarConverter {
    fn can_convert_from(&self, source: &XamlType) -> bool {
        if source == XamlLanguage::string() {
            return true;
        }
        let numeric = source == XamlLanguage::int32()
            || source == XamlLanguage::int64()
            || source == XamlLanguage::double();
        numeric
            && matches!(
                self,
                ScalarConverter::Int32 | ScalarConverter::Int64 | ScalarConverter::Double
            )
    }

    fn convert_from(&self, _ctx: &dyn ValueContext, value: &Value) -> Result<Value, SchemaError> {
        let target = self.target();
        match (self, value) {
            (ScalarConverter::String, Value::String(s)) => Ok(Value::String(s.clone())),
            (ScalarConverter::Boolean, Value::String(s)) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(conversion_error(value, target, "expected True or False"))
                }
            }
            (ScalarConverter::Int32, Value::String(s)) => s
                .trim()
                .parse::<i32>()
                .map(Value::Int32)
                .map_err(|e| conversion_error(value, target, e)),
            (ScalarConverter::Int32, Value::Int64(v)) => i32::try_from(*v)
                .map(Value::Int32)
                .map_err(|e| conversion_error(value, target, e)),
            (ScalarConverter::Int32, Value::Double(v)) => {
                if v.fract() == 0.0 && *v >= f64::from(i32::MIN) && *v <= f64::from(i32::MAX) {
                    Ok(Value::Int32(*v as i32))
                } else {
                    Err(conversion_error(value, target, "not an integral Int32"))
                }
            }
            (ScalarConverter::Int64, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int64)
                .map_err(|e| conversion_error(value, target, e)),
            (ScalarConverter::Int64, Value::Int32(v)) => Ok(Value::Int64(i64::from(*v))),
            (ScalarConverter::Int64, Value::Double(v)) => {
                if v.fract() == 0.0 && v.is_finite() {
                    Ok(Value::Int64(*v as i64))
                } else {
                    Err(conversion_error(value, target, "not an integral Int64"))
                }
            }
            (ScalarConverter::Double, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| conversion_error(value, target, e)),
            (ScalarConverter::Double, Value::Int32(v)) => Ok(Value::Double(f64::from(*v))),
            (ScalarConverter::Double, Value::Int64(v)) => Ok(Value::Double(*v as f64)),
            _ => Err(conversion_error(value, target, "unsupported source type")),
        }
    }
}

/// Invariant text form of booleans, numbers and strings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScalarSerializer;

impl ValueSerializer for ScalarSerializer {
    fn can_convert_to_string(&self, value: &Value) -> bool {
        value.is_scalar()
    }

    fn convert_to_string(
        &self,
        _ctx: &dyn ValueContext,
        value: &Value,
    ) -> Result<String, SchemaError> {
        if value.is_scalar() {
            Ok(value.to_string())
        } else {
            Err(conversion_error(value, "String", "not a scalar value"))
        }
    }
}

/// Resolves qualified type names against the namespaces in scope.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TypeNameConverter;

impl TypeConverter for TypeNameConverter {
    fn can_convert_from(&self, source: &XamlType) -> bool {
        source == XamlLanguage::string()
    }

    fn convert_from(&self, ctx: &dyn ValueContext, value: &Value) -> Result<Value, SchemaError> {
        match value {
            Value::String(name) => ctx.resolve_type(name).map(Value::Type),
            _ => Err(conversion_error(value, "Type", "expected a type name")),
        }
    }
}

/// Writes type references as prefixed names.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TypeNameSerializer;

impl ValueSerializer for TypeNameSerializer {
    fn can_convert_to_string(&self, value: &Value) -> bool {
        matches!(value, Value::Type(_))
    }

    fn convert_to_string(
        &self,
        ctx: &dyn ValueContext,
        value: &Value,
    ) -> Result<String, SchemaError> {
        match value {
            Value::Type(ty) => ctx.qualified_name(ty),
            _ => Err(conversion_error(value, "String", "not a type reference")),
        }
    }
}

/// `x:Null` provides the null reference.
pub(crate) struct NullExtension;

impl MarkupExtension for NullExtension {
    fn provide_value(&self, _: &ObjectRef, _: &dyn ValueContext) -> Result<Value, SchemaError> {
        Ok(Value::Null)
    }
}

/// `x:Type` resolves its `TypeName` member.
pub(crate) struct TypeExtension;

impl MarkupExtension for TypeExtension {
    fn provide_value(
        &self,
        instance: &ObjectRef,
        ctx: &dyn ValueContext,
    ) -> Result<Value, SchemaError> {
        let name = instance
            .borrow()
            .field("TypeName")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| SchemaError::MissingValue {
                member: "TypeName".to_owned(),
                ty: "x:Type".to_owned(),
            })?;
        ctx.resolve_type(&name).map(Value::Type)
    }
}
