//! Making values conform to declared types.

use xamlite_schema::{Value, ValueContext, XamlLanguage, XamlType};

use crate::XamlError;
use crate::tracing_macros::trace;

/// Converts values to declared types.
///
/// In order: null becomes a default instance (or stays null for `x:Null`),
/// text becomes a type reference where one is declared, markup extensions
/// are replaced by the value they provide, assignable values pass through,
/// and anything else goes through the declared type's converter.
#[derive(Clone, Copy)]
pub struct Coercer<'a> {
    ctx: &'a dyn ValueContext,
}

impl<'a> Coercer<'a> {
    /// A coercer resolving names and running converters in `ctx`.
    pub fn new(ctx: &'a dyn ValueContext) -> Self {
        Self { ctx }
    }

    /// Convert `value` to `ty`.
    pub fn coerce(&self, ty: &XamlType, value: Value) -> Result<Value, XamlError> {
        let original = value.clone();
        self.coerce_inner(ty, value)
            .map_err(|reason| XamlError::coercion(&original, ty, reason))
    }

    fn coerce_inner(&self, ty: &XamlType, value: Value) -> Result<Value, Option<String>> {
        if value.is_null() {
            if ty == XamlLanguage::null() {
                return Ok(Value::Null);
            }
            trace!(%ty, "null coerced to a default instance");
            return ty.create_instance(&[]).map_err(|e| Some(e.to_string()));
        }

        let mut value = value;
        if is_type_reference(ty) {
            if let Value::String(name) = &value {
                let resolved = self
                    .ctx
                    .resolve_type(name)
                    .map_err(|e| Some(e.to_string()))?;
                value = Value::Type(resolved);
            }
        }

        if let Some(instance) = value.as_object().cloned() {
            let runtime = instance.xaml_type();
            if runtime.is_markup_extension() {
                trace!(extension = %runtime, "providing value");
                value = runtime
                    .provide_value(&instance, self.ctx)
                    .map_err(|e| Some(e.to_string()))?;
            }
        }

        if is_allowed(ty, &value) {
            return Ok(value);
        }

        if let Some(converter) = ty.type_converter() {
            if converter.can_convert_from(&value.xaml_type()) {
                return converter
                    .convert_from(self.ctx, &value)
                    .map_err(|e| Some(e.to_string()));
            }
        }
        Err(None)
    }
}

fn is_type_reference(ty: &XamlType) -> bool {
    ty == XamlLanguage::type_extension() || ty == XamlLanguage::type_reference()
}

/// True when `value` may be stored where `ty` is declared without conversion.
pub(crate) fn is_allowed(ty: &XamlType, value: &Value) -> bool {
    if value.is_null() {
        if ty == XamlLanguage::null() {
            return true;
        }
    } else if ty.is_assignable_from(&value.xaml_type()) {
        return true;
    }
    ty.is_markup_extension()
        && ty
            .markup_extension_return_type()
            .is_none_or(|ret| is_allowed(ret, value))
}
