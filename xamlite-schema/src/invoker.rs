//! Instance creation and member access.

use indexmap::IndexMap;

use crate::{
    DictionaryData, ListData, Object, ObjectData, ObjectRef, SchemaError, Value, XamlMember,
    XamlType,
};

/// Creates instances of a type and feeds collection items into them.
pub trait TypeInvoker: Send + Sync {
    /// Create an instance; `args` selects the constructor overload by count.
    fn create_instance(&self, ty: &XamlType, args: &[Value]) -> Result<Value, SchemaError>;

    /// Append `item` to a collection instance.
    fn add_to_collection(
        &self,
        ty: &XamlType,
        instance: &Value,
        item: Value,
    ) -> Result<(), SchemaError> {
        let _ = (instance, item);
        Err(SchemaError::WrongInstance {
            expected: "collection",
            ty: ty.to_string(),
        })
    }

    /// Store `item` under `key` in a dictionary instance.
    fn add_to_dictionary(
        &self,
        ty: &XamlType,
        instance: &Value,
        key: Value,
        item: Value,
        replace: bool,
    ) -> Result<(), SchemaError> {
        let _ = (instance, key, item, replace);
        Err(SchemaError::WrongInstance {
            expected: "dictionary",
            ty: ty.to_string(),
        })
    }
}

/// Reads and writes one member of an instance.
pub trait MemberInvoker: Send + Sync {
    /// Read the member.
    fn get(&self, member: &XamlMember, instance: &Value) -> Result<Value, SchemaError>;

    /// Write the member.
    fn set(&self, member: &XamlMember, instance: &Value, value: Value) -> Result<(), SchemaError>;
}

fn object_of<'v>(
    instance: &'v Value,
    expected: &'static str,
) -> Result<&'v ObjectRef, SchemaError> {
    instance.as_object().ok_or_else(|| SchemaError::WrongInstance {
        expected,
        ty: instance.xaml_type().to_string(),
    })
}

/// Creates records whose fields start at each member's default.
///
/// Constructor arguments are written into the fields named by the overload.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordInvoker;

impl TypeInvoker for RecordInvoker {
    fn create_instance(&self, ty: &XamlType, args: &[Value]) -> Result<Value, SchemaError> {
        let mut fields: IndexMap<String, Value> = ty
            .members()
            .iter()
            .map(|m| (m.name().to_owned(), m.default_value()))
            .collect();
        if args.is_empty() {
            if !ty.is_default_constructible() {
                return Err(SchemaError::NoDefaultConstructor { ty: ty.to_string() });
            }
        } else {
            let ctor = ty
                .constructors()
                .iter()
                .find(|ctor| ctor.len() == args.len())
                .ok_or_else(|| SchemaError::NoMatchingConstructor {
                    ty: ty.to_string(),
                    arity: args.len(),
                })?;
            for (param, arg) in ctor.iter().zip(args) {
                fields.insert(param.name().to_owned(), arg.clone());
            }
        }
        Ok(Object::new(ty.clone(), ObjectData::Record(fields)).into())
    }
}

/// Creates lists; the one-argument overload sets the capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListInvoker;

impl TypeInvoker for ListInvoker {
    fn create_instance(&self, ty: &XamlType, args: &[Value]) -> Result<Value, SchemaError> {
        let list = match args {
            [] => ListData::new(),
            [Value::Int32(capacity)] => {
                let capacity = usize::try_from(*capacity).map_err(|_| {
                    SchemaError::InvalidCapacity {
                        capacity: i64::from(*capacity),
                        count: 0,
                    }
                })?;
                ListData::with_capacity(capacity)
            }
            _ => {
                return Err(SchemaError::NoMatchingConstructor {
                    ty: ty.to_string(),
                    arity: args.len(),
                });
            }
        };
        Ok(Object::new(ty.clone(), ObjectData::List(list)).into())
    }

    fn add_to_collection(
        &self,
        ty: &XamlType,
        instance: &Value,
        item: Value,
    ) -> Result<(), SchemaError> {
        let mut object = object_of(instance, "list")?.borrow_mut();
        match object.as_list_mut() {
            Some(list) => {
                list.push(item);
                Ok(())
            }
            None => Err(SchemaError::WrongInstance {
                expected: "list",
                ty: ty.to_string(),
            }),
        }
    }
}

/// Creates insertion-ordered dictionaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryInvoker;

impl TypeInvoker for DictionaryInvoker {
    fn create_instance(&self, ty: &XamlType, args: &[Value]) -> Result<Value, SchemaError> {
        if !args.is_empty() {
            return Err(SchemaError::NoMatchingConstructor {
                ty: ty.to_string(),
                arity: args.len(),
            });
        }
        Ok(Object::new(ty.clone(), ObjectData::Dictionary(DictionaryData::new())).into())
    }

    fn add_to_dictionary(
        &self,
        ty: &XamlType,
        instance: &Value,
        key: Value,
        item: Value,
        replace: bool,
    ) -> Result<(), SchemaError> {
        let mut object = object_of(instance, "dictionary")?.borrow_mut();
        let dict = object
            .as_dictionary_mut()
            .ok_or_else(|| SchemaError::WrongInstance {
                expected: "dictionary",
                ty: ty.to_string(),
            })?;
        if !replace && dict.contains_key(&key) {
            return Err(SchemaError::DuplicateKey {
                key: key.to_string(),
            });
        }
        dict.insert(key, item);
        Ok(())
    }
}

/// Produces a fixed default for scalar types.
pub(crate) struct ScalarInvoker {
    pub(crate) default: Option<fn() -> Value>,
}

impl TypeInvoker for ScalarInvoker {
    fn create_instance(&self, ty: &XamlType, args: &[Value]) -> Result<Value, SchemaError> {
        match (self.default, args) {
            (Some(default), []) => Ok(default()),
            (None, []) => Err(SchemaError::NoDefaultConstructor { ty: ty.to_string() }),
            _ => Err(SchemaError::NoMatchingConstructor {
                ty: ty.to_string(),
                arity: args.len(),
            }),
        }
    }
}

/// Stores members in the record's fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMemberInvoker;

impl MemberInvoker for RecordMemberInvoker {
    fn get(&self, member: &XamlMember, instance: &Value) -> Result<Value, SchemaError> {
        let object = object_of(instance, "record")?.borrow();
        match object.data() {
            ObjectData::Record(fields) => {
                Ok(fields.get(member.name()).cloned().unwrap_or_default())
            }
            _ => Err(SchemaError::WrongInstance {
                expected: "record",
                ty: object.ty().to_string(),
            }),
        }
    }

    fn set(&self, member: &XamlMember, instance: &Value, value: Value) -> Result<(), SchemaError> {
        if member.is_read_only() {
            return Err(SchemaError::ReadOnlyMember {
                member: member.to_string(),
            });
        }
        object_of(instance, "record")?
            .borrow_mut()
            .set_field(member.name(), value)
    }
}

/// `List.Capacity`.
pub(crate) struct ListCapacityInvoker;

impl MemberInvoker for ListCapacityInvoker {
    fn get(&self, _member: &XamlMember, instance: &Value) -> Result<Value, SchemaError> {
        let object = object_of(instance, "list")?.borrow();
        let list = object.as_list().ok_or_else(|| SchemaError::WrongInstance {
            expected: "list",
            ty: object.ty().to_string(),
        })?;
        Ok(Value::Int32(i32::try_from(list.capacity()).unwrap_or(i32::MAX)))
    }

    fn set(&self, member: &XamlMember, instance: &Value, value: Value) -> Result<(), SchemaError> {
        let requested = value.as_i32().ok_or_else(|| SchemaError::Conversion {
            value: value.to_string(),
            target: member.ty().to_string(),
            reason: "capacity must be an Int32".to_owned(),
        })?;
        let mut object = object_of(instance, "list")?.borrow_mut();
        let ty = object.ty().to_string();
        let list = object
            .as_list_mut()
            .ok_or(SchemaError::WrongInstance { expected: "list", ty })?;
        let capacity = usize::try_from(requested).map_err(|_| SchemaError::InvalidCapacity {
            capacity: i64::from(requested),
            count: list.len(),
        })?;
        list.set_capacity(capacity)
    }
}

/// Directives have no storage on the instance.
pub(crate) struct DirectiveInvoker;

impl MemberInvoker for DirectiveInvoker {
    fn get(&self, member: &XamlMember, _instance: &Value) -> Result<Value, SchemaError> {
        Err(SchemaError::custom(format_args!(
            "directive {member} cannot be read from an instance"
        )))
    }

    fn set(
        &self,
        _member: &XamlMember,
        _instance: &Value,
        _value: Value,
    ) -> Result<(), SchemaError> {
        Ok(())
    }
}
