//! Dynamic runtime values.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::{SchemaError, XamlLanguage, XamlType};

/// A runtime value: a scalar, a type reference, or a shared object instance.
///
/// Objects are reference values: cloning a [`Value::Object`] clones the
/// handle, not the instance. Equality is deep.
#[derive(Clone, Default)]
pub enum Value {
    /// The null reference.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A 32-bit integer.
    Int32(i32),
    /// A 64-bit integer.
    Int64(i64),
    /// A double-precision float.
    Double(f64),
    /// A string.
    String(String),
    /// A reference to a type.
    Type(XamlType),
    /// A record, list or dictionary instance.
    Object(ObjectRef),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for [`Value::Object`].
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns true for booleans, numbers and strings.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int32(_) | Value::Int64(_) | Value::Double(_) | Value::String(_)
        )
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int32`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// The float payload, if this is a `Double`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The referenced type, if this is a type reference.
    pub fn as_type(&self) -> Option<&XamlType> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }

    /// The object handle, if this is an object.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The runtime type of this value.
    pub fn xaml_type(&self) -> XamlType {
        match self {
            Value::Null => XamlLanguage::null().clone(),
            Value::Bool(_) => XamlLanguage::boolean().clone(),
            Value::Int32(_) => XamlLanguage::int32().clone(),
            Value::Int64(_) => XamlLanguage::int64().clone(),
            Value::Double(_) => XamlLanguage::double().clone(),
            Value::String(_) => XamlLanguage::string().clone(),
            Value::Type(_) => XamlLanguage::type_reference().clone(),
            Value::Object(o) => o.xaml_type(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("(null)"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Double(v) if v.is_infinite() && *v > 0.0 => f.write_str("Infinity"),
            Value::Double(v) if v.is_infinite() => f.write_str("-Infinity"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::Type(t) => write!(f, "{t}"),
            Value::Object(o) => write!(f, "{}", o.xaml_type()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Int32(v) => f.debug_tuple("Int32").field(v).finish(),
            Value::Int64(v) => f.debug_tuple("Int64").field(v).finish(),
            Value::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Value::String(v) => f.debug_tuple("String").field(v).finish(),
            Value::Type(t) => f.debug_tuple("Type").field(t).finish(),
            Value::Object(o) => fmt::Debug::fmt(o, f),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<XamlType> for Value {
    fn from(v: XamlType) -> Self {
        Value::Type(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(ObjectRef::new(v))
    }
}

/// Shared, mutable handle to an [`Object`].
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Wrap an object in a new handle.
    pub fn new(object: Object) -> Self {
        Self(Rc::new(RefCell::new(object)))
    }

    /// Borrow the object.
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    /// Borrow the object mutably.
    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.0.borrow_mut()
    }

    /// True when both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The instance's type.
    pub fn xaml_type(&self) -> XamlType {
        self.0.borrow().ty().clone()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.borrow(), f)
    }
}

/// An object instance: its type plus its storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    ty: XamlType,
    data: ObjectData,
}

impl Object {
    /// Create an object of `ty` backed by `data`.
    pub fn new(ty: XamlType, data: ObjectData) -> Self {
        Self { ty, data }
    }

    /// The object's type.
    pub fn ty(&self) -> &XamlType {
        &self.ty
    }

    /// The object's storage.
    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    /// The object's storage, mutably.
    pub fn data_mut(&mut self) -> &mut ObjectData {
        &mut self.data
    }

    /// A record field, if this is a record and the field exists.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match &self.data {
            ObjectData::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Store a record field.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), SchemaError> {
        match &mut self.data {
            ObjectData::Record(fields) => {
                fields.insert(name.to_owned(), value);
                Ok(())
            }
            _ => Err(SchemaError::WrongInstance {
                expected: "record",
                ty: self.ty.to_string(),
            }),
        }
    }

    /// The list storage, if this is a list.
    pub fn as_list(&self) -> Option<&ListData> {
        match &self.data {
            ObjectData::List(list) => Some(list),
            _ => None,
        }
    }

    /// The list storage, mutably.
    pub fn as_list_mut(&mut self) -> Option<&mut ListData> {
        match &mut self.data {
            ObjectData::List(list) => Some(list),
            _ => None,
        }
    }

    /// The dictionary storage, if this is a dictionary.
    pub fn as_dictionary(&self) -> Option<&DictionaryData> {
        match &self.data {
            ObjectData::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// The dictionary storage, mutably.
    pub fn as_dictionary_mut(&mut self) -> Option<&mut DictionaryData> {
        match &mut self.data {
            ObjectData::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }
}

/// Storage behind an [`Object`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    /// Named fields in declaration order.
    Record(IndexMap<String, Value>),
    /// An ordered list.
    List(ListData),
    /// An insertion-ordered dictionary.
    Dictionary(DictionaryData),
}

/// Items of a list, plus its logical capacity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListData {
    items: Vec<Value>,
    capacity: usize,
}

impl ListData {
    /// An empty list with zero capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty list with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The items, in order.
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The logical capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an item, doubling the capacity (minimum 4) when full.
    pub fn push(&mut self, item: Value) {
        if self.items.len() == self.capacity {
            self.capacity = (self.capacity * 2).max(4);
        }
        self.items.push(item);
    }

    /// Set the capacity; it may not drop below the item count.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), SchemaError> {
        if capacity < self.items.len() {
            return Err(SchemaError::InvalidCapacity {
                capacity: i64::try_from(capacity).unwrap_or(i64::MAX),
                count: self.items.len(),
            });
        }
        self.items
            .reserve_exact(capacity.saturating_sub(self.items.len()));
        self.capacity = capacity;
        Ok(())
    }
}

/// Entries of a dictionary in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictionaryData {
    entries: Vec<(Value, Value)>,
}

impl DictionaryData {
    /// An empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// True when `key` is present.
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; returns the previous value under `key`.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// The entries in insertion order.
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_capacity_grows_by_doubling() {
        let mut list = ListData::new();
        assert_eq!(list.capacity(), 0);
        list.push(Value::Int32(1));
        assert_eq!(list.capacity(), 4);
        for i in 0..4 {
            list.push(Value::Int32(i));
        }
        assert_eq!(list.len(), 5);
        assert_eq!(list.capacity(), 8);
    }

    #[test]
    fn list_capacity_cannot_drop_below_count() {
        let mut list = ListData::with_capacity(3);
        list.push(Value::Int32(1));
        list.push(Value::Int32(2));
        assert_eq!(list.capacity(), 3);
        assert!(list.set_capacity(1).is_err());
        list.set_capacity(2).unwrap();
        assert_eq!(list.capacity(), 2);
    }

    #[test]
    fn dictionary_insert_replaces_in_place() {
        let mut dict = DictionaryData::new();
        assert_eq!(dict.insert("a".into(), 1.into()), None);
        assert_eq!(dict.insert("b".into(), 2.into()), None);
        assert_eq!(dict.insert("a".into(), 3.into()), Some(Value::Int32(1)));
        let keys: Vec<_> = dict.entries().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(dict.get(&"a".into()), Some(&Value::Int32(3)));
    }

    #[test]
    fn display_uses_invariant_forms() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Double(5.0).to_string(), "5");
        assert_eq!(Value::Double(0.25).to_string(), "0.25");
        assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Null.to_string(), "(null)");
    }

    #[test]
    fn runtime_types_of_scalars() {
        assert_eq!(Value::Int32(1).xaml_type(), *XamlLanguage::int32());
        assert_eq!(Value::from("x").xaml_type(), *XamlLanguage::string());
        assert_eq!(Value::Null.xaml_type(), *XamlLanguage::null());
    }
}
