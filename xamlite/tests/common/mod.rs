#![allow(dead_code)]

use xamlite::schema::{ObjectRef, SchemaError, ValueContext, XamlTypeBuilder};
use xamlite::{SchemaContext, Value, XamlLanguage, XamlNode, XamlType};

pub const NS: &str = "urn:xamlite:tests";

/// Default-constructible record with two doubles.
pub fn offset() -> XamlType {
    XamlTypeBuilder::new(NS, "Offset")
        .member("X", XamlLanguage::double())
        .member("Y", XamlLanguage::double())
        .build()
}

/// Record that can only be built from its two constructor arguments.
pub fn point() -> XamlType {
    let int32 = XamlLanguage::int32();
    XamlTypeBuilder::new(NS, "Point")
        .member("X", int32)
        .member("Y", int32)
        .constructor_arguments([("X", int32.clone()), ("Y", int32.clone())])
        .no_default_constructor()
        .build()
}

/// Record created through static factory methods only.
pub fn color() -> XamlType {
    let int32 = XamlLanguage::int32();
    XamlTypeBuilder::new(NS, "Color")
        .member("R", int32)
        .member("G", int32)
        .member("B", int32)
        .constructor([("R", int32.clone()), ("G", int32.clone()), ("B", int32.clone())])
        .no_default_constructor()
        .factory_method("FromRgb", [int32.clone(), int32.clone(), int32.clone()], |args| {
            color().create_instance(args)
        })
        .factory_method("Black", Vec::new(), |_| {
            color().create_instance(&[Value::Int32(0), Value::Int32(0), Value::Int32(0)])
        })
        .build()
}

/// Default-constructible record that also has a factory method.
pub fn gauge() -> XamlType {
    let int32 = XamlLanguage::int32();
    XamlTypeBuilder::new(NS, "Gauge")
        .member("Level", int32)
        .factory_method("Of", [int32.clone()], |args| {
            let gauge = gauge();
            let instance = gauge.create_instance(&[])?;
            if let Some(level) = gauge.member("Level") {
                level.set(&instance, args[0].clone())?;
            }
            Ok(instance)
        })
        .build()
}

fn provide_pair(instance: &ObjectRef, _ctx: &dyn ValueContext) -> Result<Value, SchemaError> {
    let object = instance.borrow();
    let first = object.field("First").cloned().unwrap_or_default();
    let second = object.field("Second").cloned().unwrap_or_default();
    Ok(Value::String(format!("{first}|{second}")))
}

/// Markup extension with two positional parameters, providing `"first|second"`.
pub fn pair_extension() -> XamlType {
    let string = XamlLanguage::string();
    XamlTypeBuilder::new(NS, "PairExtension")
        .member("First", string)
        .member("Second", string)
        .constructor_arguments([("First", string.clone()), ("Second", string.clone())])
        .markup_extension(Some(string), provide_pair)
        .build()
}

/// Record exercising every member flavor.
pub fn widget() -> XamlType {
    XamlTypeBuilder::new(NS, "Widget")
        .member("Name", XamlLanguage::string())
        .member("Size", XamlLanguage::double())
        .member("Origin", &offset())
        .read_only_member("Tags", &XamlType::list_of(XamlLanguage::string()))
        .member("Children", &XamlType::list_of(XamlLanguage::object()))
        .member("Kind", XamlLanguage::type_reference())
        .member("Content", XamlLanguage::object())
        .content_property("Content")
        .build()
}

pub fn schema() -> SchemaContext {
    let mut schema = SchemaContext::new()
        .with_type(offset())
        .with_type(point())
        .with_type(color())
        .with_type(gauge())
        .with_type(pair_extension())
        .with_type(widget());
    schema.register_prefix(NS, "t");
    schema
}

pub fn member(ty: &XamlType, name: &str) -> xamlite::XamlMember {
    ty.member(name)
        .unwrap_or_else(|| panic!("{ty} has no member {name}"))
        .clone()
}

/// `StartObject(ty) → _Initialization → Value(text) → EndObject`.
pub fn scalar(ty: &XamlType, text: &str) -> Vec<XamlNode> {
    vec![
        XamlNode::StartObject(ty.clone()),
        XamlNode::StartMember(XamlLanguage::initialization().clone()),
        XamlNode::Value(text.into()),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ]
}

/// One node per line, as displayed.
pub fn dump<'a>(nodes: impl IntoIterator<Item = &'a XamlNode>) -> String {
    nodes
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
