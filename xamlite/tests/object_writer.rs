//! Building object graphs from node streams.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{color, gauge, member, offset, pair_extension, point, scalar, schema, widget};
use xamlite::{
    DuplicateKeyPolicy, ErrorCategory, LineInfo, ObjectWriter, ObjectWriterSettings, Value,
    XamlError, XamlLanguage, XamlNode, XamlType, XamlWriter, load, transform,
};
use xamlite_testhelpers::IPanic;

fn start_member(member: &xamlite::XamlMember) -> XamlNode {
    XamlNode::StartMember(member.clone())
}

fn load_with(settings: ObjectWriterSettings, nodes: Vec<XamlNode>) -> Result<Value, XamlError> {
    let schema = schema();
    let mut writer = ObjectWriter::with_settings(&schema, settings);
    transform(nodes, &mut writer)?;
    writer.close()?;
    Ok(writer.into_result().unwrap_or_default())
}

fn field(value: &Value, name: &str) -> Value {
    value
        .as_object()
        .and_then(|o| o.borrow().field(name).cloned())
        .unwrap_or_else(|| panic!("no field {name} on {value:?}"))
}

#[test]
fn list_with_capacity_and_one_item() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let list = XamlType::list_of(XamlLanguage::int32());
    let mut nodes = vec![
        XamlNode::StartObject(list.clone()),
        start_member(&member(&list, "Capacity")),
        XamlNode::Value("3".into()),
        XamlNode::EndMember,
        start_member(XamlLanguage::items()),
    ];
    nodes.extend(scalar(XamlLanguage::int32(), "5"));
    nodes.extend([XamlNode::EndMember, XamlNode::EndObject]);

    let value = load(&schema(), nodes)?;
    let object = value.as_object().expect("a list");
    let object = object.borrow();
    let items = object.as_list().expect("list storage");
    assert_eq!(items.capacity(), 3);
    assert_eq!(items.items(), [Value::Int32(5)]);
    Ok(())
}

#[test]
fn dictionary_of_string_to_double() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let dict = XamlType::dictionary_of(XamlLanguage::string(), XamlLanguage::double());
    let nodes = vec![
        XamlNode::StartObject(dict),
        start_member(XamlLanguage::items()),
        XamlNode::StartObject(XamlLanguage::double().clone()),
        start_member(XamlLanguage::key()),
        XamlNode::Value("Foo".into()),
        XamlNode::EndMember,
        start_member(XamlLanguage::initialization()),
        XamlNode::Value("5".into()),
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];

    let value = load(&schema(), nodes)?;
    let object = value.as_object().expect("a dictionary");
    let object = object.borrow();
    let entries = object.as_dictionary().expect("dictionary storage");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries.get(&"Foo".into()), Some(&Value::Double(5.0)));
    Ok(())
}

fn keyed_double(key: &str, text: &str) -> Vec<XamlNode> {
    vec![
        XamlNode::StartObject(XamlLanguage::double().clone()),
        start_member(XamlLanguage::key()),
        XamlNode::Value(key.into()),
        XamlNode::EndMember,
        start_member(XamlLanguage::initialization()),
        XamlNode::Value(text.into()),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ]
}

fn dictionary_with(items: Vec<Vec<XamlNode>>) -> Vec<XamlNode> {
    let dict = XamlType::dictionary_of(XamlLanguage::string(), XamlLanguage::double());
    let mut nodes = vec![
        XamlNode::StartObject(dict),
        start_member(XamlLanguage::items()),
    ];
    nodes.extend(items.into_iter().flatten());
    nodes.extend([XamlNode::EndMember, XamlNode::EndObject]);
    nodes
}

#[test]
fn duplicate_dictionary_keys_follow_the_policy() {
    xamlite_testhelpers::setup();
    let nodes = dictionary_with(vec![keyed_double("a", "1"), keyed_double("a", "2")]);

    let err = load(&schema(), nodes.clone()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(
        err.to_string(),
        "key 'a' is already present in Dictionary(String, Double)"
    );

    let value = load_with(
        ObjectWriterSettings::new().duplicate_keys(DuplicateKeyPolicy::Overwrite),
        nodes,
    )
    .unwrap();
    let object = value.as_object().unwrap().borrow();
    let entries = object.as_dictionary().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries.get(&"a".into()), Some(&Value::Double(2.0)));
}

#[test]
fn dictionary_items_need_a_key() {
    xamlite_testhelpers::setup();
    let nodes = dictionary_with(vec![scalar(XamlLanguage::double(), "1")]);
    let err = load(&schema(), nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(miette::Diagnostic::code(&err).unwrap().to_string(), "xaml::missing_key");
}

#[test]
fn writing_a_member_twice_is_structural_even_with_equal_values() {
    xamlite_testhelpers::setup();
    let widget = widget();
    let name = member(&widget, "Name");
    let nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&name),
        XamlNode::Value("a".into()),
        XamlNode::EndMember,
        start_member(&name),
        XamlNode::Value("a".into()),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let err = load(&schema(), nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(err.to_string(), "member Widget.Name is already set on Widget");
}

#[test]
fn two_values_in_a_plain_member_are_rejected() {
    xamlite_testhelpers::setup();
    let widget = widget();
    let mut nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Origin")),
    ];
    nodes.extend([
        XamlNode::StartObject(offset()),
        XamlNode::EndObject,
        XamlNode::StartObject(offset()),
    ]);
    let err = load(&schema(), nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
}

#[test]
fn null_becomes_a_default_instance_unless_declared_null() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let widget = widget();
    let origin = member(&widget, "Origin");

    let nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&origin),
        XamlNode::Value(Value::Null),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let value = load(&schema(), nodes)?;
    let created = field(&value, "Origin");
    assert_eq!(created.xaml_type(), offset());
    assert_eq!(field(&created, "X"), Value::Double(0.0));

    let nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&origin),
        XamlNode::StartObject(XamlLanguage::null().clone()),
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let value = load(&schema(), nodes)?;
    assert_eq!(field(&value, "Origin"), Value::Null);
    Ok(())
}

fn point_with(arguments: &[&str]) -> Vec<XamlNode> {
    let mut nodes = vec![
        XamlNode::StartObject(point()),
        start_member(XamlLanguage::arguments()),
    ];
    for text in arguments {
        nodes.extend(scalar(XamlLanguage::int32(), text));
    }
    nodes.extend([XamlNode::EndMember, XamlNode::EndObject]);
    nodes
}

#[test]
fn constructor_arguments_must_match_the_declared_arity() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let value = load(&schema(), point_with(&["1", "2"]))?;
    assert_eq!(field(&value, "X"), Value::Int32(1));
    assert_eq!(field(&value, "Y"), Value::Int32(2));

    for arguments in [&["1"][..], &["1", "2", "3"][..]] {
        let err = load(&schema(), point_with(arguments)).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Construction, "{err}");
    }
    Ok(())
}

#[test]
fn objects_needing_arguments_fail_without_them() {
    xamlite_testhelpers::setup();
    let nodes = vec![XamlNode::StartObject(point()), XamlNode::EndObject];
    let err = load(&schema(), nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Construction);
    assert!(err.to_string().starts_with("failed to create an instance of Point"));
}

#[test]
fn positional_parameters_build_markup_extensions() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let widget = widget();
    let nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Name")),
        XamlNode::StartObject(pair_extension()),
        start_member(XamlLanguage::positional_parameters()),
        XamlNode::Value("left".into()),
        XamlNode::Value("right".into()),
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let value = load(&schema(), nodes)?;
    assert_eq!(field(&value, "Name"), Value::from("left|right"));
    Ok(())
}

#[test]
fn type_extension_resolves_prefixed_names() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let widget = widget();
    let nodes = vec![
        XamlNode::NamespaceDeclaration(xamlite::NamespaceDeclaration::new(
            "x",
            xamlite::schema::XAML_NAMESPACE,
        )),
        XamlNode::NamespaceDeclaration(xamlite::NamespaceDeclaration::new("t", common::NS)),
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Kind")),
        XamlNode::StartObject(XamlLanguage::type_extension().clone()),
        start_member(XamlLanguage::positional_parameters()),
        XamlNode::Value("t:Point".into()),
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let value = load(&schema(), nodes)?;
    assert_eq!(field(&value, "Kind"), Value::Type(point()));
    Ok(())
}

fn color_nodes(method: &str, arguments: &[&str]) -> Vec<XamlNode> {
    let mut nodes = vec![
        XamlNode::StartObject(color()),
        start_member(XamlLanguage::factory_method()),
        XamlNode::Value(method.into()),
        XamlNode::EndMember,
    ];
    if !arguments.is_empty() {
        nodes.push(start_member(XamlLanguage::arguments()));
        for text in arguments {
            nodes.extend(scalar(XamlLanguage::int32(), text));
        }
        nodes.push(XamlNode::EndMember);
    }
    nodes.push(XamlNode::EndObject);
    nodes
}

#[test]
fn factory_methods_create_instances() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let value = load(&schema(), color_nodes("FromRgb", &["1", "2", "3"]))?;
    assert_eq!(field(&value, "R"), Value::Int32(1));
    assert_eq!(field(&value, "B"), Value::Int32(3));

    let value = load(&schema(), color_nodes("Black", &[]))?;
    assert_eq!(field(&value, "G"), Value::Int32(0));

    let err = load(&schema(), color_nodes("FromRgb", &["1"])).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Construction);
    assert_eq!(
        err.to_string(),
        "Color has no factory method FromRgb taking 1 argument(s)"
    );
    Ok(())
}

#[test]
fn factory_method_name_must_be_a_single_string() {
    xamlite_testhelpers::setup();
    let nodes = vec![
        XamlNode::StartObject(color()),
        start_member(XamlLanguage::factory_method()),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let err = load(&schema(), nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(
        err.to_string(),
        "x:FactoryMethod must hold one string, found nothing"
    );
}

#[test]
fn arguments_replace_an_eagerly_created_list() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let list = XamlType::list_of(XamlLanguage::int32());
    let mut nodes = vec![
        XamlNode::StartObject(list),
        start_member(XamlLanguage::arguments()),
    ];
    nodes.extend(scalar(XamlLanguage::int32(), "3"));
    nodes.extend([XamlNode::EndMember, XamlNode::EndObject]);

    let value = load(&schema(), nodes)?;
    let object = value.as_object().expect("a list");
    let object = object.borrow();
    let items = object.as_list().expect("list storage");
    assert_eq!(items.capacity(), 3);
    assert!(items.is_empty());
    Ok(())
}

fn gauge_nodes(level: Option<&str>) -> Vec<XamlNode> {
    let gauge = gauge();
    let mut nodes = vec![XamlNode::StartObject(gauge.clone())];
    if let Some(text) = level {
        nodes.extend([
            start_member(&member(&gauge, "Level")),
            XamlNode::Value(text.into()),
            XamlNode::EndMember,
        ]);
    }
    nodes.extend([
        start_member(XamlLanguage::factory_method()),
        XamlNode::Value("Of".into()),
        XamlNode::EndMember,
        start_member(XamlLanguage::arguments()),
    ]);
    nodes.extend(scalar(XamlLanguage::int32(), "7"));
    nodes.extend([XamlNode::EndMember, XamlNode::EndObject]);
    nodes
}

#[test]
fn factory_methods_replace_a_default_instance() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let value = load(&schema(), gauge_nodes(None))?;
    assert_eq!(value.xaml_type(), gauge());
    assert_eq!(field(&value, "Level"), Value::Int32(7));

    let err = load(&schema(), gauge_nodes(Some("1"))).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(
        err.to_string(),
        "x:FactoryMethod must precede the members of Gauge"
    );
    Ok(())
}

#[test]
fn set_value_hook_owns_assignment() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let settings = ObjectWriterSettings::new().on_set_value(move |event| {
        sink.borrow_mut()
            .push((event.member.name().to_owned(), event.value.clone()));
    });

    let widget = widget();
    let nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Size")),
        XamlNode::Value("2.5".into()),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let value = load_with(settings, nodes)?;
    assert_eq!(field(&value, "Size"), Value::Double(0.0));
    assert_eq!(*seen.borrow(), [("Size".to_owned(), Value::Double(2.5))]);
    Ok(())
}

#[test]
fn root_object_is_populated_in_place() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let widget = widget();
    let existing = widget.create_instance(&[])?;
    let nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Name")),
        XamlNode::Value("reused".into()),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let value = load_with(ObjectWriterSettings::new().root_object(existing.clone()), nodes)?;
    assert!(value.as_object().unwrap().ptr_eq(existing.as_object().unwrap()));
    assert_eq!(field(&existing, "Name"), Value::from("reused"));
    Ok(())
}

#[test]
fn get_object_populates_read_only_collections() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let widget = widget();
    let mut nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Tags")),
        XamlNode::GetObject,
        start_member(XamlLanguage::items()),
    ];
    nodes.extend(scalar(XamlLanguage::string(), "red"));
    nodes.extend(scalar(XamlLanguage::string(), "blue"));
    nodes.extend([
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::EndObject,
    ]);

    let value = load(&schema(), nodes)?;
    let tags = field(&value, "Tags");
    let tags = tags.as_object().unwrap().borrow();
    assert_eq!(
        tags.as_list().unwrap().items(),
        [Value::from("red"), Value::from("blue")]
    );
    Ok(())
}

#[test]
fn get_object_on_a_null_member_fails() {
    xamlite_testhelpers::setup();
    let widget = widget();
    let nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Children")),
        XamlNode::GetObject,
    ];
    let err = load(&schema(), nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(
        err.to_string(),
        "cannot populate Widget.Children: its current value is null"
    );
}

#[test]
fn collection_members_collect_several_values() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let widget = widget();
    let mut nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Children")),
    ];
    nodes.extend(scalar(XamlLanguage::int32(), "1"));
    nodes.push(XamlNode::Value("two".into()));
    nodes.extend([XamlNode::EndMember, XamlNode::EndObject]);

    let value = load(&schema(), nodes)?;
    let children = field(&value, "Children");
    let children = children.as_object().unwrap().borrow();
    assert_eq!(
        children.as_list().unwrap().items(),
        [Value::Int32(1), Value::from("two")]
    );
    Ok(())
}

#[test]
fn unconvertible_text_is_a_coercion_error() {
    xamlite_testhelpers::setup();
    let widget = widget();
    let nodes = vec![
        XamlNode::StartObject(widget.clone()),
        start_member(&member(&widget, "Size")),
        XamlNode::Value("big".into()),
    ];
    let err = load(&schema(), nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Coercion);
    assert!(
        err.to_string()
            .starts_with("could not convert 'big' (of type String) to Double"),
        "{err}"
    );
}

#[test]
fn errors_carry_the_reported_position() {
    xamlite_testhelpers::setup();
    let schema = schema();
    let mut writer = ObjectWriter::new(&schema);
    writer.set_line_info(4, 2);
    let err = writer
        .write_start_member(XamlLanguage::items())
        .unwrap_err();
    assert_eq!(err.line_info(), Some(LineInfo { line: 4, column: 2 }));
    assert_eq!(
        err.to_string(),
        "StartMember is not allowed in state Initial (line 4, position 2)"
    );
}

#[test]
fn forced_close_finishes_the_graph() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let schema = schema();
    let list = XamlType::list_of(XamlLanguage::int32());
    let mut writer = ObjectWriter::new(&schema);
    writer.write_start_object(&list)?;
    writer.write_start_member(XamlLanguage::items())?;
    writer.write_start_object(XamlLanguage::int32())?;
    writer.write_start_member(XamlLanguage::initialization())?;
    writer.write_value("7".into())?;
    assert!(writer.result().is_none());

    writer.close()?;
    let value = writer.take_result().expect("closed root");
    let object = value.as_object().unwrap().borrow();
    assert_eq!(object.as_list().unwrap().items(), [Value::Int32(7)]);
    Ok(())
}

#[test]
fn close_after_a_rejected_event_keeps_accepted_content() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let schema = schema();
    let widget = widget();
    let mut writer = ObjectWriter::new(&schema);
    writer.write_start_object(&widget)?;
    writer.write_start_member(&member(&widget, "Origin"))?;
    writer.write_start_object(&offset())?;
    writer.write_end_object()?;
    let err = writer.write_start_object(&offset()).unwrap_err();
    assert_eq!(err.to_string(), "member Widget.Origin is already set on Widget");
    writer.write_end_member()?;

    writer.write_start_member(&member(&widget, "Size"))?;
    let err = writer.write_value("wide".into()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Coercion);

    writer.close()?;
    let value = writer.take_result().expect("closed root");
    assert_eq!(field(&value, "Origin").xaml_type(), offset());
    assert_eq!(field(&value, "Size"), Value::Double(0.0));
    Ok(())
}

#[test]
fn an_empty_stream_has_no_result() {
    xamlite_testhelpers::setup();
    let err = load(&schema(), Vec::new()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedGraph);
}

#[test]
fn namespaces_cannot_follow_an_object_start() {
    xamlite_testhelpers::setup();
    let nodes = vec![
        XamlNode::StartObject(offset()),
        XamlNode::NamespaceDeclaration(xamlite::NamespaceDeclaration::new("t", common::NS)),
    ];
    let err = load(&schema(), nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
}
