//! Markup output for node streams and object graphs.

use std::io::Cursor;

use indoc::indoc;
use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use xamlite::schema::{
    COLLECTIONS_NAMESPACE, ObjectRef, SchemaError, ValueContext, XAML_NAMESPACE, XamlTypeBuilder,
};
use xamlite::{
    ErrorCategory, NamespaceDeclaration, SchemaContext, Value, XamlLanguage, XamlMember,
    XamlNode, XamlType, XamlWriter,
};
use xamlite_testhelpers::IPanic;
use xamlite_xml::{
    XmlTextSink, XmlWriteError, XmlWriter, XmlWriterSettings, save, save_with_settings, to_string,
};

const NS: &str = "urn:xamlite:xml-tests";

fn offset() -> XamlType {
    XamlTypeBuilder::new(NS, "Offset")
        .member("X", XamlLanguage::double())
        .member("Y", XamlLanguage::double())
        .build()
}

fn provide_pair(instance: &ObjectRef, _ctx: &dyn ValueContext) -> Result<Value, SchemaError> {
    let object = instance.borrow();
    let first = object.field("First").cloned().unwrap_or_default();
    let second = object.field("Second").cloned().unwrap_or_default();
    Ok(Value::String(format!("{first}|{second}")))
}

fn pair() -> XamlType {
    let string = XamlLanguage::string();
    XamlTypeBuilder::new(NS, "PairExtension")
        .member("First", string)
        .member("Second", string)
        .constructor_arguments([("First", string.clone()), ("Second", string.clone())])
        .markup_extension(Some(string), provide_pair)
        .build()
}

fn card() -> XamlType {
    XamlTypeBuilder::new(NS, "Card")
        .member("Title", XamlLanguage::string())
        .member("Origin", &offset())
        .member("Label", XamlLanguage::string())
        .read_only_member("Tags", &XamlType::list_of(XamlLanguage::string()))
        .member("Kind", XamlLanguage::type_reference())
        .member("Body", XamlLanguage::object())
        .content_property("Body")
        .build()
}

fn schema() -> SchemaContext {
    SchemaContext::new()
        .with_type(offset())
        .with_type(pair())
        .with_type(card())
}

fn member(ty: &XamlType, name: &str) -> XamlMember {
    ty.member(name)
        .unwrap_or_else(|| panic!("{ty} has no member {name}"))
        .clone()
}

fn ns(prefix: &str, namespace: &str) -> XamlNode {
    XamlNode::NamespaceDeclaration(NamespaceDeclaration::new(prefix, namespace))
}

fn text(value: &str) -> XamlNode {
    XamlNode::Value(value.into())
}

/// `StartObject(ty) → _Initialization → Value(text) → EndObject`.
fn scalar(ty: &XamlType, value: &str) -> Vec<XamlNode> {
    vec![
        XamlNode::StartObject(ty.clone()),
        XamlNode::StartMember(XamlLanguage::initialization().clone()),
        text(value),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ]
}

/// Parse `xml`, failing on malformed markup or undeclared prefixes.
fn assert_well_formed(xml: &str) {
    let mut reader = NsReader::from_reader(Cursor::new(xml.as_bytes()));
    let mut buf = Vec::new();
    let mut depth = 0usize;
    loop {
        buf.clear();
        let (resolve, event) = reader
            .read_resolved_event_into(&mut buf)
            .unwrap_or_else(|e| panic!("{e} in {xml}"));
        assert!(
            !matches!(resolve, ResolveResult::Unknown(_)),
            "undeclared element prefix in {xml}"
        );
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
                for attr in e.attributes() {
                    let attr = attr.unwrap_or_else(|e| panic!("{e} in {xml}"));
                    let (resolve, _) = reader.resolver().resolve_attribute(attr.key);
                    assert!(
                        !matches!(resolve, ResolveResult::Unknown(_)),
                        "undeclared attribute prefix in {xml}"
                    );
                }
            }
            Event::End(_) => depth -= 1,
            Event::Eof => break,
            _ => {}
        }
    }
    assert_eq!(depth, 0, "{xml}");
}

fn xaml_category<E>(err: &XmlWriteError<E>) -> ErrorCategory {
    err.as_xaml()
        .map(|e| e.category())
        .unwrap_or_else(|| panic!("not a stream error"))
}

#[test]
fn list_with_capacity_and_item() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let list = XamlType::list_of(XamlLanguage::int32());
    let mut nodes = vec![
        ns("", COLLECTIONS_NAMESPACE),
        ns("x", XAML_NAMESPACE),
        XamlNode::StartObject(list.clone()),
        XamlNode::StartMember(member(&list, "Capacity")),
        text("3"),
        XamlNode::EndMember,
        XamlNode::StartMember(XamlLanguage::items().clone()),
    ];
    nodes.extend(scalar(XamlLanguage::int32(), "5"));
    nodes.extend([XamlNode::EndMember, XamlNode::EndObject]);

    let xml = to_string(&schema(), nodes)?;
    insta::assert_snapshot!(xml, @r#"<List x:TypeArguments="x:Int32" Capacity="3" xmlns="clr-namespace:System.Collections.Generic;assembly=mscorlib" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"><x:Int32>5</x:Int32></List>"#);
    assert_well_formed(&xml);
    Ok(())
}

fn card_nodes() -> Vec<XamlNode> {
    let card = card();
    let pair = pair();
    let offset = offset();
    let mut nodes = vec![
        ns("", NS),
        ns("x", XAML_NAMESPACE),
        XamlNode::StartObject(card.clone()),
        XamlNode::StartMember(member(&card, "Title")),
        text("Hello & <welcome>"),
        XamlNode::EndMember,
        XamlNode::StartMember(member(&card, "Label")),
        XamlNode::StartObject(pair),
        XamlNode::StartMember(XamlLanguage::positional_parameters().clone()),
        text("left"),
        text("right"),
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::StartMember(member(&card, "Origin")),
        XamlNode::StartObject(offset.clone()),
        XamlNode::StartMember(member(&offset, "X")),
        text("1.5"),
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::StartMember(member(&card, "Body")),
    ];
    nodes.extend(scalar(XamlLanguage::int32(), "5"));
    nodes.extend([XamlNode::EndMember, XamlNode::EndObject]);
    nodes
}

#[test]
fn record_members_become_attributes_and_member_elements() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let xml = to_string(&schema(), card_nodes())?;
    insta::assert_snapshot!(xml, @r#"<Card Title="Hello &amp; &lt;welcome&gt;" Label="{Pair left, right}" xmlns="urn:xamlite:xml-tests" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"><Card.Origin><Offset X="1.5" /></Card.Origin><x:Int32>5</x:Int32></Card>"#);
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn brace_values_holding_syntax_are_quoted() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let card = card();
    let nodes = vec![
        ns("", NS),
        XamlNode::StartObject(card.clone()),
        XamlNode::StartMember(member(&card, "Label")),
        XamlNode::StartObject(pair()),
        XamlNode::StartMember(XamlLanguage::positional_parameters().clone()),
        text("a,b"),
        text("c}"),
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::StartMember(member(&card, "Title")),
        XamlNode::StartObject(pair()),
        XamlNode::StartMember(member(&pair(), "First")),
        text("it's"),
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let xml = to_string(&schema(), nodes)?;
    insta::assert_snapshot!(xml, @r#"<Card Label="{Pair 'a,b', 'c}'}" Title="{Pair First='it\'s'}" xmlns="urn:xamlite:xml-tests" />"#);
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn pretty_printing_indents_elements() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let xml = xamlite_xml::to_string_pretty(&schema(), card_nodes())?;
    assert_eq!(
        xml,
        indoc! {r#"
            <Card Title="Hello &amp; &lt;welcome&gt;" Label="{Pair left, right}" xmlns="urn:xamlite:xml-tests" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
              <Card.Origin>
                <Offset X="1.5" />
              </Card.Origin>
              <x:Int32>5</x:Int32>
            </Card>
        "#}
        .trim_end()
    );
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn top_level_extension_is_flattened_into_an_attribute() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let schema = schema();
    let xml = save(&schema, &Value::Type(XamlLanguage::int32().clone()))?;
    insta::assert_snapshot!(xml, @r#"<x:Type TypeName="x:Int32" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml" />"#);
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn two_positional_parameters_at_top_level_are_unsupported() {
    xamlite_testhelpers::setup();
    let nodes = vec![
        ns("", NS),
        XamlNode::StartObject(pair()),
        XamlNode::StartMember(XamlLanguage::positional_parameters().clone()),
        text("left"),
        text("right"),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let err = to_string(&schema(), nodes).unwrap_err();
    assert_eq!(xaml_category(&err), ErrorCategory::UnsupportedGraph);
    assert_eq!(
        err.to_string(),
        "PairExtension has more than one positional parameter and cannot be written as a top-level attribute"
    );
    assert_eq!(
        miette::Diagnostic::code(&err).unwrap().to_string(),
        "xaml::multiple_positional_parameters"
    );
}

#[test]
fn positional_parameters_under_items_are_written_as_elements() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let list = XamlType::list_of(XamlLanguage::object());
    let nodes = vec![
        ns("", COLLECTIONS_NAMESPACE),
        ns("t", NS),
        ns("x", XAML_NAMESPACE),
        XamlNode::StartObject(list),
        XamlNode::StartMember(XamlLanguage::items().clone()),
        XamlNode::StartObject(pair()),
        XamlNode::StartMember(XamlLanguage::positional_parameters().clone()),
        text("left"),
        text("right"),
        XamlNode::EndMember,
        XamlNode::EndObject,
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let xml = to_string(&schema(), nodes)?;
    insta::assert_snapshot!(xml, @r#"<List x:TypeArguments="x:Object" xmlns="clr-namespace:System.Collections.Generic;assembly=mscorlib" xmlns:t="urn:xamlite:xml-tests" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"><t:Pair><x:_PositionalParameters>left, right</x:_PositionalParameters></t:Pair></List>"#);
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn dictionary_keys_are_attributes() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let schema = schema();
    let dict = XamlType::dictionary_of(XamlLanguage::string(), XamlLanguage::double());
    let value = dict.create_instance(&[])?;
    dict.add_to_dictionary(&value, "Foo".into(), Value::Double(5.0), false)?;
    dict.add_to_dictionary(&value, "Bar".into(), Value::Double(2.5), false)?;

    let xml = save_with_settings(&schema, &value, &XmlWriterSettings::new().pretty())?;
    insta::assert_snapshot!(xml, @r#"
    <Dictionary x:TypeArguments="x:String, x:Double" xmlns="clr-namespace:System.Collections.Generic;assembly=mscorlib" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
      <x:Double x:Key="Foo">5</x:Double>
      <x:Double x:Key="Bar">2.5</x:Double>
    </Dictionary>
    "#);
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn saved_graphs_write_read_only_collections_inline() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let schema = schema();
    let card_type = card();
    let card = card_type.create_instance(&[])?;
    member(&card_type, "Title").set(&card, "hi".into())?;
    member(&card_type, "Kind").set(&card, Value::Type(offset()))?;
    let tags = member(&card_type, "Tags").get(&card)?;
    for tag in ["a", "b"] {
        tags.xaml_type().add_to_collection(&tags, tag.into())?;
    }

    let xml = save(&schema, &card)?;
    insta::assert_snapshot!(xml, @r#"<Card Title="hi" xmlns="urn:xamlite:xml-tests" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"><x:String>a</x:String><x:String>b</x:String><Card.Kind>Offset</Card.Kind></Card>"#);
    assert!(!xml.contains("xmlns:scg"), "the collection type is never written");
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn late_namespaces_force_member_elements() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let card = card();
    let nodes = vec![
        ns("", NS),
        XamlNode::StartObject(card.clone()),
        ns("p", "urn:other"),
        XamlNode::StartMember(member(&card, "Title")),
        text("t"),
        XamlNode::EndMember,
        XamlNode::EndObject,
    ];
    let xml = to_string(&schema(), nodes)?;
    insta::assert_snapshot!(xml, @r#"<Card xmlns="urn:xamlite:xml-tests"><Card.Title xmlns:p="urn:other">t</Card.Title></Card>"#);
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn forced_close_finishes_the_document() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let card = card();
    let nodes = vec![
        ns("", NS),
        ns("x", XAML_NAMESPACE),
        XamlNode::StartObject(card.clone()),
        XamlNode::StartMember(member(&card, "Body")),
        XamlNode::StartObject(XamlLanguage::int32().clone()),
        XamlNode::StartMember(XamlLanguage::initialization().clone()),
        text("7"),
    ];
    let xml = to_string(&schema(), nodes)?;
    insta::assert_snapshot!(xml, @r#"<Card xmlns="urn:xamlite:xml-tests" xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"><x:Int32>7</x:Int32></Card>"#);

    let nodes = vec![
        ns("", NS),
        XamlNode::StartObject(card.clone()),
        XamlNode::StartMember(member(&card, "Title")),
    ];
    let xml = to_string(&schema(), nodes)?;
    assert_eq!(xml, r#"<Card xmlns="urn:xamlite:xml-tests"><Card.Title /></Card>"#);
    Ok(())
}

#[test]
fn close_after_a_rejected_event_finishes_the_document() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let schema = schema();
    let card = card();
    let title = member(&card, "Title");
    let mut writer = XmlWriter::new(&schema, XmlTextSink::new());
    writer.write_namespace(NamespaceDeclaration::new("", NS))?;
    writer.write_start_object(&card)?;
    writer.write_start_member(&title)?;
    writer.write_value("a".into())?;
    writer.write_end_member()?;
    assert!(writer.write_start_member(&title).is_err());

    writer.write_start_member(&member(&card, "Origin"))?;
    let err = writer
        .write_value(offset().create_instance(&[])?)
        .unwrap_err();
    assert_eq!(xaml_category(&err), ErrorCategory::UnsupportedGraph);

    writer.close()?;
    let xml = writer.into_inner().finish()?;
    assert_eq!(
        xml,
        r#"<Card Title="a" xmlns="urn:xamlite:xml-tests"><Card.Origin /></Card>"#
    );
    assert_well_formed(&xml);
    Ok(())
}

#[test]
fn get_object_needs_a_collection_member() {
    xamlite_testhelpers::setup();
    let card = card();
    let nodes = vec![
        ns("", NS),
        XamlNode::StartObject(card.clone()),
        XamlNode::StartMember(member(&card, "Title")),
        XamlNode::GetObject,
    ];
    let err = to_string(&schema(), nodes).unwrap_err();
    assert_eq!(xaml_category(&err), ErrorCategory::Structural);
    assert_eq!(
        err.to_string(),
        "GetObject needs a collection member, but Card.Title is not one"
    );
}

#[test]
fn members_are_written_once() {
    xamlite_testhelpers::setup();
    let card = card();
    let title = member(&card, "Title");
    let nodes = vec![
        ns("", NS),
        XamlNode::StartObject(card.clone()),
        XamlNode::StartMember(title.clone()),
        text("a"),
        XamlNode::EndMember,
        XamlNode::StartMember(title),
    ];
    let err = to_string(&schema(), nodes).unwrap_err();
    assert_eq!(err.to_string(), "member Card.Title is already set on Card");
}

#[test]
fn members_hold_one_value() {
    xamlite_testhelpers::setup();
    let card = card();
    let nodes = vec![
        ns("", NS),
        XamlNode::StartObject(card.clone()),
        XamlNode::StartMember(member(&card, "Title")),
        text("a"),
        text("b"),
    ];
    let err = to_string(&schema(), nodes).unwrap_err();
    assert_eq!(xaml_category(&err), ErrorCategory::Structural);
    assert_eq!(err.to_string(), "Value is not allowed in state ValueWritten");
}

#[test]
fn values_need_a_text_form() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let card = card();
    let origin = offset().create_instance(&[])?;
    let nodes = vec![
        ns("", NS),
        XamlNode::StartObject(card.clone()),
        XamlNode::StartMember(member(&card, "Origin")),
        XamlNode::Value(origin),
    ];
    let err = to_string(&schema(), nodes).unwrap_err();
    assert_eq!(xaml_category(&err), ErrorCategory::UnsupportedGraph);
    Ok(())
}

#[test]
fn undeclared_namespaces_are_reported() {
    xamlite_testhelpers::setup();
    let err = to_string(&schema(), [XamlNode::StartObject(card())]).unwrap_err();
    assert_eq!(xaml_category(&err), ErrorCategory::Schema);
    assert_eq!(
        err.to_string(),
        "no prefix declared for namespace 'urn:xamlite:xml-tests'"
    );
}
