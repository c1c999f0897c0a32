//! Recording node streams and forced close.

mod common;

use common::{dump, member, widget};
use xamlite::{ErrorCategory, NodeList, XamlLanguage, XamlNode, XamlType, XamlWriter, transform};
use xamlite_testhelpers::IPanic;

#[test]
fn forced_close_synthesizes_the_missing_ends() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let list = XamlType::list_of(XamlLanguage::int32());
    let mut nodes = NodeList::new();
    nodes.write_start_object(&list)?;
    nodes.write_start_member(XamlLanguage::items())?;
    nodes.write_start_object(XamlLanguage::int32())?;
    nodes.write_start_member(XamlLanguage::initialization())?;
    nodes.write_value("5".into())?;
    let written = nodes.len();

    nodes.close()?;
    insta::assert_snapshot!(dump(&nodes.nodes()[written..]), @r"
    EndMember
    EndObject
    EndMember
    EndObject
    ");

    nodes.close()?;
    assert_eq!(nodes.len(), written + 4, "closing twice adds nothing");
    Ok(())
}

#[test]
fn forced_close_ends_empty_members() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let widget = widget();
    let mut nodes = NodeList::new();
    nodes.write_start_object(&widget)?;
    nodes.write_start_member(&member(&widget, "Children"))?;
    nodes.close()?;
    insta::assert_snapshot!(dump(&nodes), @r"
    StartObject Widget
    StartMember Widget.Children
    EndMember
    EndObject
    ");
    Ok(())
}

#[test]
fn recorded_streams_replay_into_other_writers() -> Result<(), IPanic> {
    xamlite_testhelpers::setup();
    let schema = common::schema();
    let mut recorded = NodeList::default();
    transform(common::scalar(XamlLanguage::double(), "2.5"), &mut recorded)?;
    assert!(!recorded.is_empty());

    let value = xamlite::load(&schema, recorded)?;
    assert_eq!(value, xamlite::Value::Double(2.5));
    Ok(())
}

#[test]
fn recording_rejects_ill_formed_streams() {
    xamlite_testhelpers::setup();
    let mut nodes = NodeList::new();
    let err = transform([XamlNode::EndMember], &mut nodes).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert!(nodes.is_empty());
}
