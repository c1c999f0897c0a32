use xamlite_schema::{
    NamespaceDeclaration, NamespaceScope, ObjectRef, SchemaContext, SchemaError, Value,
    ValueContext, XAML_NAMESPACE, XamlLanguage, XamlType, XamlTypeBuilder,
};

const NS: &str = "urn:xamlite:schema-tests";

fn shape() -> XamlType {
    XamlTypeBuilder::new(NS, "Shape")
        .member("Name", XamlLanguage::string())
        .member("Stroke", XamlLanguage::double())
        .build()
}

fn circle() -> XamlType {
    XamlTypeBuilder::new(NS, "Circle")
        .base(&shape())
        .member("Radius", XamlLanguage::double())
        .member("Count", XamlLanguage::int32())
        .member("Origin", &shape())
        .read_only_member("Tags", &XamlType::list_of(XamlLanguage::string()))
        .content_property("Tags")
        .build()
}

fn size() -> XamlType {
    let double = XamlLanguage::double();
    XamlTypeBuilder::new(NS, "Size")
        .member("Width", double)
        .member("Height", double)
        .constructor_arguments([("Width", double.clone()), ("Height", double.clone())])
        .no_default_constructor()
        .factory_method("Square", [double.clone()], |args| {
            size().create_instance(&[args[0].clone(), args[0].clone()])
        })
        .build()
}

fn provide_upper(instance: &ObjectRef, _ctx: &dyn ValueContext) -> Result<Value, SchemaError> {
    let text = instance.borrow().field("Text").cloned().unwrap_or_default();
    Ok(Value::String(text.to_string().to_uppercase()))
}

fn upper() -> XamlType {
    let string = XamlLanguage::string();
    XamlTypeBuilder::new(NS, "UpperExtension")
        .member("Text", string)
        .constructor_arguments([("Text", string.clone())])
        .markup_extension(Some(string), provide_upper)
        .build()
}

#[test]
fn records_start_at_member_defaults() {
    xamlite_testhelpers::setup();
    let circle = circle();
    let instance = circle.create_instance(&[]).unwrap();

    let get = |name: &str| circle.member(name).unwrap().get(&instance).unwrap();
    assert_eq!(get("Name"), Value::Null);
    assert_eq!(get("Stroke"), Value::Double(0.0));
    assert_eq!(get("Count"), Value::Int32(0));
    assert_eq!(get("Origin"), Value::Null);

    let tags = get("Tags");
    let tags = tags.as_object().unwrap().borrow();
    assert_eq!(tags.as_list().unwrap().len(), 0);
}

#[test]
fn derived_types_inherit_members() {
    xamlite_testhelpers::setup();
    let circle = circle();
    let names: Vec<&str> = circle.members().iter().map(|m| m.name()).collect();
    assert_eq!(
        names,
        ["Name", "Stroke", "Radius", "Count", "Origin", "Tags"]
    );
    assert_eq!(circle.member("Name").unwrap().to_string(), "Shape.Name");
    assert_eq!(circle.member("Radius").unwrap().to_string(), "Circle.Radius");
    assert_eq!(circle.content_property().unwrap().name(), "Tags");

    assert!(shape().is_assignable_from(&circle));
    assert!(!circle.is_assignable_from(&shape()));
    assert!(XamlLanguage::object().is_assignable_from(&circle));
}

#[test]
fn read_only_members_reject_writes() {
    xamlite_testhelpers::setup();
    let circle = circle();
    let instance = circle.create_instance(&[]).unwrap();
    let tags = circle.member("Tags").unwrap();
    assert!(tags.is_read_only());
    assert_eq!(
        tags.set(&instance, Value::Null),
        Err(SchemaError::ReadOnlyMember {
            member: "Circle.Tags".to_owned()
        })
    );
}

#[test]
fn constructor_arguments_fill_members() {
    xamlite_testhelpers::setup();
    let size = size();
    assert!(size.construction_requires_arguments());
    assert_eq!(
        size.create_instance(&[]),
        Err(SchemaError::NoDefaultConstructor {
            ty: "Size".to_owned()
        })
    );

    let instance = size
        .create_instance(&[Value::Double(2.0), Value::Double(3.0)])
        .unwrap();
    let height = size.member("Height").unwrap().get(&instance).unwrap();
    assert_eq!(height, Value::Double(3.0));

    let square = size.factory_method("Square", 1).unwrap();
    let instance = square.invoke(&[Value::Double(4.0)]).unwrap();
    let width = size.member("Width").unwrap().get(&instance).unwrap();
    assert_eq!(width, Value::Double(4.0));
    assert!(size.factory_method("Square", 2).is_none());
    assert!(size.has_factory_method("Square"));
}

#[test]
fn markup_extensions_provide_values() {
    xamlite_testhelpers::setup();
    let upper = upper();
    assert!(upper.is_markup_extension());
    assert!(upper.has_positional_parameters());
    assert_eq!(upper.xml_name(), "Upper");
    assert_eq!(
        upper.markup_extension_return_type(),
        Some(XamlLanguage::string())
    );

    let schema = SchemaContext::new();
    let scope = NamespaceScope::new(&schema, &[]);
    let instance = upper.create_instance(&["shout".into()]).unwrap();
    let provided = upper
        .provide_value(instance.as_object().unwrap(), &scope)
        .unwrap();
    assert_eq!(provided, Value::String("SHOUT".to_owned()));

    // Records provide themselves.
    let shape = shape();
    let instance = shape.create_instance(&[]).unwrap();
    let provided = shape
        .provide_value(instance.as_object().unwrap(), &scope)
        .unwrap();
    assert_eq!(provided, instance);
}

#[test]
fn registered_types_resolve_by_prefix() {
    xamlite_testhelpers::setup();
    let mut schema = SchemaContext::new().with_type(circle()).with_type(upper());
    schema.register_prefix(NS, "s2");
    assert_eq!(schema.preferred_prefix(NS), Some("s2"));

    let decls = [
        NamespaceDeclaration::new("", NS),
        NamespaceDeclaration::new("x", XAML_NAMESPACE),
    ];
    let scope = NamespaceScope::new(&schema, &decls);
    assert_eq!(scope.resolve_type("Circle").unwrap(), circle());
    assert_eq!(scope.resolve_type("Upper").unwrap(), upper());
    assert_eq!(
        scope.qualified_name(&XamlType::list_of(&circle())),
        Err(SchemaError::UnknownNamespace {
            namespace: xamlite_schema::COLLECTIONS_NAMESPACE.to_owned()
        })
    );
    assert!(matches!(
        scope.resolve_type("Square"),
        Err(SchemaError::UnknownType { .. })
    ));
}
