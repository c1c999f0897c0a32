//! The built-in `x:` types and directives.

use std::sync::LazyLock;

use crate::convert::{
    NullExtension, ScalarConverter, ScalarSerializer, TypeExtension, TypeNameConverter,
    TypeNameSerializer,
};
use crate::invoker::ScalarInvoker;
use crate::types::list_type;
use crate::{AllowedLocations, TypeKind, Value, XamlMember, XamlType, XamlTypeBuilder};

/// Namespace of the language types and directives.
pub const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml";

/// Conventional prefix for [`XAML_NAMESPACE`].
pub const XAML_PREFIX: &str = "x";

/// Namespace of the `Type` type that type references have at runtime.
pub const SYSTEM_NAMESPACE: &str = "clr-namespace:System;assembly=mscorlib";

/// Namespace of the generic `List` and `Dictionary` types.
pub const COLLECTIONS_NAMESPACE: &str =
    "clr-namespace:System.Collections.Generic;assembly=mscorlib";

/// Accessors for the built-in language.
pub struct XamlLanguage {
    object: XamlType,
    string: XamlType,
    boolean: XamlType,
    int32: XamlType,
    int64: XamlType,
    double: XamlType,
    null: XamlType,
    type_extension: XamlType,
    type_reference: XamlType,
    items: XamlMember,
    initialization: XamlMember,
    positional_parameters: XamlMember,
    key: XamlMember,
    arguments: XamlMember,
    factory_method: XamlMember,
    name: XamlMember,
}

static LANGUAGE: LazyLock<XamlLanguage> = LazyLock::new(XamlLanguage::build);

fn scalar(name: &str, default: fn() -> Value, converter: ScalarConverter) -> XamlType {
    XamlTypeBuilder::new(XAML_NAMESPACE, name)
        .kind(TypeKind::Scalar)
        .type_converter(converter)
        .value_serializer(ScalarSerializer)
        .invoker(ScalarInvoker {
            default: Some(default),
        })
        .build()
}

impl XamlLanguage {
    fn build() -> Self {
        let object = XamlTypeBuilder::new(XAML_NAMESPACE, "Object")
            .kind(TypeKind::Any)
            .build();
        let string = scalar(
            "String",
            || Value::String(String::new()),
            ScalarConverter::String,
        );
        let boolean = scalar("Boolean", || Value::Bool(false), ScalarConverter::Boolean);
        let int32 = scalar("Int32", || Value::Int32(0), ScalarConverter::Int32);
        let int64 = scalar("Int64", || Value::Int64(0), ScalarConverter::Int64);
        let double = scalar("Double", || Value::Double(0.0), ScalarConverter::Double);

        let type_reference = XamlTypeBuilder::new(SYSTEM_NAMESPACE, "Type")
            .kind(TypeKind::Scalar)
            .no_default_constructor()
            .type_converter(TypeNameConverter)
            .value_serializer(TypeNameSerializer)
            .invoker(ScalarInvoker { default: None })
            .build();
        let null = XamlTypeBuilder::new(XAML_NAMESPACE, "NullExtension")
            .markup_extension(None, NullExtension)
            .build();
        let type_extension = XamlTypeBuilder::new(XAML_NAMESPACE, "TypeExtension")
            .member("TypeName", &string)
            .constructor_arguments([("TypeName", string.clone())])
            .markup_extension(Some(&type_reference), TypeExtension)
            .build();

        let object_list = list_type(object.clone(), int32.clone());
        Self {
            items: XamlMember::directive("_Items", object_list.clone(), AllowedLocations::NONE),
            initialization: XamlMember::directive(
                "_Initialization",
                object.clone(),
                AllowedLocations::NONE,
            ),
            positional_parameters: XamlMember::directive(
                "_PositionalParameters",
                object_list.clone(),
                AllowedLocations::NONE,
            ),
            key: XamlMember::directive("Key", object.clone(), AllowedLocations::ANY),
            arguments: XamlMember::directive(
                "Arguments",
                object_list,
                AllowedLocations::MEMBER_ELEMENT,
            ),
            factory_method: XamlMember::directive(
                "FactoryMethod",
                string.clone(),
                AllowedLocations::ANY,
            ),
            name: XamlMember::directive("Name", string.clone(), AllowedLocations::ANY),
            object,
            string,
            boolean,
            int32,
            int64,
            double,
            null,
            type_extension,
            type_reference,
        }
    }

    /// `x:Object`, which accepts any value.
    pub fn object() -> &'static XamlType {
        &LANGUAGE.object
    }

    /// `x:String`.
    pub fn string() -> &'static XamlType {
        &LANGUAGE.string
    }

    /// `x:Boolean`.
    pub fn boolean() -> &'static XamlType {
        &LANGUAGE.boolean
    }

    /// `x:Int32`.
    pub fn int32() -> &'static XamlType {
        &LANGUAGE.int32
    }

    /// `x:Int64`.
    pub fn int64() -> &'static XamlType {
        &LANGUAGE.int64
    }

    /// `x:Double`.
    pub fn double() -> &'static XamlType {
        &LANGUAGE.double
    }

    /// `x:Null`, the markup extension that provides the null reference.
    pub fn null() -> &'static XamlType {
        &LANGUAGE.null
    }

    /// `x:Type`, the markup extension that resolves a type name.
    pub fn type_extension() -> &'static XamlType {
        &LANGUAGE.type_extension
    }

    /// Runtime type of [`Value::Type`] values.
    pub fn type_reference() -> &'static XamlType {
        &LANGUAGE.type_reference
    }

    /// `x:_Items`, the children of a collection or dictionary.
    pub fn items() -> &'static XamlMember {
        &LANGUAGE.items
    }

    /// `x:_Initialization`, text an object is converted from.
    pub fn initialization() -> &'static XamlMember {
        &LANGUAGE.initialization
    }

    /// `x:_PositionalParameters`, markup-extension constructor arguments.
    pub fn positional_parameters() -> &'static XamlMember {
        &LANGUAGE.positional_parameters
    }

    /// `x:Key`, the dictionary key of an item.
    pub fn key() -> &'static XamlMember {
        &LANGUAGE.key
    }

    /// `x:Arguments`, constructor or factory-method arguments.
    pub fn arguments() -> &'static XamlMember {
        &LANGUAGE.arguments
    }

    /// `x:FactoryMethod`, the name of a static factory.
    pub fn factory_method() -> &'static XamlMember {
        &LANGUAGE.factory_method
    }

    /// `x:Name`.
    pub fn name() -> &'static XamlMember {
        &LANGUAGE.name
    }

    /// All built-in types.
    pub fn types() -> [&'static XamlType; 9] {
        [
            Self::object(),
            Self::string(),
            Self::boolean(),
            Self::int32(),
            Self::int64(),
            Self::double(),
            Self::null(),
            Self::type_extension(),
            Self::type_reference(),
        ]
    }

    /// All built-in directives.
    pub fn directives() -> [&'static XamlMember; 7] {
        [
            Self::items(),
            Self::initialization(),
            Self::positional_parameters(),
            Self::key(),
            Self::arguments(),
            Self::factory_method(),
            Self::name(),
        ]
    }
}
