#![warn(missing_docs)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

mod escaping;
mod settings;
mod sink;
mod text_sink;
mod tracing_macros;
mod writer;

pub use settings::XmlWriterSettings;
pub use sink::MarkupSink;
pub use text_sink::{XmlSinkError, XmlTextSink};
pub use writer::{XmlWriteError, XmlWriter};

use xamlite::{SchemaContext, Value, XamlNode, XamlWriter, read_object, transform};

/// Write a node stream as compact markup.
///
/// Anything the stream leaves open is closed.
pub fn to_string<I>(
    schema: &SchemaContext,
    nodes: I,
) -> Result<String, XmlWriteError<XmlSinkError>>
where
    I: IntoIterator<Item = XamlNode>,
{
    to_string_with_settings(schema, nodes, &XmlWriterSettings::default())
}

/// Write a node stream as indented markup.
pub fn to_string_pretty<I>(
    schema: &SchemaContext,
    nodes: I,
) -> Result<String, XmlWriteError<XmlSinkError>>
where
    I: IntoIterator<Item = XamlNode>,
{
    to_string_with_settings(schema, nodes, &XmlWriterSettings::default().pretty())
}

/// Write a node stream with custom settings.
pub fn to_string_with_settings<I>(
    schema: &SchemaContext,
    nodes: I,
    settings: &XmlWriterSettings,
) -> Result<String, XmlWriteError<XmlSinkError>>
where
    I: IntoIterator<Item = XamlNode>,
{
    let mut writer = XmlWriter::new(schema, XmlTextSink::with_settings(settings.clone()));
    transform(nodes, &mut writer)?;
    writer.close()?;
    writer.into_inner().finish().map_err(XmlWriteError::Sink)
}

/// Walk an object graph and write it as markup.
pub fn save(
    schema: &SchemaContext,
    value: &Value,
) -> Result<String, XmlWriteError<XmlSinkError>> {
    save_with_settings(schema, value, &XmlWriterSettings::default())
}

/// Walk an object graph and write it with custom settings.
pub fn save_with_settings(
    schema: &SchemaContext,
    value: &Value,
    settings: &XmlWriterSettings,
) -> Result<String, XmlWriteError<XmlSinkError>> {
    let nodes = read_object(schema, value)?;
    to_string_with_settings(schema, nodes, settings)
}
