//! Streaming access to the XML parts of an xlsx package.
//!
//! Worksheets can hold hundreds of thousands of cells, so parts are read as a
//! stream of quick-xml events through [`match_xml_events!`] rather than as a DOM.

use crate::error::BannerSheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum XmlError {
    #[error("Unknown entity '&{0};'")]
    UnknownEntityError(String),

    #[error("Invalid character reference '&{0};'")]
    CharReferenceError(String),
}

/// Event reader over one package part, reusing a single buffer.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // `<c r="A1"/>` arrives as Start + End, so cell handling has one path
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader { reader, buffer: Vec::with_capacity(1024) }
    }

    /// Reads the next XML event, `None` at end of document
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, BannerSheetError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(BannerSheetError::XmlError(error)),
        }
    }
}

/// Attribute lookup on start tags.
pub(crate) trait XmlNodeHelper<'a> {
    /// Unescaped value of the attribute with exactly this name
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, BannerSheetError>;

    /// Unescaped value of the first attribute with this local name, whatever its prefix
    fn get_local_attribute_value(&'a self, local_name: &str) -> Result<Option<Cow<'a, str>>, BannerSheetError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, BannerSheetError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }

    fn get_local_attribute_value(&'a self, local_name: &str) -> Result<Option<Cow<'a, str>>, BannerSheetError> {
        for result in self.attributes() {
            let attribute = result?;
            if attribute.key.local_name().as_ref() == local_name.as_bytes() {
                return Ok(Some(attribute.unescape_value()?));
            }
        }
        Ok(None)
    }
}

pub(crate) trait XmlTextHelper {
    /// Appends the text of an entity (`&amp;`) or character reference (`&#65;`, `&#x42;`)
    fn push_reference(&mut self, reference: &BytesRef) -> Result<(), BannerSheetError>;
}

impl XmlTextHelper for String {
    fn push_reference(&mut self, reference: &BytesRef) -> Result<(), BannerSheetError> {
        let name = reference.xml_content()?;
        match resolve_xml_entity(&name) {
            Some(entity) => self.push_str(entity),
            None => self.push(resolve_char_reference(&name)?),
        }
        Ok(())
    }
}

fn resolve_char_reference(name: &str) -> Result<char, XmlError> {
    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => match name.strip_prefix('#') {
            Some(decimal) => decimal.parse::<u32>().ok(),
            None => return Err(XmlError::UnknownEntityError(name.to_owned())),
        },
    };
    code.and_then(char::from_u32)
        .ok_or_else(|| XmlError::CharReferenceError(name.to_owned()))
}

/// Loops over the events of an [`XmlReader`] until end of document.
///
/// Arms are matched in order; unmatched events are skipped.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
