//! The persisted document and its XML form

use super::error::DocumentParseError;
use chrono::{DateTime, Utc};

/// `YYYYMMDDTHHMMSSZ`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
pub const ROOT_ELEMENT: &str = "MQMessage";

const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>";

/// Format a UTC instant the way document names and bodies carry it
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// One stored message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDocument {
    pub timestamp: String,
    pub queue_name: String,
    pub message_type: String,
    pub content: String,
}

impl PersistedDocument {
    /// File name derived from the timestamp
    pub fn file_name(&self) -> String {
        format!("message_{}.xml", self.timestamp)
    }

    /// Serialize as UTF-8 XML with an encoding declaration
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(self.content.len() + 192);
        xml.push_str(XML_DECLARATION);
        xml.push('\n');
        xml.push_str(&format!("<{}>", ROOT_ELEMENT));
        push_element(&mut xml, "Timestamp", &self.timestamp);
        push_element(&mut xml, "QueueName", &self.queue_name);
        push_element(&mut xml, "MessageType", &self.message_type);
        push_element(&mut xml, "Content", &self.content);
        xml.push_str(&format!("</{}>", ROOT_ELEMENT));
        xml
    }

    /// Parse a document produced by [`PersistedDocument::to_xml`]
    pub fn from_xml(xml: &str) -> Result<Self, DocumentParseError> {
        let mut rest = xml.trim_start_matches('\u{feff}').trim_start();
        if rest.starts_with("<?xml") {
            let end = rest.find("?>").ok_or_else(|| malformed("unterminated declaration"))?;
            rest = rest[end + 2..].trim_start();
        }

        let open = format!("<{}>", ROOT_ELEMENT);
        let close = format!("</{}>", ROOT_ELEMENT);
        let mut body = rest
            .strip_prefix(open.as_str())
            .ok_or_else(|| malformed("missing root element"))?
            .trim_end()
            .strip_suffix(close.as_str())
            .ok_or_else(|| malformed("missing closing root tag"))?;

        let mut timestamp = None;
        let mut queue_name = None;
        let mut message_type = None;
        let mut content = None;

        while !body.trim_start().is_empty() {
            let (name, text, remaining) = next_element(body.trim_start())?;
            match name {
                "Timestamp" => timestamp = Some(text),
                "QueueName" => queue_name = Some(text),
                "MessageType" => message_type = Some(text),
                "Content" => content = Some(text),
                other => return Err(malformed(&format!("unexpected element <{}>", other))),
            }
            body = remaining;
        }

        Ok(Self {
            timestamp: required(timestamp, "Timestamp")?,
            queue_name: required(queue_name, "QueueName")?,
            message_type: required(message_type, "MessageType")?,
            content: required(content, "Content")?,
        })
    }
}

fn required(value: Option<String>, element: &'static str) -> Result<String, DocumentParseError> {
    value.ok_or(DocumentParseError::MissingElement { element })
}

fn malformed(message: &str) -> DocumentParseError {
    DocumentParseError::Malformed {
        message: message.to_string(),
    }
}

fn push_element(xml: &mut String, name: &str, text: &str) {
    if text.is_empty() {
        xml.push_str(&format!("<{} />", name));
    } else {
        xml.push_str(&format!("<{}>{}</{}>", name, escape_xml_text(text), name));
    }
}

/// Escape character data. Carriage returns are written as a character
/// reference because XML readers normalise literal ones away.
fn escape_xml_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' => escaped.push_str("&#13;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// Splits `<Name>text</Name>` or `<Name />` off the front of `input`
fn next_element(input: &str) -> Result<(&str, String, &str), DocumentParseError> {
    let after_lt = input
        .strip_prefix('<')
        .ok_or_else(|| malformed("expected an element"))?;
    let tag_end = after_lt.find('>').ok_or_else(|| malformed("unterminated tag"))?;
    let tag = &after_lt[..tag_end];
    let after_tag = &after_lt[tag_end + 1..];

    if let Some(name) = tag.strip_suffix('/') {
        return Ok((name.trim(), String::new(), after_tag));
    }

    let name = tag.trim();
    let close = format!("</{}>", name);
    let text_end = after_tag
        .find(&close)
        .ok_or_else(|| malformed(&format!("missing </{}>", name)))?;
    let text = htmlize::unescape(&after_tag[..text_end]).into_owned();
    Ok((name, text, &after_tag[text_end + close.len()..]))
}
