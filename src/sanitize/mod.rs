//! Message Sanitizer
//!
//! Turns a raw queue payload into clean text: invalid UTF-8 is dropped,
//! control characters are removed, a leading transport header (an MQ RFH2
//! block, for example) is cut off in front of the payload marker, and HTML
//! entity escapes are decoded the way an HTML5 parser decodes them in text
//! (legacy names without a semicolon, remapped numeric references).
//!
//! Sanitizing never fails. Whatever survives the steps is the result.

use std::fmt;

/// Marker at the very start of text carrying a transport header
pub const DEFAULT_HEADER_MARKER: &str = "RFH";
/// Marker where the actual payload begins
pub const DEFAULT_PAYLOAD_MARKER: &str = "<?xml";

/// Text produced by the sanitizer. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CleanedMessage(String);

impl CleanedMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CleanedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CleanedMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sanitizer with configurable header and payload markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitizer {
    header_marker: String,
    payload_marker: String,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_MARKER, DEFAULT_PAYLOAD_MARKER)
    }
}

impl Sanitizer {
    pub fn new(header_marker: impl Into<String>, payload_marker: impl Into<String>) -> Self {
        Self {
            header_marker: header_marker.into(),
            payload_marker: payload_marker.into(),
        }
    }

    pub fn header_marker(&self) -> &str {
        &self.header_marker
    }

    pub fn payload_marker(&self) -> &str {
        &self.payload_marker
    }

    /// Sanitize a raw payload
    pub fn sanitize(&self, raw: &[u8]) -> CleanedMessage {
        self.sanitize_text(&decode_utf8_dropping_invalid(raw))
    }

    /// Sanitize a payload that is already text
    pub fn sanitize_text(&self, text: &str) -> CleanedMessage {
        let stripped = strip_control_chars(text);
        let payload = strip_transport_header(&stripped, &self.header_marker, &self.payload_marker);
        CleanedMessage(htmlize::unescape(payload).into_owned())
    }
}

/// Sanitize with the default `RFH` / `<?xml` markers
pub fn sanitize(raw: &[u8]) -> CleanedMessage {
    Sanitizer::default().sanitize(raw)
}

/// Decode UTF-8, silently skipping byte sequences that are not valid
pub fn decode_utf8_dropping_invalid(raw: &[u8]) -> String {
    let mut text = String::with_capacity(raw.len());
    for chunk in raw.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// True for the control characters removed by the sanitizer.
/// Tab, newline and carriage return are kept.
pub fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}')
}

/// Remove control characters, keeping tab, newline and carriage return
pub fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|c| !is_stripped_control(*c)).collect()
}

/// Cut everything in front of `payload_marker` when `text` starts with
/// `header_marker`. Without a payload marker the text is returned unchanged.
pub fn strip_transport_header<'a>(
    text: &'a str,
    header_marker: &str,
    payload_marker: &str,
) -> &'a str {
    if !text.starts_with(header_marker) {
        return text;
    }
    match text.find(payload_marker) {
        Some(idx) => &text[idx..],
        None => text,
    }
}
