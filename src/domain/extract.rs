//! Field extraction: request body -> [`Event`].
//!
//! Only `application/x-www-form-urlencoded` bodies carry fields. Any other (or
//! absent) content type decodes to an empty field set, which is reported as
//! [`ExtractionError::Empty`] rather than a decode failure.

use crate::domain::event::Event;
use percent_encoding::percent_decode;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The body (or its Content-Type) could not be decoded.
    #[error("{0}")]
    Malformed(String),
    /// Decoding succeeded but produced no fields.
    #[error("Empty request")]
    Empty,
}

/// Decodes `body` into an ordered field mapping.
///
/// Pure: no I/O, no side effects.
pub fn extract_event(body: &[u8], content_type: Option<&str>) -> Result<Event, ExtractionError> {
    let event = match content_type {
        Some(raw) if is_form_media_type(raw)? => parse_form(body)?,
        _ => Event::new(),
    };

    if event.is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(event)
}

fn is_form_media_type(raw: &str) -> Result<bool, ExtractionError> {
    let media_type = raw.split(';').next().unwrap_or_default().trim();
    if media_type.is_empty() {
        return Ok(false);
    }

    let well_formed = matches!(
        media_type.split_once('/'),
        Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() && !sub.contains('/')
    );
    if !well_formed {
        return Err(ExtractionError::Malformed(format!(
            "mime: invalid media type {:?}",
            raw
        )));
    }

    Ok(media_type.eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn parse_form(body: &[u8]) -> Result<Event, ExtractionError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| ExtractionError::Malformed("request body is not valid UTF-8".to_string()))?;
    check_encoding(text)?;

    // Splitting only happens at ASCII '&' and '=', so a body that unescapes to
    // valid UTF-8 as a whole does so field by field too.
    percent_decode(body)
        .decode_utf8()
        .map_err(|_| ExtractionError::Malformed("form field is not valid UTF-8".to_string()))?;

    let mut event = Event::new();
    for (name, value) in form_urlencoded::parse(body) {
        if name.is_empty() {
            return Err(ExtractionError::Malformed("empty field name".to_string()));
        }
        event.insert(name, value);
    }
    Ok(event)
}

/// Rejects what a lenient decoder would silently accept: `;` separators and
/// `%` not followed by two hex digits.
fn check_encoding(text: &str) -> Result<(), ExtractionError> {
    if text.contains(';') {
        return Err(ExtractionError::Malformed(
            "invalid semicolon separator in query".to_string(),
        ));
    }

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            let valid = matches!(escape, Some([a, b]) if a.is_ascii_hexdigit() && b.is_ascii_hexdigit());
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(ExtractionError::Malformed(format!(
                    "invalid URL escape {:?}",
                    String::from_utf8_lossy(&bytes[i..end])
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
