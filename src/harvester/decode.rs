//! Body format detection and decoding
//!
//! Turns a fetched body into text. Gzip payloads are inflated here unless
//! the HTTP transport already did it.

use crate::url::is_gzip_url;
use flate2::read::GzDecoder;
use std::borrow::Cow;
use std::io::Read;
use thiserror::Error;

/// Leading bytes of every gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// UTF-8 byte order mark
const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

/// A body that could not be turned into text
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("gzip decompression failed: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// How a body is encoded on arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// Gzip stream that still has to be inflated
    Gzip,

    /// Gzip by name or transport signal, already inflated by the HTTP layer
    TransportDecoded,

    /// Plain text
    Text,
}

/// Decides how a body is encoded
///
/// # Classification Order
///
/// 1. Payload starts with the gzip magic bytes → `Gzip`
/// 2. Transport signalled gzip, or the URL ends in `.gz` → `TransportDecoded`
///    (the HTTP client inflates `Content-Encoding: gzip` responses itself)
/// 3. Anything else → `Text`
pub fn detect_format(body: &[u8], url_hint: &str, content_encoding: Option<&str>) -> BodyFormat {
    if body.starts_with(&GZIP_MAGIC) {
        return BodyFormat::Gzip;
    }

    let transport_gzip = content_encoding
        .map(|enc| enc.to_ascii_lowercase().contains("gzip"))
        .unwrap_or(false);

    if transport_gzip || is_gzip_url(url_hint) {
        BodyFormat::TransportDecoded
    } else {
        BodyFormat::Text
    }
}

/// Decodes a fetched body into text
///
/// # Arguments
///
/// * `body` - Raw body bytes
/// * `url_hint` - The URL the body was fetched from
/// * `content_encoding` - Content-Encoding header, if still present
/// * `strip_control` - Remove non-printable characters from the result
///
/// # Returns
///
/// * `Ok(String)` - The decoded document
/// * `Err(DecodeError)` - Inflating failed or the bytes are not UTF-8
pub fn decode(
    body: &[u8],
    url_hint: &str,
    content_encoding: Option<&str>,
    strip_control: bool,
) -> Result<String, DecodeError> {
    let bytes: Cow<'_, [u8]> = match detect_format(body, url_hint, content_encoding) {
        BodyFormat::Gzip => Cow::Owned(gunzip(body)?),
        BodyFormat::TransportDecoded | BodyFormat::Text => Cow::Borrowed(body),
    };

    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);
    let text = String::from_utf8(content.to_vec())?;

    if strip_control {
        Ok(strip_non_printable(&text).into_owned())
    } else {
        Ok(text)
    }
}

/// Inflates a gzip stream
pub fn gunzip(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = GzDecoder::new(body);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(DecodeError::Gzip)?;
    Ok(out)
}

/// Removes control characters other than tab, newline and carriage return
pub fn strip_non_printable(text: &str) -> Cow<'_, str> {
    let is_noise = |c: char| c.is_control() && !matches!(c, '\t' | '\n' | '\r');

    if text.chars().any(is_noise) {
        Cow::Owned(text.chars().filter(|c| !is_noise(*c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}
