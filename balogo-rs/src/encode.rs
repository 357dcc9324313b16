//! Text encodings for the JSON payload.
//!
//! The `encode` parameter selects how the PNG byte buffer is turned into the
//! `data.image` string. The whitelist and the byte→string mappings are
//! compatible with Node's `Buffer.toString(encoding)` so existing clients
//! keep decoding correctly.

use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::error::LogoError;

/// Recognized values of the `encode` parameter.
///
/// Aliases (`utf-8`, `ucs2`, `binary`, ...) collapse onto one variant each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    Ascii,
    Utf8,
    Utf16Le,
    Base64,
    #[default]
    Base64Url,
    Latin1,
    Hex,
}

impl FromStr for TextEncoding {
    type Err = LogoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascii" => Ok(TextEncoding::Ascii),
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "utf16le" | "utf-16le" | "ucs2" | "ucs-2" => Ok(TextEncoding::Utf16Le),
            "base64" => Ok(TextEncoding::Base64),
            "base64url" => Ok(TextEncoding::Base64Url),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            "hex" => Ok(TextEncoding::Hex),
            _ => Err(LogoError::InvalidParam {
                field: "encode",
                value: s.to_string(),
            }),
        }
    }
}

impl TextEncoding {
    /// Encode a byte buffer into a string under this encoding.
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Ascii => bytes.iter().map(|&b| (b & 0x7f) as char).collect(),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf16Le => {
                // Byte pairs become UTF-16 code units; a trailing odd byte
                // is dropped, matching Node.
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            TextEncoding::Base64 => STANDARD.encode(bytes),
            TextEncoding::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Hex => hex::encode(bytes),
        }
    }
}
