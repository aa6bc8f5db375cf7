//! Single-byte Western European text codec used by the regulator's files.
//!
//! `encoding_rs` implements ISO-8859-1 through its windows-1252 superset,
//! which maps every byte to a distinct code point, so decode then encode
//! returns the original bytes.

use encoding_rs::WINDOWS_1252;

use crate::errors::{Result, StorageError};

pub fn decode_latin1(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

pub fn encode_latin1(text: &str) -> Result<Vec<u8>> {
    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    if unmappable {
        return Err(StorageError::Encoding(
            "text contains characters outside the Latin-1 range".into(),
        ));
    }
    Ok(bytes.into_owned())
}
