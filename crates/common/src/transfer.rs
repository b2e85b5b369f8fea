// Byte-stream converters for note download and upload.

use thiserror::Error;

const EXPORT_EXTENSION: &str = ".txt";
const FALLBACK_STEM: &str = "note";
const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("upload is not valid UTF-8 text (invalid byte at offset {0})")]
    NotUtf8(usize),

    #[error("upload contains a null byte at offset {0}")]
    NullByte(usize),
}

/// File name a note is downloaded as: the note name with anything outside
/// letters, digits, space and `-!@()[];_` replaced by `_`, plus `.txt`.
pub fn export_file_name(name: &str) -> String {
    let stem: String = name.trim().chars().map(|c| if is_safe(c) { c } else { '_' }).collect();
    if stem.trim().is_empty() {
        return format!("{FALLBACK_STEM}{EXPORT_EXTENSION}");
    }
    format!("{stem}{EXPORT_EXTENSION}")
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '!' | '@' | '(' | ')' | '[' | ']' | ';' | '_')
}

/// Decode an uploaded file into note text.
///
/// Rules:
/// - Must be valid UTF-8
/// - Must not contain null bytes (binary files)
/// - A leading byte-order mark is dropped
pub fn decode_upload(bytes: &[u8]) -> Result<String, TransferError> {
    let text = std::str::from_utf8(bytes).map_err(|e| TransferError::NotUtf8(e.valid_up_to()))?;
    if let Some(offset) = text.find('\0') {
        return Err(TransferError::NullByte(offset));
    }
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(export_file_name("Shopping list"), "Shopping list.txt");
        assert_eq!(export_file_name("todo_2024-05 (draft)"), "todo_2024-05 (draft).txt");
    }

    #[test]
    fn unsafe_characters_become_underscores() {
        assert_eq!(export_file_name("a/b\\c:d"), "a_b_c_d.txt");
        assert_eq!(export_file_name("caf\u{e9}?"), "caf__.txt");
    }

    #[test]
    fn blank_names_fall_back() {
        assert_eq!(export_file_name(""), "note.txt");
        assert_eq!(export_file_name("   "), "note.txt");
    }

    #[test]
    fn upload_decodes_utf8() {
        assert_eq!(decode_upload("line one\nline two".as_bytes()).unwrap(), "line one\nline two");
    }

    #[test]
    fn upload_strips_byte_order_mark() {
        assert_eq!(decode_upload("\u{feff}hello".as_bytes()).unwrap(), "hello");
    }

    #[test]
    fn upload_rejects_invalid_utf8() {
        assert_eq!(decode_upload(&[b'o', b'k', 0xff, 0xfe]), Err(TransferError::NotUtf8(2)));
    }

    #[test]
    fn upload_rejects_null_bytes() {
        assert_eq!(decode_upload(b"abc\0def"), Err(TransferError::NullByte(3)));
    }
}
