// Encoding utilities for stream names

use encoding_rs::{UTF_8, WINDOWS_1252};

/// Text encoding of a name table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextEncoding {
    Windows1252,
    Utf8,
}

/// Decode text with specified encoding
pub fn decode_text(data: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Windows1252 => WINDOWS_1252.decode(data).0.to_string(),
        TextEncoding::Utf8 => UTF_8.decode(data).0.to_string(),
    }
}

/// Decode a stream name. Banks built by modern tools store UTF-8; older
/// ones store the tool's ANSI code page, so fall back to Windows-1252
/// when the bytes are not valid UTF-8.
pub fn decode_name(data: &[u8]) -> String {
    let encoding = if std::str::from_utf8(data).is_ok() {
        TextEncoding::Utf8
    } else {
        TextEncoding::Windows1252
    };
    decode_text(data, encoding).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_name() {
        assert_eq!(decode_name(b"music_01"), "music_01");
        assert_eq!(decode_name("b\u{e9}b\u{e9}".as_bytes()), "b\u{e9}b\u{e9}");
        // 0xE9 alone is not UTF-8 but is 'é' in Windows-1252
        assert_eq!(decode_name(&[b'c', b'a', b'f', 0xE9]), "caf\u{e9}");
        assert_eq!(decode_name(b"trailing  "), "trailing");
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(&[0x80], TextEncoding::Windows1252), "\u{20ac}");
        // invalid UTF-8 is replaced, never an error
        assert_eq!(decode_text(&[b'a', 0xFF], TextEncoding::Utf8), "a\u{fffd}");
    }
}
