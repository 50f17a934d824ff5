use encoding_rs::Encoding;

use crate::error::StatementError;

/// Turns raw upload bytes into markup text.
///
/// A BOM wins (MT5 writes UTF-16LE), then strict UTF-8, then the configured
/// single-byte fallback (MT4 terminals on Windows write the ANSI code page).
pub fn decode_document(bytes: &[u8], fallback_label: &str) -> Result<String, StatementError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(StatementError::DocumentParse("document is empty".to_string()));
    }

    let text = if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        decode_strict(encoding, &bytes[bom_len..])?
    } else if let Ok(s) = std::str::from_utf8(bytes) {
        s.to_string()
    } else {
        let encoding = Encoding::for_label(fallback_label.as_bytes()).ok_or_else(|| {
            StatementError::DocumentParse(format!("unknown fallback encoding '{}'", fallback_label))
        })?;
        decode_strict(encoding, bytes)?
    };

    if text.contains('\0') {
        return Err(StatementError::DocumentParse(
            "document contains NUL bytes, not markup".to_string(),
        ));
    }
    if text.trim().is_empty() {
        return Err(StatementError::DocumentParse("document is empty".to_string()));
    }

    Ok(text)
}

fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Result<String, StatementError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(StatementError::DocumentParse(format!(
            "malformed {} byte sequence",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le_with_bom(s: &str) -> Vec<u8> {
        let mut out = vec![0xFF, 0xFE];
        for unit in s.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_plain_utf8() {
        let text = decode_document("<p>損益</p>".as_bytes(), "windows-1252").unwrap();
        assert_eq!(text, "<p>損益</p>");
    }

    #[test]
    fn test_utf16_bom() {
        let bytes = utf16le_with_bom("<table><tr><td>Closed Transactions:</td></tr></table>");
        let text = decode_document(&bytes, "windows-1252").unwrap();
        assert!(text.starts_with("<table>"));
        assert!(text.contains("Closed Transactions:"));
    }

    #[test]
    fn test_fallback_encoding() {
        // 0x80 is the euro sign in windows-1252 and invalid as UTF-8
        let bytes = b"<td>\x80 12.50</td>";
        let text = decode_document(bytes, "windows-1252").unwrap();
        assert_eq!(text, "<td>€ 12.50</td>");
    }

    #[test]
    fn test_empty_and_binary_rejected() {
        assert!(matches!(
            decode_document(b"", "windows-1252"),
            Err(StatementError::DocumentParse(_))
        ));
        assert!(matches!(
            decode_document(b"  \n\t ", "windows-1252"),
            Err(StatementError::DocumentParse(_))
        ));
        assert!(matches!(
            decode_document(b"\x00\x01\x02<html>", "windows-1252"),
            Err(StatementError::DocumentParse(_))
        ));
    }

    #[test]
    fn test_truncated_utf16_rejected() {
        let err = decode_document(b"\xff\xfe<\x00t", "windows-1252").unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_unknown_fallback_label() {
        let err = decode_document(b"<p>\xc3</p>", "no-such-charset").unwrap_err();
        assert!(err.to_string().contains("unknown fallback encoding"));
    }
}
