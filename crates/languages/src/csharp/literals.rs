//! C# string literal decoding and encoding
//!
//! Only plain literals are decoded; interpolated strings and concatenations
//! never reach this module because the matcher rejects them by node kind.

/// Node kinds tree-sitter-c-sharp uses for non-interpolated string literals
pub const STRING_LITERAL_KINDS: &[&str] = &[
    "string_literal",
    "verbatim_string_literal",
    "raw_string_literal",
];

/// Decode the value of a string literal node from its source text
///
/// Returns `None` if the text is not a well-formed literal of the given kind.
pub fn decode_string_literal(kind: &str, text: &str) -> Option<String> {
    match kind {
        "string_literal" => decode_regular(text),
        "verbatim_string_literal" => decode_verbatim(text),
        "raw_string_literal" => decode_raw(text),
        _ => None,
    }
}

/// Render a value as a regular C# string literal, quotes included
pub fn encode_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                for unit in c.encode_utf16(&mut [0u16; 2]) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn strip_utf8_suffix(text: &str) -> &str {
    text.strip_suffix("u8")
        .or_else(|| text.strip_suffix("U8"))
        .unwrap_or(text)
}

fn decode_regular(text: &str) -> Option<String> {
    let inner = strip_utf8_suffix(text)
        .strip_prefix('"')?
        .strip_suffix('"')?;

    let mut units: Vec<u16> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    let mut buf = [0u16; 2];

    while let Some(c) = chars.next() {
        if c != '\\' {
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        let escaped = match chars.next()? {
            '\'' => '\'',
            '"' => '"',
            '\\' => '\\',
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            'e' => '\x1b',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            'x' => {
                // one to four hex digits, greedy
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 4 {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            chars.next();
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return None;
                }
                units.push(value as u16);
                continue;
            }
            'u' => {
                let value = take_hex(&mut chars, 4)?;
                units.push(value as u16);
                continue;
            }
            'U' => {
                let value = take_hex(&mut chars, 8)?;
                let c = char::from_u32(value)?;
                units.extend_from_slice(c.encode_utf16(&mut buf));
                continue;
            }
            _ => return None,
        };
        units.extend_from_slice(escaped.encode_utf16(&mut buf));
    }

    String::from_utf16(&units).ok()
}

fn take_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, count: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

fn decode_verbatim(text: &str) -> Option<String> {
    let inner = strip_utf8_suffix(text)
        .strip_prefix("@\"")?
        .strip_suffix('"')?;
    Some(inner.replace("\"\"", "\""))
}

fn decode_raw(text: &str) -> Option<String> {
    let text = strip_utf8_suffix(text);
    let quotes = text.chars().take_while(|&c| c == '"').count();
    if quotes < 3 || text.len() < quotes * 2 {
        return None;
    }
    let delimiter = &text[..quotes];
    let inner = text[quotes..].strip_suffix(delimiter)?;

    if !inner.contains('\n') {
        return Some(inner.to_string());
    }

    // Multi-line: the opening and closing lines carry no content, and the
    // closing line's whitespace is stripped from every content line.
    let (first, rest) = inner.split_once('\n')?;
    if !first.trim().is_empty() {
        return None;
    }
    let (body, indent) = match rest.rsplit_once('\n') {
        Some((body, last)) => (body, last),
        None => ("", rest),
    };
    if !indent.trim().is_empty() {
        return None;
    }

    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| line.strip_prefix(indent).unwrap_or(line.trim_start()))
        .collect();
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plain() {
        assert_eq!(
            decode_string_literal("string_literal", "\"roomTitle\"").as_deref(),
            Some("roomTitle")
        );
        assert_eq!(
            decode_string_literal("string_literal", "\"\"").as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_regular_escapes() {
        assert_eq!(
            decode_string_literal("string_literal", r#""say \"hi\"\n""#).as_deref(),
            Some("say \"hi\"\n")
        );
        assert_eq!(
            decode_string_literal("string_literal", r#""tab\there""#).as_deref(),
            Some("tab\there")
        );
        assert_eq!(
            decode_string_literal("string_literal", r#""caf\u00E9""#).as_deref(),
            Some("café")
        );
        assert_eq!(
            decode_string_literal("string_literal", r#""\x41B""#).as_deref(),
            Some("\u{41B}")
        );
        assert_eq!(
            decode_string_literal("string_literal", r#""\x41 B""#).as_deref(),
            Some("A B")
        );
        assert_eq!(
            decode_string_literal("string_literal", r#""\uD83D\uDE00""#).as_deref(),
            Some("😀")
        );
        assert_eq!(
            decode_string_literal("string_literal", r#""\U0001F600""#).as_deref(),
            Some("😀")
        );
    }

    #[test]
    fn test_regular_invalid_escape() {
        assert!(decode_string_literal("string_literal", r#""bad \q""#).is_none());
        assert!(decode_string_literal("string_literal", r#""\u12""#).is_none());
    }

    #[test]
    fn test_utf8_suffix() {
        assert_eq!(
            decode_string_literal("string_literal", "\"abc\"u8").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_verbatim() {
        assert_eq!(
            decode_string_literal("verbatim_string_literal", r#"@"C:\temp\""#).as_deref(),
            Some(r"C:\temp\")
        );
        assert_eq!(
            decode_string_literal("verbatim_string_literal", r#"@"say ""hi""""#).as_deref(),
            Some("say \"hi\"")
        );
    }

    #[test]
    fn test_raw_single_line() {
        assert_eq!(
            decode_string_literal("raw_string_literal", r#""""has "quotes" inside""""#)
                .as_deref(),
            Some("has \"quotes\" inside")
        );
    }

    #[test]
    fn test_raw_multi_line() {
        let text = "\"\"\"\n    first\n      second\n    \"\"\"";
        assert_eq!(
            decode_string_literal("raw_string_literal", text).as_deref(),
            Some("first\n  second")
        );
    }

    #[test]
    fn test_unknown_kind() {
        assert!(decode_string_literal("interpolated_string_expression", "$\"x\"").is_none());
        assert!(decode_string_literal("integer_literal", "5").is_none());
    }

    #[test]
    fn test_encode_round_trips_through_decode() {
        for value in ["plain", "with \"quotes\"", "back\\slash", "line\nbreak", "café", ""] {
            let encoded = encode_string_literal(value);
            assert_eq!(
                decode_string_literal("string_literal", &encoded).as_deref(),
                Some(value),
                "value {value:?} encoded as {encoded}"
            );
        }
    }

    #[test]
    fn test_encode_control_chars() {
        assert_eq!(encode_string_literal("a\u{7}b"), "\"a\\u0007b\"");
    }
}
