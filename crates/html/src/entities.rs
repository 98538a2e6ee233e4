//! Entity decoding for tokenizer input and entity encoding for sanitizer output.
//!
//! Decoding contract:
//! - Named references decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
//! - Numeric references decoded only when well-formed and semicolon-terminated:
//!   `&#123;` (decimal) and `&#x1F4A9;` (hex).
//! - Only valid Unicode scalar values decode; invalid scalars pass through unchanged.
//! - Missing semicolons, unknown names, malformed numerics, or overlong digit runs are left
//!   unchanged.
//!
//! Encoding is the inverse used when re-serializing: everything `decode_entities`
//! can produce round-trips through `encode_entities`.

const NAMED: &[(&[u8], char)] = &[
    (b"&amp;", '&'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&apos;", '\''),
    (b"&nbsp;", '\u{00A0}'),
];

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Decode character references in `s`.
pub fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let Some(first_amp) = memchr::memchr(b'&', bytes) else {
        return s.to_string();
    };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first_amp]);
    let mut i = first_amp;
    let mut copy_start = first_amp;

    'scan: while i < bytes.len() {
        if bytes[i] != b'&' {
            i += 1;
            continue;
        }

        // Flush bytes up to '&' unchanged (preserves UTF-8).
        if copy_start < i {
            out.push_str(&s[copy_start..i]);
        }

        for (name, ch) in NAMED {
            if starts_with_bytes(bytes, i, name) {
                out.push(*ch);
                i += name.len();
                copy_start = i;
                continue 'scan;
            }
        }

        let numeric = if starts_with_bytes(bytes, i, b"&#x")
            || starts_with_bytes(bytes, i, b"&#X")
        {
            Some((i + 3, MAX_HEX_DIGITS, 16))
        } else if starts_with_bytes(bytes, i, b"&#") {
            Some((i + 2, MAX_DEC_DIGITS, 10))
        } else {
            None
        };

        if let Some((digits_start, max_digits, radix)) = numeric {
            let Some(end) = scan_numeric_entity(bytes, digits_start, max_digits, radix == 16)
            else {
                i = emit_malformed_entity(&mut out, s, bytes, i);
                copy_start = i;
                continue;
            };
            match u32::from_str_radix(&s[digits_start..end], radix)
                .ok()
                .and_then(char::from_u32)
            {
                Some(ch) => out.push(ch),
                // Known end; preserve entire sequence unchanged.
                None => out.push_str(&s[i..=end]),
            }
            i = end + 1;
            copy_start = i;
            continue;
        }

        // fallback to keep '&' as-is
        out.push('&');
        i += 1;
        copy_start = i;
    }

    if copy_start < bytes.len() {
        out.push_str(&s[copy_start..]);
    }

    out
}

/// Escape text or an attribute value for output.
///
/// `&`, `<` and `>` become named references; anything outside printable ASCII
/// (plus `"`) becomes a decimal reference, so output is plain ASCII and safe
/// inside double-quoted attribute values.
pub fn encode_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            ' ' | '!' | '#'..='~' => out.push(ch),
            _ => {
                out.push_str("&#");
                out.push_str(&u32::from(ch).to_string());
                out.push(';');
            }
        }
    }
    out
}

/// Minimal escaping for DOM serialization, which keeps non-ASCII text verbatim.
pub fn escape_text(value: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn starts_with_bytes(bytes: &[u8], i: usize, pat: &[u8]) -> bool {
    bytes.get(i..i + pat.len()).is_some_and(|s| s == pat)
}

// Bounded scan to avoid quadratic behavior on adversarial input.
fn scan_numeric_entity(
    bytes: &[u8],
    start: usize,
    max_digits: usize,
    is_hex: bool,
) -> Option<usize> {
    let mut j = start;
    let mut digits = 0usize;

    while j < bytes.len() {
        let b = bytes[j];
        if b == b';' {
            return (digits > 0).then_some(j);
        }
        if digits == max_digits {
            return None;
        }
        let ok = if is_hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        };
        if !ok {
            return None;
        }
        digits += 1;
        j += 1;
    }

    None
}

fn emit_malformed_entity(out: &mut String, s: &str, bytes: &[u8], start: usize) -> usize {
    let mut j = start + 1;
    while j < bytes.len() {
        let b = bytes[j];
        // Stop at `;`, whitespace, or `&` to avoid spanning into adjacent tokens.
        if b == b';' {
            out.push_str(&s[start..=j]);
            return j + 1;
        }
        if b == b'&' || b.is_ascii_whitespace() {
            out.push_str(&s[start..j]);
            return j;
        }
        j += 1;
    }
    out.push_str(&s[start..]);
    bytes.len()
}
