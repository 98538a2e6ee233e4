//! Streaming HTML tokenizer with a parse stack for structural auto-closing.
//!
//! Tag and attribute names use the ASCII class `[A-Za-z0-9:_-]`; a start tag
//! must begin with an ASCII letter. Tokens are pushed into a [`TokenSink`] as
//! soon as they are recognized.
//!
//! Structural rules applied while tokenizing:
//! - A block start tag closes any inline elements on top of the stack.
//! - An optional-end-tag element (`li`, `td`, `p`, ...) closes a directly
//!   open element of the same name.
//! - Stray end tags (no matching open element) are dropped; an end tag closes
//!   every element opened after its match.
//! - `script`/`style` switch to raw text until their end tag.
//! - Elements still open at end of input are closed.
//!
//! Known limitations (intentional):
//! - Comments containing `--` before their terminator are not recognized,
//!   which stalls the scan and reports a [`ParseError`].
//! - A start tag without a closing `>` is a parse error rather than text.
//! - A raw-text element without its end tag swallows the rest of the input.
use crate::entities::decode_entities;
use crate::tables::{has_optional_end_tag, is_block, is_inline, is_opaque, is_void};
use crate::types::{Attributes, ParseError, Token, TokenSink};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";
const EXCERPT_LEN: usize = 64;

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

#[inline]
fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

#[inline]
fn skip_whitespace(bytes: &[u8], mut k: usize) -> usize {
    while k < bytes.len() && bytes[k].is_ascii_whitespace() {
        k += 1;
    }
    k
}

/// Tokenizes `input` into a vector.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut out = Vec::new();
    parse(input, &mut out)?;
    Ok(out)
}

/// Tokenizes `input`, streaming each token into `sink`.
///
/// Fails if an iteration cannot consume any input; tokens already delivered to
/// `sink` before the failure must be discarded by the caller.
pub fn parse<S: TokenSink + ?Sized>(input: &str, sink: &mut S) -> Result<(), ParseError> {
    let mut tokenizer = Tokenizer {
        input,
        pos: 0,
        stack: Vec::new(),
    };
    tokenizer.run(sink)
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Names of open elements, innermost last.
    stack: Vec<String>,
}

enum StartTagScan {
    /// `<` not followed by a tag name; it is text.
    NotATag,
    /// Looks like a tag but has no closing `>`.
    Unterminated,
    Tag {
        name: String,
        attributes: Attributes,
        unary: bool,
        end: usize,
    },
}

impl<'a> Tokenizer<'a> {
    fn run<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), ParseError> {
        // Invariant: `pos` only ever lands on ASCII structural bytes or on positions reached by
        // scanning ASCII-only syntax, so every slice endpoint is a UTF-8 char boundary.
        while self.pos < self.input.len() {
            let before = self.pos;
            let raw_text_parent = self.stack.last().filter(|top| is_opaque(top)).cloned();
            match raw_text_parent {
                Some(name) => self.raw_text(&name, sink),
                None => self.markup(sink),
            }
            if self.pos == before {
                return Err(self.stalled());
            }
        }
        self.close_elements(None, sink);
        Ok(())
    }

    fn markup<S: TokenSink + ?Sized>(&mut self, sink: &mut S) {
        let input = self.input;
        let bytes = input.as_bytes();
        let rest = &input[self.pos..];
        let mut text = String::new();
        let mut chars = true;

        if rest.starts_with(COMMENT_START) {
            // A comment is only accepted when its first `--` is the terminator.
            let body_start = COMMENT_START.len();
            if let Some(rel) = rest[body_start..].find("--") {
                let dashes = body_start + rel;
                if rest[dashes..].starts_with(COMMENT_END) {
                    sink.token(Token::Comment(rest[body_start..dashes].to_string()));
                    self.pos += dashes + COMMENT_END.len();
                    chars = false;
                }
            }
        } else if let Some(end) = self.doctype_end() {
            self.pos = end;
            chars = false;
        } else if rest.starts_with("</") {
            if let Some((name, end)) = scan_end_tag(input, self.pos) {
                self.pos = end;
                self.close_elements(Some(&name), sink);
                chars = false;
            }
        } else if rest.starts_with('<') {
            match scan_start_tag(input, self.pos) {
                StartTagScan::NotATag => {
                    // Encoded as an entity on output.
                    text.push('<');
                    self.pos += 1;
                }
                StartTagScan::Unterminated => chars = false,
                StartTagScan::Tag {
                    name,
                    attributes,
                    unary,
                    end,
                } => {
                    self.pos = end;
                    self.start_tag(name, attributes, unary, sink);
                    chars = false;
                }
            }
        }

        if chars {
            let rest = &bytes[self.pos..];
            let len = memchr(b'<', rest).unwrap_or(rest.len());
            debug_assert!(input.is_char_boundary(self.pos + len));
            text.push_str(&input[self.pos..self.pos + len]);
            self.pos += len;
            if !text.is_empty() {
                sink.token(Token::Text(decode_entities(&text)));
            }
        }
    }

    fn raw_text<S: TokenSink + ?Sized>(&mut self, name: &str, sink: &mut S) {
        let rest = &self.input[self.pos..];
        let (body, consumed) = match find_rawtext_close_tag(rest, name) {
            Some((start, end)) => (&rest[..start], end),
            None => (rest, rest.len()),
        };
        if !body.is_empty() {
            let body = strip_markers(body);
            sink.token(Token::Text(decode_entities(&body)));
        }
        self.pos += consumed;
        self.close_elements(Some(name), sink);
    }

    fn start_tag<S: TokenSink + ?Sized>(
        &mut self,
        name: String,
        attributes: Attributes,
        unary: bool,
        sink: &mut S,
    ) {
        if is_block(&name) {
            while self.stack.last().is_some_and(|top| is_inline(top)) {
                self.pop_element(sink);
            }
        }
        if has_optional_end_tag(&name) && self.stack.last().is_some_and(|top| *top == name) {
            self.pop_element(sink);
        }
        let unary = unary || is_void(&name);
        if !unary {
            self.stack.push(name.clone());
        }
        log::trace!(target: "html.tokenizer", "start tag <{name}> depth={}", self.stack.len());
        sink.token(Token::StartTag {
            name,
            attributes,
            self_closing: unary,
        });
    }

    fn pop_element<S: TokenSink + ?Sized>(&mut self, sink: &mut S) {
        if let Some(name) = self.stack.pop() {
            sink.token(Token::EndTag(name));
        }
    }

    /// Closes the innermost open element named `name` and everything above it,
    /// or every open element when `name` is `None`. Unknown names are ignored.
    fn close_elements<S: TokenSink + ?Sized>(&mut self, name: Option<&str>, sink: &mut S) {
        let floor = match name {
            Some(name) => match self.stack.iter().rposition(|open| open == name) {
                Some(index) => index,
                None => {
                    log::trace!(target: "html.tokenizer", "dropping stray end tag </{name}>");
                    return;
                }
            },
            None => 0,
        };
        while self.stack.len() > floor {
            self.pop_element(sink);
        }
    }

    fn doctype_end(&self) -> Option<usize> {
        let bytes = self.input.as_bytes();
        if !starts_with_ignore_ascii_case_at(bytes, self.pos, b"<!doctype") {
            return None;
        }
        let gt = memchr(b'>', &bytes[self.pos..])?;
        Some(self.pos + gt + 1)
    }

    fn stalled(&self) -> ParseError {
        let excerpt: String = self.input[self.pos..].chars().take(EXCERPT_LEN).collect();
        log::debug!(target: "html.tokenizer", "no progress at byte {}", self.pos);
        ParseError {
            position: self.pos,
            excerpt,
        }
    }
}

/// Matches `</name ...>` at `pos`, returning the lowercased name and the end offset.
fn scan_end_tag(input: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = input.as_bytes();
    let start = skip_whitespace(bytes, pos + 2);
    let mut k = start;
    while k < bytes.len() && is_name_char(bytes[k]) {
        k += 1;
    }
    if k == start {
        return None;
    }
    let gt = memchr(b'>', &bytes[k..])?;
    Some((input[start..k].to_ascii_lowercase(), k + gt + 1))
}

fn scan_start_tag(input: &str, pos: usize) -> StartTagScan {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut k = pos + 1;
    if !bytes.get(k).is_some_and(u8::is_ascii_alphabetic) {
        return StartTagScan::NotATag;
    }
    let name_start = k;
    while k < len && is_name_char(bytes[k]) {
        k += 1;
    }
    let name = input[name_start..k].to_ascii_lowercase();

    let mut attributes = Attributes::new();
    loop {
        // Every attribute is preceded by whitespace.
        let mut j = skip_whitespace(bytes, k);
        if j == k {
            break;
        }
        let attr_start = j;
        while j < len && is_name_char(bytes[j]) {
            j += 1;
        }
        if j == attr_start {
            break;
        }
        let attr_name = input[attr_start..j].to_ascii_lowercase();

        let mut next = j;
        let mut value = "";
        let mut v = skip_whitespace(bytes, j);
        if bytes.get(v) == Some(&b'=') {
            v = skip_whitespace(bytes, v + 1);
            let quoted = match bytes.get(v) {
                Some(&quote @ (b'"' | b'\'')) => {
                    memchr(quote, &bytes[v + 1..]).map(|close| (v + 1, v + 1 + close))
                }
                _ => None,
            };
            if let Some((value_start, value_end)) = quoted {
                value = &input[value_start..value_end];
                next = value_end + 1;
            } else {
                // Unquoted (or an unbalanced quote, which is then part of the value).
                let value_start = v;
                while v < len && bytes[v] != b'>' && !bytes[v].is_ascii_whitespace() {
                    v += 1;
                }
                if v > value_start {
                    value = &input[value_start..v];
                    next = v;
                }
            }
        }
        attributes.insert(attr_name, decode_entities(value));
        k = next;
    }

    k = skip_whitespace(bytes, k);
    let unary = bytes.get(k) == Some(&b'/');
    if unary {
        k = skip_whitespace(bytes, k + 1);
    }
    if bytes.get(k) != Some(&b'>') {
        return StartTagScan::Unterminated;
    }
    StartTagScan::Tag {
        name,
        attributes,
        unary,
        end: k + 1,
    }
}

/// Finds `</name>` (ASCII case-insensitive, whitespace allowed around `/`).
///
/// Returns the byte offsets of the `<` and one past the closing `>`.
fn find_rawtext_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let name = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let lt = i + memchr(b'<', &bytes[i..])?;
        let mut k = skip_whitespace(bytes, lt + 1);
        if bytes.get(k) == Some(&b'/') {
            k = skip_whitespace(bytes, k + 1);
            let after = k + name.len();
            if starts_with_ignore_ascii_case_at(bytes, k, name)
                && !bytes.get(after).copied().is_some_and(is_name_char)
            {
                let gt = memchr(b'>', &bytes[after..])?;
                return Some((lt, after + gt + 1));
            }
        }
        i = lt + 1;
    }
    None
}

/// Unwraps `<!--...-->` and `<![CDATA[...]]>` inside raw text, keeping their bodies.
fn strip_markers(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    loop {
        let comment = rest.find(COMMENT_START).map(|i| (i, COMMENT_START, COMMENT_END));
        let cdata = rest.find(CDATA_START).map(|i| (i, CDATA_START, CDATA_END));
        let next = match (comment, cdata) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        };
        let Some((start, open, close)) = next else {
            out.push_str(rest);
            return out;
        };
        let body_start = start + open.len();
        let Some(rel_end) = rest[body_start..].find(close) else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..start]);
        out.push_str(&rest[body_start..body_start + rel_end]);
        rest = &rest[body_start + rel_end + close.len()..];
    }
}
