//! HTML tokenizer, entity codec and whitelist sanitizer for editor content.
//!
//! The tokenizer is a single forward pass with a small open-element stack; it
//! is not an HTML5 tree builder. The sanitizer consumes its token stream and
//! writes back only whitelisted markup.
pub mod tables;

mod entities;
mod sanitize;
mod styles;
mod tokenizer;
mod types;
mod uri;

pub use crate::entities::{decode_entities, encode_entities, escape_text};
pub use crate::sanitize::{
    CustomAttributes, Sanitizer, SanitizerConfig, default_sanitizer, sanitize, sanitize_default,
};
pub use crate::styles::filter_styles;
pub use crate::tokenizer::{parse, tokenize};
pub use crate::types::{Attributes, ParseError, Token, TokenSink};
pub use crate::uri::default_uri_validator;
