//! Whitelist sanitizer: tokenizes HTML and re-serializes only what the
//! configuration allows.
//!
//! Output rules:
//! - Start tags are written only for whitelisted elements outside an ignored
//!   subtree; void and self-closed tags are written as `<br/>`.
//! - A disallowed element starts an ignored subtree: descendant tags are
//!   dropped but text is kept. For opaque elements (`script`, `style`) the
//!   text is dropped too.
//! - Attributes are written only when whitelisted; URI attributes must also
//!   pass the validator, `style` is filtered declaration by declaration.
//! - Text and attribute values are entity-encoded; comments are dropped.
//! - A parse error aborts the call with no partial output.
use crate::entities::encode_entities;
use crate::styles::filter_styles;
use crate::tables::{
    CUSTOM_ATTRIBUTES, GENERIC_ATTRIBUTES, URI_ATTRIBUTES, default_valid_elements, is_opaque,
};
use crate::tokenizer;
use crate::types::{Attributes, ParseError, Token, TokenSink};
use crate::uri::default_uri_validator;
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Extra attributes an element may keep while it carries a trigger attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomAttributes {
    pub tag: String,
    pub trigger: String,
    pub attributes: Vec<String>,
}

/// Mutable whitelist configuration. Frozen into a [`Sanitizer`] by [`SanitizerConfig::build`].
#[derive(Clone, Debug)]
pub struct SanitizerConfig {
    valid_elements: HashSet<String>,
    valid_attributes: HashSet<String>,
    uri_attributes: HashSet<String>,
    custom_attributes: Vec<CustomAttributes>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            valid_elements: default_valid_elements().map(str::to_string).collect(),
            valid_attributes: GENERIC_ATTRIBUTES
                .iter()
                .chain(URI_ATTRIBUTES)
                .map(|name| name.to_string())
                .collect(),
            uri_attributes: URI_ATTRIBUTES.iter().map(|name| name.to_string()).collect(),
            custom_attributes: CUSTOM_ATTRIBUTES
                .iter()
                .map(|(tag, trigger, attributes)| CustomAttributes {
                    tag: tag.to_string(),
                    trigger: trigger.to_string(),
                    attributes: attributes.iter().map(|name| name.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl SanitizerConfig {
    /// Empty whitelist: every tag and attribute is dropped.
    pub fn empty() -> Self {
        Self {
            valid_elements: HashSet::new(),
            valid_attributes: HashSet::new(),
            uri_attributes: URI_ATTRIBUTES.iter().map(|name| name.to_string()).collect(),
            custom_attributes: Vec::new(),
        }
    }

    /// Opaque elements stay disallowed whatever the configuration says.
    pub fn allow_element(mut self, name: &str) -> Self {
        self.valid_elements.insert(name.to_ascii_lowercase());
        self
    }

    pub fn deny_element(mut self, name: &str) -> Self {
        self.valid_elements.remove(&name.to_ascii_lowercase());
        self
    }

    pub fn allow_attribute(mut self, name: &str) -> Self {
        self.valid_attributes.insert(name.to_ascii_lowercase());
        self
    }

    pub fn deny_attribute(mut self, name: &str) -> Self {
        self.valid_attributes.remove(&name.to_ascii_lowercase());
        self
    }

    /// Allows `name` and routes its values through the URI validator.
    pub fn allow_uri_attribute(mut self, name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.uri_attributes.insert(name.clone());
        self.valid_attributes.insert(name);
        self
    }

    pub fn custom_attributes(mut self, tag: &str, trigger: &str, attributes: &[&str]) -> Self {
        self.custom_attributes.push(CustomAttributes {
            tag: tag.to_ascii_lowercase(),
            trigger: trigger.to_ascii_lowercase(),
            attributes: attributes.iter().map(|a| a.to_ascii_lowercase()).collect(),
        });
        self
    }

    pub fn build(self) -> Sanitizer {
        Sanitizer { config: self }
    }

    fn allows_element(&self, name: &str) -> bool {
        !is_opaque(name) && self.valid_elements.contains(name)
    }

    fn allows_custom(&self, tag: &str, attributes: &Attributes, name: &str, value: &str) -> bool {
        // Custom rules may never make content editable.
        if name == "contenteditable" && value != "false" {
            return false;
        }
        self.custom_attributes.iter().any(|rule| {
            rule.tag == tag
                && attributes.get(&rule.trigger).is_some_and(|v| !v.is_empty())
                && rule.attributes.iter().any(|a| a == name)
        })
    }
}

/// Immutable sanitizer built from a [`SanitizerConfig`].
#[derive(Clone, Debug)]
pub struct Sanitizer {
    config: SanitizerConfig,
}

impl Default for Sanitizer {
    fn default() -> Self {
        SanitizerConfig::default().build()
    }
}

impl Sanitizer {
    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Sanitizes `html`, consulting `validator(uri, is_image)` for every URI attribute.
    pub fn sanitize<V>(&self, html: &str, validator: V) -> Result<String, ParseError>
    where
        V: Fn(&str, bool) -> bool,
    {
        let mut writer = Writer {
            config: &self.config,
            validator: &validator,
            out: String::with_capacity(html.len()),
            ignore: None,
        };
        tokenizer::parse(html, &mut writer)?;
        Ok(writer.out)
    }
}

/// The process-wide sanitizer with the default whitelist, built on first use.
pub fn default_sanitizer() -> &'static Sanitizer {
    static DEFAULT: OnceLock<Sanitizer> = OnceLock::new();
    DEFAULT.get_or_init(Sanitizer::default)
}

/// Sanitizes with the default whitelist and a caller-supplied URI validator.
pub fn sanitize<V>(html: &str, validator: V) -> Result<String, ParseError>
where
    V: Fn(&str, bool) -> bool,
{
    default_sanitizer().sanitize(html, validator)
}

/// Sanitizes with the default whitelist and [`default_uri_validator`].
pub fn sanitize_default(html: &str) -> Result<String, ParseError> {
    sanitize(html, default_uri_validator)
}

struct Ignored {
    /// Depth of the outermost script-like element, whose text is dropped too.
    opaque_at: Option<usize>,
    /// Open elements inside the ignored subtree, including its root.
    depth: usize,
}

impl Ignored {
    fn suppresses_text(&self) -> bool {
        self.opaque_at.is_some()
    }
}

struct Writer<'a> {
    config: &'a SanitizerConfig,
    validator: &'a dyn Fn(&str, bool) -> bool,
    out: String,
    ignore: Option<Ignored>,
}

impl Writer<'_> {
    fn start_tag(&mut self, name: &str, attributes: &Attributes, self_closing: bool) {
        if let Some(ignored) = self.ignore.as_mut() {
            if !self_closing {
                ignored.depth += 1;
                if ignored.opaque_at.is_none() && is_opaque(name) {
                    ignored.opaque_at = Some(ignored.depth);
                }
            }
            return;
        }
        if !self.config.allows_element(name) {
            log::trace!(target: "html.sanitize", "dropping element <{name}>");
            if !self_closing {
                self.ignore = Some(Ignored {
                    opaque_at: is_opaque(name).then_some(1),
                    depth: 1,
                });
            }
            return;
        }

        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attributes.iter() {
            let Some(value) = self.attribute_value(name, attributes, key, value) else {
                log::trace!(target: "html.sanitize", "dropping attribute {key} on <{name}>");
                continue;
            };
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&encode_entities(&value));
            self.out.push('"');
        }
        self.out.push_str(if self_closing { "/>" } else { ">" });
    }

    fn attribute_value<'v>(
        &self,
        tag: &str,
        attributes: &Attributes,
        key: &str,
        value: &'v str,
    ) -> Option<Cow<'v, str>> {
        if key == "style" {
            let filtered = filter_styles(value);
            if !filtered.is_empty() {
                return Some(Cow::Owned(filtered));
            }
        }
        if self.config.allows_custom(tag, attributes, key, value) {
            return Some(Cow::Borrowed(value));
        }
        if !self.config.valid_attributes.contains(key) {
            return None;
        }
        if self.config.uri_attributes.contains(key) {
            let is_image = (tag == "img" && key == "src") || key == "background";
            if !(self.validator)(value, is_image) {
                return None;
            }
        }
        Some(Cow::Borrowed(value))
    }

    fn end_tag(&mut self, name: &str) {
        if let Some(ignored) = self.ignore.as_mut() {
            if ignored.opaque_at == Some(ignored.depth) {
                ignored.opaque_at = None;
            }
            ignored.depth -= 1;
            if ignored.depth == 0 {
                self.ignore = None;
            }
            return;
        }
        if self.config.allows_element(name) {
            self.out.push_str("</");
            self.out.push_str(name);
            self.out.push('>');
        }
    }
}

impl TokenSink for Writer<'_> {
    fn token(&mut self, token: Token) {
        match token {
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.start_tag(&name, &attributes, self_closing),
            Token::EndTag(name) => self.end_tag(&name),
            Token::Text(text) => {
                if !self.ignore.as_ref().is_some_and(Ignored::suppresses_text) {
                    self.out.push_str(&encode_entities(&text));
                }
            }
            Token::Comment(_) => {}
        }
    }
}
