/// A single tokenizer event.
///
/// Names are ASCII-lowercased. Text, comment and attribute payloads are
/// entity-decoded. Tokens are transient: they are produced and consumed within
/// one parse call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
    Comment(String),
}

/// Attributes in first-seen order; a repeated name keeps its first position
/// and takes the last value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (k, v) in iter {
            attributes.insert(k, v);
        }
        attributes
    }
}

/// Receives tokens as the tokenizer produces them.
pub trait TokenSink {
    fn token(&mut self, token: Token);
}

impl TokenSink for Vec<Token> {
    fn token(&mut self, token: Token) {
        self.push(token);
    }
}

/// Parse failure: the tokenizer could not make progress on its input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unable to parse html at byte {position}: {excerpt:?}")]
pub struct ParseError {
    pub position: usize,
    /// Up to the first 64 bytes of the input the tokenizer was stuck on.
    pub excerpt: String,
}
