//! Decoded protocol sentences.
//!
//! A sentence is one already-framed, already-parsed unit of the RouterOS
//! API protocol: a reply word (`!re`, `!done`, `!trap`, ...), a list of
//! attribute pairs, and the tag that associates it with a logical request.
//! Framing and parsing live in the reader that produces sentences; this
//! crate only routes them.

use std::fmt;

/// One decoded protocol sentence.
///
/// The dispatch loop treats the payload as opaque: it reads the tag to
/// route the sentence and hands everything else to the matched handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Reply word, e.g. `!re` or `!done`.
    word: String,

    /// Attribute pairs in wire order, e.g. `("name", "ether1")`.
    attributes: Vec<(String, String)>,

    /// Tag associating this sentence with a request. Empty when the
    /// sentence was sent untagged.
    tag: String,
}

impl Sentence {
    /// Create a sentence with the given reply word, no attributes and no tag.
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            attributes: Vec::new(),
            tag: String::new(),
        }
    }

    /// Set the tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Append an attribute pair.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// The reply word.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// The tag, empty when the sentence was untagged.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// All attribute pairs in wire order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Look up the first attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.word)?;
        for (key, value) in &self.attributes {
            write!(f, " ={}={}", key, value)?;
        }
        if !self.tag.is_empty() {
            write!(f, " .tag={}", self.tag)?;
        }
        Ok(())
    }
}
