//! Localization key chains.
//!
//! A key is split on `.` into positioned tokens:
//!
//! ```text
//! <module>.form.<formName>[.<groupName>[.<fieldToken>(.<fieldToken>)*]]
//!    0      1       2            3             4 ...
//! ```
//!
//! Empty tokens are kept (`"a."` has two tokens), and every token knows its
//! exact range in the original text, shifted by the offset the caller
//! passes when the key sits inside a larger literal.

use std::fmt;
use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::base::constants::{
    FIRST_FIELD_TOKEN_INDEX, FORM_NAME_TOKEN_INDEX, FORM_TOKEN, GROUP_TOKEN_INDEX, KEY_DELIMITER,
    MODULE_TOKEN_INDEX, TYPE_TOKEN_INDEX,
};

/// One segment of a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyChainToken {
    pub text: Arc<str>,
    /// Range of the segment, including the caller's offset.
    pub range: TextRange,
    pub index: usize,
}

/// What a form localization key addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormKeyKind {
    /// `m.form.f`
    Form,
    /// `m.form.f.g`
    Group,
    /// `m.form.f.g.x[.y...]`
    Field,
}

/// An immutable, tokenized localization key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyChain {
    key: Arc<str>,
    offset: TextSize,
    tokens: Vec<KeyChainToken>,
}

impl KeyChain {
    /// Tokenize a key that starts at offset 0.
    pub fn parse(key: &str) -> Self {
        Self::parse_at(key, TextSize::from(0))
    }

    /// Tokenize a key whose first character sits at `offset` in the enclosing text.
    pub fn parse_at(key: &str, offset: TextSize) -> Self {
        let mut tokens = Vec::new();
        let mut start = 0usize;
        for (index, segment) in key.split(KEY_DELIMITER).enumerate() {
            let begin = offset + TextSize::from(start as u32);
            let end = begin + TextSize::of(segment);
            tokens.push(KeyChainToken {
                text: Arc::from(segment),
                range: TextRange::new(begin, end),
                index,
            });
            start += segment.len() + KEY_DELIMITER.len_utf8();
        }
        Self {
            key: Arc::from(key),
            offset,
            tokens,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn offset(&self) -> TextSize {
        self.offset
    }

    pub fn tokens(&self) -> &[KeyChainToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, index: usize) -> Option<&KeyChainToken> {
        self.tokens.get(index)
    }

    fn text(&self, index: usize) -> Option<&str> {
        self.token(index).map(|t| t.text.as_ref())
    }

    pub fn module(&self) -> Option<&str> {
        self.text(MODULE_TOKEN_INDEX)
    }

    pub fn type_token(&self) -> Option<&str> {
        self.text(TYPE_TOKEN_INDEX)
    }

    pub fn form(&self) -> Option<&str> {
        self.text(FORM_NAME_TOKEN_INDEX)
    }

    pub fn group(&self) -> Option<&str> {
        self.text(GROUP_TOKEN_INDEX)
    }

    /// Tokens after the group, possibly empty.
    pub fn field_tokens(&self) -> &[KeyChainToken] {
        self.tokens.get(FIRST_FIELD_TOKEN_INDEX..).unwrap_or_default()
    }

    /// Classify as a form localization key, or `None` if it is not one.
    pub fn classify(&self) -> Option<FormKeyKind> {
        if self.len() < 3 || self.type_token() != Some(FORM_TOKEN) {
            return None;
        }
        Some(match self.len() {
            3 => FormKeyKind::Form,
            4 => FormKeyKind::Group,
            _ => FormKeyKind::Field,
        })
    }

    pub fn is_form_key(&self) -> bool {
        self.classify().is_some()
    }

    /// Key text up to and including token `index`.
    pub fn prefix(&self, index: usize) -> Option<&str> {
        let token = self.token(index)?;
        let end = u32::from(token.range.end() - self.offset) as usize;
        self.key.get(..end)
    }

    /// Token whose range contains `offset` (inclusive at the end, so a caret
    /// right after a segment still selects it).
    pub fn token_at(&self, offset: TextSize) -> Option<&KeyChainToken> {
        self.tokens
            .iter()
            .find(|t| t.range.contains_inclusive(offset))
    }
}

impl fmt::Display for KeyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Split a key into a chain and classify it.
pub fn classify(key: &str) -> Option<FormKeyKind> {
    KeyChain::parse(key).classify()
}
