//! Token and sentence data structures
//!
//! A [`Token`] is one morphologically analyzed word from a transcript, a
//! [`Sentence`] is the ordered list of tokens for one utterance.
//!
//! Clitics (e.g. the contracted `'s` in `what's`) are encoded during
//! extraction as `host~clitic` in both the form and the tag. The token
//! constructor splits them back apart at the first separator.

use std::fmt;

/// Separator between a host word and its trailing clitic.
///
/// CHAT uses `~` to mark clitic boundaries on the %mor tier, so it never
/// occurs inside a single stem or POS code.
pub const CLITIC_SEP: char = '~';

/// Split a raw `host~clitic` string at the first separator.
///
/// Returns `(raw, "")` when there is no separator.
#[inline]
pub fn split_clitic(raw: &str) -> (&str, &str) {
    match memchr::memchr(CLITIC_SEP as u8, raw.as_bytes()) {
        Some(pos) => (&raw[..pos], &raw[pos + 1..]),
        None => (raw, ""),
    }
}

/// Inverse of [`split_clitic`]
pub fn join_clitic(main: &str, clitic: &str) -> String {
    if clitic.is_empty() {
        main.to_string()
    } else {
        format!("{}{}{}", main, CLITIC_SEP, clitic)
    }
}

/// A morphologically analyzed word
#[derive(Debug, Clone, Default)]
pub struct Token {
    pub form: String,
    pub tag: String,
    pub stem: String,
    /// Inflection code (`PAST`, `PL`, `3S`, ...)
    pub infl: String,
    /// `sfx` for a separable suffix, `sfxf` for one fused with the stem
    pub infl_type: String,
    /// Intended word when the transcribed one was an error
    pub replacement: String,
    pub rel: String,
    /// Relation of the trailing clitic
    pub post_rel: String,
    pub sfx_form: String,
    pub sfx_tag: String,
}

impl Token {
    /// Create a token from raw extracted fields.
    ///
    /// `form` and `tag` may carry a clitic (`what~be`, `pro:int~cop`), which is
    /// moved into `sfx_form` / `sfx_tag`.
    pub fn new(form: &str, tag: &str, stem: &str, infl: &str, infl_type: &str) -> Self {
        let (form, sfx_form) = split_clitic(form);
        let (tag, sfx_tag) = split_clitic(tag);
        Self {
            form: form.to_string(),
            tag: tag.to_string(),
            stem: stem.to_string(),
            infl: infl.to_string(),
            infl_type: infl_type.to_string(),
            replacement: String::new(),
            rel: String::new(),
            post_rel: String::new(),
            sfx_form: sfx_form.to_string(),
            sfx_tag: sfx_tag.to_string(),
        }
    }

    pub fn with_replacement(mut self, replacement: &str) -> Self {
        self.replacement = replacement.to_string();
        self
    }

    pub fn with_rel(mut self, rel: &str) -> Self {
        self.rel = rel.to_string();
        self
    }

    pub fn with_post_rel(mut self, post_rel: &str) -> Self {
        self.post_rel = post_rel.to_string();
        self
    }

    /// True if the transcriber marked this word as standing for another one
    #[inline]
    pub fn is_replaced(&self) -> bool {
        !self.replacement.is_empty()
    }

    /// The form as it appeared before clitic splitting
    pub fn raw_form(&self) -> String {
        join_clitic(&self.form, &self.sfx_form)
    }

    /// The tag as it appeared before clitic splitting
    pub fn raw_tag(&self) -> String {
        join_clitic(&self.tag, &self.sfx_tag)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}, {} | {}, {} | {} | {}, {} | {}, {}>",
            self.form,
            self.tag,
            self.stem,
            self.infl,
            self.infl_type,
            self.replacement,
            self.rel,
            self.post_rel,
            self.sfx_form,
            self.sfx_tag
        )
    }
}

/// One utterance: the tokens spoken, in order, and who spoke them
#[derive(Debug, Clone, Default)]
pub struct Sentence {
    pub speaker: String,
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(speaker: &str, tokens: Vec<Token>) -> Self {
        Self {
            speaker: speaker.to_string(),
            tokens,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }
}

impl std::ops::Index<usize> for Sentence {
    type Output = Token;

    fn index(&self, idx: usize) -> &Token {
        &self.tokens[idx]
    }
}

impl<'a> IntoIterator for &'a Sentence {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*{}:", self.speaker)?;
        for token in &self.tokens {
            write!(f, " {}", token.raw_form())?;
        }
        Ok(())
    }
}
