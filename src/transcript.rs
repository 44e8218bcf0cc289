//! TalkBank XML transcript reading
//!
//! Turns a CHILDES transcript in the TalkBank XML schema into one
//! [`Sentence`] per utterance. Each `<w>` element yields a [`Token`] carrying
//! its surface form together with the stem, inflection, POS and grammatical
//! relation found in the word's `<mor>` annotation.
//!
//! Schema: https://talkbank.org/software/xsddoc/

use crate::age::Age;
use crate::token::{CLITIC_SEP, Sentence, Token};
use flate2::read::GzDecoder;
use roxmltree::{Document, Node, ParsingOptions};
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// TalkBank XML namespace
pub const NS: &str = "http://www.talkbank.org/ns/talkbank";

/// `gra` type of the gold-standard relation pass, which is not used
const GOLD_GRA_TYPE: &str = "grt";

/// Error while reading a transcript
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Which speakers' utterances to extract
#[derive(Debug, Clone, Default)]
pub enum SpeakerFilter {
    /// Every participant
    #[default]
    All,
    /// Only the listed speaker codes
    Only(FxHashSet<String>),
    /// Everybody except the listed speaker codes
    Except(FxHashSet<String>),
}

impl SpeakerFilter {
    pub fn only<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SpeakerFilter::Only(codes.into_iter().map(Into::into).collect())
    }

    pub fn except<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SpeakerFilter::Except(codes.into_iter().map(Into::into).collect())
    }

    /// Parse `ALL` or a comma-separated list of speaker codes
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s == "ALL" {
            return SpeakerFilter::All;
        }
        SpeakerFilter::only(s.split(',').map(str::trim).filter(|c| !c.is_empty()))
    }

    #[inline]
    pub fn accepts(&self, who: &str) -> bool {
        match self {
            SpeakerFilter::All => true,
            SpeakerFilter::Only(codes) => codes.contains(who),
            SpeakerFilter::Except(codes) => !codes.contains(who),
        }
    }
}

/// Extraction switches
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Strip trailing whitespace from word text
    pub strip_space: bool,
    /// Emit the utterance terminator as a final `PUNCT` token
    pub terminators: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strip_space: true,
            terminators: false,
        }
    }
}

/// Parse transcript text into an XML document
pub fn parse_document(text: &str) -> Result<Document<'_>, TranscriptError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(text, options)?)
}

/// Extract the sentences of the selected speakers from a transcript.
///
/// Returns one sentence per utterance in document order, including
/// utterances without any words.
pub fn extract(
    doc: &Document,
    speakers: &SpeakerFilter,
    options: &ExtractOptions,
) -> Vec<Sentence> {
    doc.descendants()
        .filter(|n| is(*n, "u"))
        .filter_map(|u| {
            let who = u.attribute("who").unwrap_or_default();
            speakers
                .accepts(who)
                .then(|| extract_utterance(u, who, options))
        })
        .collect()
}

/// Build the sentence for one `<u>` element
fn extract_utterance(u: Node, who: &str, options: &ExtractOptions) -> Sentence {
    let mut tokens: Vec<Token> = Vec::new();
    // Open <replacement> whose words still belong to the previous token
    let mut pending: Option<Node<'_, '_>> = None;

    for w in u.descendants().filter(|n| is(*n, "w")) {
        if pending.is_some_and(|replacement| w.ancestors().any(|a| a == replacement)) {
            if let Some(last) = tokens.last_mut() {
                let text = word_text(w, options);
                if !last.replacement.is_empty() {
                    last.replacement.push(' ');
                }
                last.replacement.push_str(&text);
            }
            continue;
        }

        tokens.push(parse_word(w, options));
        pending = w.descendants().find(|n| is(*n, "replacement"));
    }

    if options.terminators {
        if let Some(t) = child(u, "t") {
            let symbol = terminator_symbol(t.attribute("type").unwrap_or_default());
            tokens.push(Token::new(symbol, "PUNCT", "", "", "").with_rel("PUNCT"));
        }
    }

    Sentence::new(who, tokens)
}

/// Build a token from one `<w>` element
fn parse_word(w: Node, options: &ExtractOptions) -> Token {
    let mut form = word_text(w, options);

    // The word's own analysis, or that of its replacement
    let Some(mor) = w.descendants().find(|n| is(*n, "mor")) else {
        return Token::new(&form, "", "", "", "");
    };
    let post = child(mor, "mor-post");

    let stem = find_outside_post(mor, "stem")
        .map(node_text)
        .unwrap_or_default();

    let (infl, infl_type) = children(mor, "mw")
        .flat_map(|mw| children(mw, "mk"))
        .next()
        .map(|mk| (node_text(mk), mk.attribute("type").unwrap_or_default()))
        .unwrap_or_default();

    let post_mw = post.and_then(|p| child(p, "mw"));
    let sfx_stem = post_mw
        .and_then(|mw| child(mw, "stem"))
        .map(node_text)
        .unwrap_or_default();
    if !sfx_stem.is_empty() {
        form.push(CLITIC_SEP);
        form.push_str(sfx_stem);
    }

    let mut tag = find_outside_post(mor, "pos").map(pos_tag).unwrap_or_default();
    let sfx_tag = post_mw
        .and_then(|mw| child(mw, "pos"))
        .map(pos_tag)
        .unwrap_or_default();
    if !sfx_tag.is_empty() {
        tag.push(CLITIC_SEP);
        tag.push_str(&sfx_tag);
    }

    let rel = relation(mor);
    let post_rel = post.map(relation).unwrap_or_default();

    Token::new(&form, &tag, stem, infl, infl_type)
        .with_rel(rel)
        .with_post_rel(post_rel)
}

/// The word's own text, before any child element
fn word_text(w: Node, options: &ExtractOptions) -> String {
    let text = w.text().unwrap_or_default();
    if options.strip_space {
        text.trim_end().to_string()
    } else {
        text.to_string()
    }
}

/// `c` or `c:s` from a `<pos>` element
fn pos_tag(pos: Node) -> String {
    let category = child(pos, "c").map(node_text).unwrap_or_default();
    match child(pos, "s").map(node_text) {
        Some(sub) if !category.is_empty() => format!("{}:{}", category, sub),
        _ => category.to_string(),
    }
}

/// Relation label of the first non-gold `<gra>` directly under `mor`
fn relation<'a>(mor: Node<'a, '_>) -> &'a str {
    children(mor, "gra")
        .find(|gra| gra.attribute("type") != Some(GOLD_GRA_TYPE))
        .and_then(|gra| gra.attribute("relation"))
        .unwrap_or_default()
}

/// CHAT symbol for a terminator type
fn terminator_symbol(kind: &str) -> &'static str {
    match kind {
        "p" => ".",
        "q" => "?",
        "e" => "!",
        "broken for coding" => "+.",
        "trail off" => "+...",
        "trail off question" => "+..?",
        "question exclamation" => "+!?",
        "interruption" => "+/.",
        "interruption question" => "+/?",
        "self interruption" => "+//.",
        "self interruption question" => "+//?",
        "quotation next line" => "+\"/.",
        "quotation precedes" => "+\".",
        _ => ".",
    }
}

#[inline]
fn is(node: Node, name: &str) -> bool {
    node.is_element() && node.has_tag_name((NS, name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is(*n, name))
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| is(*n, name))
}

/// First descendant called `name` that is not part of a clitic's `mor-post`
fn find_outside_post<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    for el in node.children().filter(Node::is_element) {
        if is(el, name) {
            return Some(el);
        }
        if is(el, "mor-post") {
            continue;
        }
        if let Some(found) = find_outside_post(el, name) {
            return Some(found);
        }
    }
    None
}

fn node_text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or_default()
}

/// A participant declared in the transcript header
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub role: String,
    pub age: Option<Age>,
}

/// An extracted transcript: its participants and every utterance
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub path: Option<PathBuf>,
    pub participants: Vec<Participant>,
    pub sentences: Vec<Sentence>,
}

impl Transcript {
    /// Extract a transcript from in-memory XML
    pub fn from_string(text: &str, options: &ExtractOptions) -> Result<Self, TranscriptError> {
        let doc = parse_document(text)?;
        Ok(Self::from_document(&doc, options))
    }

    /// Extract a transcript from a file; `.gz` files are decompressed
    pub fn from_file(path: &Path, options: &ExtractOptions) -> Result<Self, TranscriptError> {
        let text = read_source(path)?;
        let mut transcript = Self::from_string(&text, options)?;
        transcript.path = Some(path.to_path_buf());
        Ok(transcript)
    }

    /// Extract participants and all speakers' sentences from a document
    pub fn from_document(doc: &Document, options: &ExtractOptions) -> Self {
        Self {
            path: None,
            participants: participants(doc),
            sentences: extract(doc, &SpeakerFilter::All, options),
        }
    }

    /// Sentences of the selected speakers, in document order
    pub fn sentences<'a>(
        &'a self,
        speakers: &'a SpeakerFilter,
    ) -> impl Iterator<Item = &'a Sentence> {
        self.sentences.iter().filter(|s| speakers.accepts(&s.speaker))
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Age of a speaker, falling back to an age encoded in the file name
    pub fn age_of(&self, speaker: &str) -> Option<Age> {
        self.participant(speaker)
            .and_then(|p| p.age)
            .or_else(|| self.path.as_deref().and_then(Age::from_file_name))
    }
}

fn participants(doc: &Document) -> Vec<Participant> {
    doc.descendants()
        .filter(|n| is(*n, "participant"))
        .map(|p| {
            let id = p.attribute("id").unwrap_or_default();
            let age = p.attribute("age").and_then(|raw| match Age::parse(raw) {
                Ok(age) => Some(age),
                Err(e) => {
                    warn!("Ignoring age of participant {}: {}", id, e);
                    None
                }
            });
            Participant {
                id: id.to_string(),
                role: p.attribute("role").unwrap_or_default().to_string(),
                age,
            }
        })
        .collect()
}

/// Read a file to a string, decompressing `.gz` files
fn read_source(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut text = String::new();
    if path.extension().is_some_and(|ext| ext == "gz") {
        GzDecoder::new(file).read_to_string(&mut text)?;
    } else {
        file.read_to_string(&mut text)?;
    }
    Ok(text)
}
