//! Morphcount: grammatical morpheme counts from CHILDES transcripts
//!
//! Reads TalkBank XML transcripts, matches declarative token features
//! against each utterance, and tabulates how often the target child and
//! the adults produce each feature at every age.
//! Core implementation in Rust with Python bindings.

pub mod age; // CHAT ages and age-coded file names
pub mod aggregate; // Counts by feature and age
pub mod corpus; // Transcript collections from files and globs
pub mod features; // Feature definition language
pub mod matcher; // Token and sentence predicates
pub mod token; // Token and sentence data structures
pub mod transcript; // TalkBank XML extraction

// Python bindings
#[cfg(feature = "pyo3")]
pub mod python;

// Re-exports for convenience
pub use age::{Age, AgeError};
pub use aggregate::{AggregateError, Aggregator, Counts, Results, RunSummary};
pub use corpus::{Corpus, CorpusError};
pub use features::{FeatureError, default_features, parse_features};
pub use matcher::{
    Feature, Heuristic, Matcher, MatcherConfig, MatcherError, SentenceMatcher, Values,
};
pub use token::{Sentence, Token};
pub use transcript::{ExtractOptions, Participant, SpeakerFilter, Transcript, TranscriptError};
