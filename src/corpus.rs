//! Transcript collections
//!
//! Provides iterator access to transcripts and sentences from:
//! - An in-memory XML string
//! - A single file
//! - A list of files, given explicitly or by glob pattern
//!
//! Iteration is lazy (one file in memory at a time) and restartable: every
//! call to [`Corpus::transcripts`] starts again from the first file.

use crate::token::Sentence;
use crate::transcript::{ExtractOptions, SpeakerFilter, Transcript, TranscriptError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Error while collecting or reading transcripts
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("No files match {0}")]
    NoMatch(String),

    #[error("Failed to read {path}: {source}")]
    Transcript {
        path: String,
        #[source]
        source: TranscriptError,
    },
}

/// Where the transcripts come from
#[derive(Debug, Clone)]
enum CorpusSource {
    /// In-memory XML text
    String(String),
    /// Single file path
    File(PathBuf),
    /// Multiple file paths (from glob or explicit paths)
    Files(Vec<PathBuf>),
}

/// Collection of transcripts
///
/// # Examples
///
/// ```no_run
/// use morphcount::{Corpus, ExtractOptions, SpeakerFilter};
///
/// let corpus = Corpus::from_glob("data/Brown/Adam/*.xml").unwrap();
/// let child = SpeakerFilter::parse("CHI");
/// for sentence in corpus.sentences(&child, &ExtractOptions::default()) {
///     println!("{}", sentence);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Corpus {
    source: CorpusSource,
}

impl Corpus {
    /// Create from in-memory XML
    pub fn from_string(text: &str) -> Self {
        Self {
            source: CorpusSource::String(text.to_string()),
        }
    }

    /// Create from a single file path
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self {
            source: CorpusSource::File(path.as_ref().to_path_buf()),
        }
    }

    /// Create from a glob pattern
    ///
    /// Files are processed in sorted order for deterministic results.
    pub fn from_glob(pattern: &str) -> Result<Self, CorpusError> {
        Ok(Self::from_paths(glob_sorted(pattern)?))
    }

    /// Create from explicit file paths, kept in the given order
    pub fn from_paths(file_paths: Vec<PathBuf>) -> Self {
        Self {
            source: CorpusSource::Files(file_paths),
        }
    }

    /// Create from command-line style inputs: plain paths or glob patterns.
    ///
    /// A pattern that matches nothing is an error; a plain path is taken as
    /// given and only checked when read.
    pub fn from_inputs<S: AsRef<str>>(inputs: &[S]) -> Result<Self, CorpusError> {
        let mut file_paths = Vec::new();
        for input in inputs {
            let input = input.as_ref();
            if input.contains(['*', '?', '[']) {
                let matched = glob_sorted(input)?;
                if matched.is_empty() {
                    return Err(CorpusError::NoMatch(input.to_string()));
                }
                file_paths.extend(matched);
            } else {
                file_paths.push(PathBuf::from(input));
            }
        }
        Ok(Self::from_paths(file_paths))
    }

    /// Number of transcripts the corpus will try to read
    pub fn len(&self) -> usize {
        match &self.source {
            CorpusSource::String(_) | CorpusSource::File(_) => 1,
            CorpusSource::Files(paths) => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read each transcript in turn
    pub fn transcripts(
        &self,
        options: &ExtractOptions,
    ) -> Box<dyn Iterator<Item = Result<Transcript, CorpusError>>> {
        let options = *options;
        match self.source.clone() {
            CorpusSource::String(text) => Box::new(std::iter::once_with(move || {
                Transcript::from_string(&text, &options).map_err(|source| CorpusError::Transcript {
                    path: "<string>".to_string(),
                    source,
                })
            })),
            CorpusSource::File(path) => {
                Box::new(std::iter::once_with(move || read_transcript(&path, &options)))
            }
            CorpusSource::Files(paths) => Box::new(
                paths
                    .into_iter()
                    .map(move |path| read_transcript(&path, &options)),
            ),
        }
    }

    /// The selected speakers' sentences across all transcripts, in order.
    ///
    /// Transcripts that cannot be read are logged and skipped.
    pub fn sentences(
        &self,
        speakers: &SpeakerFilter,
        options: &ExtractOptions,
    ) -> Box<dyn Iterator<Item = Sentence>> {
        let speakers = speakers.clone();
        let iter = self
            .transcripts(options)
            .filter_map(|result| match result {
                Ok(transcript) => Some(transcript),
                Err(e) => {
                    warn!("Skipping transcript: {}", e);
                    None
                }
            })
            .flat_map(move |transcript| {
                let speakers = speakers.clone();
                transcript
                    .sentences
                    .into_iter()
                    .filter(move |s| speakers.accepts(&s.speaker))
            });
        Box::new(iter)
    }
}

fn read_transcript(path: &Path, options: &ExtractOptions) -> Result<Transcript, CorpusError> {
    Transcript::from_file(path, options).map_err(|source| CorpusError::Transcript {
        path: path.display().to_string(),
        source,
    })
}

fn glob_sorted(pattern: &str) -> Result<Vec<PathBuf>, CorpusError> {
    let mut file_paths: Vec<PathBuf> = glob::glob(pattern)?.filter_map(Result::ok).collect();
    file_paths.sort();
    Ok(file_paths)
}
