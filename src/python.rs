//! Python bindings for morphcount
//!
//! This module provides PyO3-based Python bindings for the Rust core.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

use crate::aggregate::{AggregateError, Aggregator};
use crate::matcher::{Feature, Heuristic, Matcher, MatcherConfig, SentenceMatcher, Values};
use crate::token::Token;
use crate::transcript::{ExtractOptions, SpeakerFilter, Transcript, TranscriptError};

/// Convert TranscriptError to Python exception
impl From<TranscriptError> for PyErr {
    fn from(err: TranscriptError) -> PyErr {
        match err {
            TranscriptError::Io(e) => PyIOError::new_err(e.to_string()),
            TranscriptError::Xml(e) => PyValueError::new_err(format!("XML error: {}", e)),
        }
    }
}

impl From<AggregateError> for PyErr {
    fn from(err: AggregateError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[pyclass(name = "Token")]
#[derive(Clone)]
pub struct PyToken {
    pub(crate) inner: Token,
}

#[pymethods]
impl PyToken {
    #[getter]
    fn form(&self) -> &str {
        &self.inner.form
    }

    #[getter]
    fn tag(&self) -> &str {
        &self.inner.tag
    }

    #[getter]
    fn stem(&self) -> &str {
        &self.inner.stem
    }

    #[getter]
    fn infl(&self) -> &str {
        &self.inner.infl
    }

    #[getter]
    fn infl_type(&self) -> &str {
        &self.inner.infl_type
    }

    #[getter]
    fn replacement(&self) -> &str {
        &self.inner.replacement
    }

    #[getter]
    fn rel(&self) -> &str {
        &self.inner.rel
    }

    #[getter]
    fn post_rel(&self) -> &str {
        &self.inner.post_rel
    }

    #[getter]
    fn sfx_form(&self) -> &str {
        &self.inner.sfx_form
    }

    #[getter]
    fn sfx_tag(&self) -> &str {
        &self.inner.sfx_tag
    }

    fn __repr__(&self) -> String {
        format!("<Token {}>", self.inner)
    }
}

/// Read one transcript file into (speaker, tokens) pairs.
///
/// Args:
///     path: Path to a TalkBank XML file (.xml or .xml.gz)
///     speakers: "ALL" (default) or comma-separated speaker codes
///     strip_space: Strip trailing whitespace from word forms
///     terminators: Add the utterance terminator as a final token
///
/// Returns:
///     List of (speaker, [Token]) tuples, one per utterance
#[pyfunction]
#[pyo3(signature = (path, speakers="ALL", strip_space=true, terminators=false))]
fn extract_file(
    path: &str,
    speakers: &str,
    strip_space: bool,
    terminators: bool,
) -> PyResult<Vec<(String, Vec<PyToken>)>> {
    let options = ExtractOptions {
        strip_space,
        terminators,
    };
    let transcript = Transcript::from_file(&PathBuf::from(path), &options)?;
    let speakers = SpeakerFilter::parse(speakers);

    Ok(transcript
        .sentences(&speakers)
        .map(|s| {
            let tokens = s
                .iter()
                .map(|t| PyToken { inner: t.clone() })
                .collect();
            (s.speaker.clone(), tokens)
        })
        .collect())
}

/// A string or a list of strings
#[derive(FromPyObject)]
enum PyValues {
    One(String),
    Many(Vec<String>),
}

impl From<PyValues> for Values {
    fn from(values: PyValues) -> Self {
        match values {
            PyValues::One(v) => Values::One(v),
            PyValues::Many(vs) => Values::Many(vs),
        }
    }
}

/// A morphosyntactic feature to count.
///
/// Every given criterion must hold for a token to match. Passing
/// heuristic="copula" or heuristic="auxiliary" makes it an utterance-level
/// uncontractible feature.
///
/// Example:
///     >>> past = Matcher(name="regular past", suffix="ed", infl_affix="PAST")
///     >>> articles = Matcher(form=["the", "a"])
#[pyclass(name = "Matcher")]
#[derive(Clone)]
pub struct PyMatcher {
    inner: Feature,
}

#[pymethods]
impl PyMatcher {
    #[new]
    #[pyo3(signature = (
        name=None, form=None, infl=None, infl_affix=None, infl_fusion=None, suffix=None,
        rel=None, post_rel=None, tag=None, sfx_tag=None, sfx_form=None, stem=None,
        heuristic=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        name: Option<String>,
        form: Option<PyValues>,
        infl: Option<String>,
        infl_affix: Option<String>,
        infl_fusion: Option<String>,
        suffix: Option<PyValues>,
        rel: Option<PyValues>,
        post_rel: Option<PyValues>,
        tag: Option<PyValues>,
        sfx_tag: Option<PyValues>,
        sfx_form: Option<PyValues>,
        stem: Option<PyValues>,
        heuristic: Option<&str>,
    ) -> PyResult<Self> {
        let config = MatcherConfig {
            name,
            form: form.map(Into::into),
            infl,
            infl_affix,
            infl_fusion,
            suffix: suffix.map(Into::into),
            rel: rel.map(Into::into),
            post_rel: post_rel.map(Into::into),
            tag: tag.map(Into::into),
            sfx_tag: sfx_tag.map(Into::into),
            sfx_form: sfx_form.map(Into::into),
            stem: stem.map(Into::into),
        };
        let matcher = Matcher::new(config).map_err(|e| PyValueError::new_err(e.to_string()))?;

        let inner = match heuristic {
            None => matcher.into(),
            Some("copula") => SentenceMatcher::new(matcher, Heuristic::UncontractibleCopula).into(),
            Some("auxiliary") => {
                SentenceMatcher::new(matcher, Heuristic::UncontractibleAuxiliary).into()
            }
            Some(other) => {
                return Err(PyValueError::new_err(format!(
                    "Unknown heuristic: {} (expected 'copula' or 'auxiliary')",
                    other
                )));
            }
        };
        Ok(PyMatcher { inner })
    }

    #[getter]
    fn label(&self) -> &str {
        self.inner.label()
    }

    /// Whether a single token matches; for utterance-level features the
    /// heuristic is not applied
    fn matches(&self, token: &PyToken) -> bool {
        match &self.inner {
            Feature::Token(m) => m.matches(&token.inner),
            Feature::Sentence(m) => m.matcher().matches(&token.inner),
        }
    }

    fn __repr__(&self) -> String {
        format!("Matcher({})", self.inner)
    }
}

/// Count features in one transcript file.
///
/// Args:
///     path: Path to a TalkBank XML file (.xml or .xml.gz)
///     matchers: Features to count
///     child: Speaker code of the target child
///
/// Returns:
///     List of (feature, age, child_occ, child_utts, adult_occ, adult_utts)
///
/// Raises:
///     ValueError: If the child's age cannot be determined
#[pyfunction]
#[pyo3(signature = (path, matchers, child="CHI"))]
fn count_file(
    path: &str,
    matchers: Vec<PyMatcher>,
    child: &str,
) -> PyResult<Vec<(String, u32, u64, u64, u64, u64)>> {
    let features = matchers.into_iter().map(|m| m.inner).collect();
    let mut aggregator = Aggregator::new(features).with_child(child);
    let transcript = Transcript::from_file(&PathBuf::from(path), aggregator.options())?;
    aggregator.process(&transcript)?;

    Ok(aggregator
        .results()
        .rows()
        .into_iter()
        .map(|row| {
            (
                row.feature.to_string(),
                row.age,
                row.counts.child_occurrences,
                row.counts.child_utterances,
                row.counts.adult_occurrences,
                row.counts.adult_utterances,
            )
        })
        .collect())
}

#[pyfunction]
fn __version__() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pymodule]
fn morphcount(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyToken>()?;
    m.add_class::<PyMatcher>()?;

    m.add_function(wrap_pyfunction!(extract_file, m)?)?;
    m.add_function(wrap_pyfunction!(count_file, m)?)?;
    m.add_function(wrap_pyfunction!(__version__, m)?)?;

    Ok(())
}
