//! Feature counts by child age
//!
//! The [`Aggregator`] runs every feature over every transcript and sums the
//! counts into a [`Results`] table keyed by feature label and age in months.

use crate::corpus::Corpus;
use crate::matcher::Feature;
use crate::transcript::{ExtractOptions, SpeakerFilter, Transcript};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::io::{self, Write};
use std::ops::{Add, AddAssign};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Speaker code of the target child in CHILDES transcripts
pub const DEFAULT_CHILD: &str = "CHI";

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("No age for {child} in {path}")]
    NoAge { child: String, path: String },
}

/// Occurrence and utterance counts for the child and the adults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub child_occurrences: u64,
    pub child_utterances: u64,
    pub adult_occurrences: u64,
    pub adult_utterances: u64,
}

impl Counts {
    /// Child occurrences per utterance
    pub fn child_ratio(&self) -> f64 {
        ratio(self.child_occurrences, self.child_utterances)
    }

    /// Adult occurrences per utterance
    pub fn adult_ratio(&self) -> f64 {
        ratio(self.adult_occurrences, self.adult_utterances)
    }
}

fn ratio(occurrences: u64, utterances: u64) -> f64 {
    if utterances == 0 {
        0.0
    } else {
        occurrences as f64 / utterances as f64
    }
}

impl Add for Counts {
    type Output = Counts;

    fn add(self, other: Counts) -> Counts {
        Counts {
            child_occurrences: self.child_occurrences + other.child_occurrences,
            child_utterances: self.child_utterances + other.child_utterances,
            adult_occurrences: self.adult_occurrences + other.adult_occurrences,
            adult_utterances: self.adult_utterances + other.adult_utterances,
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, other: Counts) {
        *self = *self + other;
    }
}

/// One line of the results table
#[derive(Debug, Clone, Serialize)]
pub struct Row<'a> {
    pub feature: &'a str,
    pub age: u32,
    #[serde(flatten)]
    pub counts: Counts,
    pub child_ratio: f64,
    pub adult_ratio: f64,
}

/// Counts by feature label and age in months
///
/// Labels keep their first-recorded order; ages are sorted when read.
#[derive(Debug, Clone, Default)]
pub struct Results {
    label_ids: FxHashMap<String, usize>,
    labels: Vec<String>,
    by_age: Vec<FxHashMap<u32, Counts>>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add counts for a feature at an age, summing with what is there
    pub fn record(&mut self, label: &str, age: u32, counts: Counts) {
        let id = match self.label_ids.get(label) {
            Some(&id) => id,
            None => {
                let id = self.labels.len();
                self.label_ids.insert(label.to_string(), id);
                self.labels.push(label.to_string());
                self.by_age.push(FxHashMap::default());
                id
            }
        };
        *self.by_age[id].entry(age).or_default() += counts;
    }

    /// Feature labels in first-recorded order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, label: &str, age: u32) -> Option<Counts> {
        let id = *self.label_ids.get(label)?;
        self.by_age[id].get(&age).copied()
    }

    /// Counts for one feature, by ascending age
    pub fn ages(&self, label: &str) -> Vec<(u32, Counts)> {
        let Some(&id) = self.label_ids.get(label) else {
            return Vec::new();
        };
        let mut ages: Vec<(u32, Counts)> = self.by_age[id].iter().map(|(&a, &c)| (a, c)).collect();
        ages.sort_unstable_by_key(|&(age, _)| age);
        ages
    }

    /// All rows: features in order, ages ascending within each
    pub fn rows(&self) -> Vec<Row<'_>> {
        self.labels
            .iter()
            .flat_map(|label| {
                self.ages(label).into_iter().map(move |(age, counts)| Row {
                    feature: label,
                    age,
                    counts,
                    child_ratio: counts.child_ratio(),
                    adult_ratio: counts.adult_ratio(),
                })
            })
            .collect()
    }

    /// Write the table as tab-separated values with a header line
    pub fn write_tsv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(
            out,
            "feature\tage\tchild_occ\tchild_utts\tchild_ratio\tadult_occ\tadult_utts\tadult_ratio"
        )?;
        for row in self.rows() {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{:.4}\t{}\t{}\t{:.4}",
                row.feature,
                row.age,
                row.counts.child_occurrences,
                row.counts.child_utterances,
                row.child_ratio,
                row.counts.adult_occurrences,
                row.counts.adult_utterances,
                row.adult_ratio
            )?;
        }
        out.flush()
    }

    /// Write the rows as a JSON array
    pub fn write_json<W: Write>(&self, out: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(out, &self.rows())
    }
}

/// Summary of a corpus run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
}

/// Counts features over transcripts
#[derive(Debug, Clone)]
pub struct Aggregator {
    features: Vec<Feature>,
    child: String,
    children: SpeakerFilter,
    adults: SpeakerFilter,
    explicit_adults: bool,
    options: ExtractOptions,
    results: Results,
}

impl Aggregator {
    /// Count `features` for the child `CHI` against every other speaker
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            child: DEFAULT_CHILD.to_string(),
            children: SpeakerFilter::only([DEFAULT_CHILD]),
            adults: SpeakerFilter::except([DEFAULT_CHILD]),
            explicit_adults: false,
            options: ExtractOptions {
                strip_space: true,
                terminators: true,
            },
            results: Results::new(),
        }
    }

    /// Use another speaker code for the target child
    pub fn with_child(mut self, code: &str) -> Self {
        self.child = code.to_string();
        self.children = SpeakerFilter::only([code]);
        if !self.explicit_adults {
            self.adults = SpeakerFilter::except([code]);
        }
        self
    }

    /// Count only these speakers as adults
    pub fn with_adults(mut self, adults: SpeakerFilter) -> Self {
        self.adults = adults;
        self.explicit_adults = true;
        self
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn into_results(self) -> Results {
        self.results
    }

    /// Merge counts into the results table
    pub fn record(&mut self, label: &str, age: u32, counts: Counts) {
        self.results.record(label, age, counts);
    }

    /// Count every feature in one transcript.
    ///
    /// Returns the child's age in months. Transcripts without utterances
    /// by either group add nothing.
    pub fn process(&mut self, transcript: &Transcript) -> Result<u32, AggregateError> {
        let path = transcript
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<string>".to_string());
        let age = transcript
            .age_of(&self.child)
            .ok_or_else(|| AggregateError::NoAge {
                child: self.child.clone(),
                path: path.clone(),
            })?
            .in_months();

        let child_utterances = transcript.sentences(&self.children).count() as u64;
        let adult_utterances = transcript.sentences(&self.adults).count() as u64;
        debug!(
            "{}: age {} months, {} child / {} adult utterances",
            path, age, child_utterances, adult_utterances
        );
        if child_utterances + adult_utterances == 0 {
            return Ok(age);
        }

        for feature in &self.features {
            let counts = Counts {
                child_occurrences: transcript
                    .sentences(&self.children)
                    .map(|s| feature.occurrences(s))
                    .sum(),
                child_utterances,
                adult_occurrences: transcript
                    .sentences(&self.adults)
                    .map(|s| feature.occurrences(s))
                    .sum(),
                adult_utterances,
            };
            self.results.record(feature.label(), age, counts);
        }

        Ok(age)
    }

    /// Process every transcript of a corpus, skipping those that fail
    pub fn run(&mut self, corpus: &Corpus) -> RunSummary {
        let mut summary = RunSummary::default();

        for result in corpus.transcripts(&self.options) {
            let processed = match result {
                Ok(transcript) => self.process(&transcript).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match processed {
                Ok(_) => summary.processed += 1,
                Err(e) => {
                    warn!("Skipping file: {}", e);
                    summary.skipped += 1;
                }
            }
        }

        info!(
            "Processed {} transcripts, skipped {}",
            summary.processed, summary.skipped
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parse_features;
    use crate::transcript::tests::chat;

    const ADAM: &str = r#"<participant id="CHI" role="Target_Child" age="P2Y3M4D"/>
        <participant id="MOT" role="Mother"/>"#;

    const WALKED: &str = r#"<w>walked<mor type="mor"><mw><pos><c>v</c></pos><stem>walk</stem><mk type="sfx">PAST</mk></mw>
        <gra type="gra" index="1" head="0" relation="ROOT"/></mor></w>"#;

    fn features(defs: &str) -> Vec<Feature> {
        parse_features(defs).unwrap()
    }

    #[test]
    fn test_counts_add() {
        let a = Counts {
            child_occurrences: 1,
            child_utterances: 2,
            adult_occurrences: 3,
            adult_utterances: 4,
        };
        let mut b = a;
        b += a;
        assert_eq!(b.child_occurrences, 2);
        assert_eq!(b.adult_utterances, 8);
        assert_eq!(b.child_ratio(), 0.5);
        assert_eq!(Counts::default().adult_ratio(), 0.0);
    }

    #[test]
    fn test_results_record_and_order() {
        let mut results = Results::new();
        let one = Counts {
            child_occurrences: 1,
            child_utterances: 10,
            ..Default::default()
        };

        results.record("plural", 30, one);
        results.record("articles", 24, one);
        results.record("plural", 24, one);
        results.record("plural", 30, one);

        assert_eq!(results.labels(), ["plural", "articles"]);
        assert_eq!(results.get("plural", 30).unwrap().child_utterances, 20);
        assert_eq!(results.get("plural", 31), None);
        assert_eq!(results.get("missing", 30), None);

        let ages: Vec<u32> = results.ages("plural").iter().map(|(a, _)| *a).collect();
        assert_eq!(ages, [24, 30]);

        let rows = results.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!((rows[0].feature, rows[0].age), ("plural", 24));
        assert_eq!((rows[2].feature, rows[2].age), ("articles", 24));
    }

    #[test]
    fn test_regular_past_end_to_end() {
        let text = chat(ADAM, &format!(r#"<u who="CHI" uID="u0">{}</u>"#, WALKED));
        let transcript = Transcript::from_string(&text, &ExtractOptions::default()).unwrap();

        let mut aggregator =
            Aggregator::new(features(r#""regular past" [suffix="ed", infl_affix="PAST"];"#));
        assert_eq!(aggregator.process(&transcript).unwrap(), 27);

        let counts = aggregator.results().get("regular past", 27).unwrap();
        assert_eq!(counts.child_occurrences, 1);
        assert_eq!(counts.child_utterances, 1);
        assert_eq!(counts.adult_occurrences, 0);
        assert_eq!(counts.adult_utterances, 0);
    }

    #[test]
    fn test_child_and_adult_counts() {
        let body = format!(
            r#"<u who="CHI" uID="u0">{walked}</u>
               <u who="CHI" uID="u1"><w>no</w></u>
               <u who="MOT" uID="u2">{walked}<w>and</w>{walked}</u>
               <u who="FAT" uID="u3"/>"#,
            walked = WALKED
        );
        let transcript =
            Transcript::from_string(&chat(ADAM, &body), &ExtractOptions::default()).unwrap();

        let mut aggregator = Aggregator::new(features(r#""past" [infl_affix="PAST"];"#));
        aggregator.process(&transcript).unwrap();
        assert_eq!(
            aggregator.results().get("past", 27).unwrap(),
            Counts {
                child_occurrences: 1,
                child_utterances: 2,
                adult_occurrences: 2,
                adult_utterances: 2,
            }
        );

        let mut mother_only = Aggregator::new(features(r#""past" [infl_affix="PAST"];"#))
            .with_adults(SpeakerFilter::parse("MOT"));
        mother_only.process(&transcript).unwrap();
        assert_eq!(mother_only.results().get("past", 27).unwrap().adult_utterances, 1);
    }

    #[test]
    fn test_sentence_feature_counts_utterances() {
        let body = r#"<u who="CHI" uID="u0"><w>is<mor type="mor"><mw><pos><c>cop</c></pos><stem>be</stem></mw></mor></w><t type="p"/></u>
            <u who="CHI" uID="u1"><w>it</w><w>is<mor type="mor"><mw><pos><c>cop</c></pos><stem>be</stem></mw></mor></w><w>big</w><w>and</w><t type="p"/></u>"#;
        let mut aggregator =
            Aggregator::new(features(r#""cop" [tag="cop"] uncontractible copula;"#));
        let transcript = Transcript::from_string(&chat(ADAM, body), aggregator.options()).unwrap();
        aggregator.process(&transcript).unwrap();

        let counts = aggregator.results().get("cop", 27).unwrap();
        assert_eq!(counts.child_occurrences, 1);
        assert_eq!(counts.child_utterances, 2);
    }

    #[test]
    fn test_no_age() {
        let text = chat(
            r#"<participant id="CHI" role="Target_Child"/>"#,
            r#"<u who="CHI"><w>hi</w></u>"#,
        );
        let transcript = Transcript::from_string(&text, &ExtractOptions::default()).unwrap();

        let mut aggregator = Aggregator::new(features(r#""hi" [form="hi"];"#));
        assert!(matches!(
            aggregator.process(&transcript),
            Err(AggregateError::NoAge { .. })
        ));
        assert!(aggregator.results().is_empty());
    }

    #[test]
    fn test_oversized_age_skipped() {
        let text = chat(
            r#"<participant id="CHI" role="Target_Child" age="P999999999Y"/>"#,
            r#"<u who="CHI"><w>hi</w></u>"#,
        );
        let transcript = Transcript::from_string(&text, &ExtractOptions::default()).unwrap();
        assert_eq!(transcript.participant("CHI").unwrap().age, None);

        let mut aggregator = Aggregator::new(features(r#""hi" [form="hi"];"#));
        assert!(matches!(
            aggregator.process(&transcript),
            Err(AggregateError::NoAge { .. })
        ));
        assert!(aggregator.results().is_empty());
    }

    #[test]
    fn test_other_child_code() {
        let text = chat(
            r#"<participant id="ROS" role="Target_Child" age="P3Y"/>"#,
            r#"<u who="ROS"><w>hi</w></u><u who="MOT"><w>hi</w></u>"#,
        );
        let transcript = Transcript::from_string(&text, &ExtractOptions::default()).unwrap();

        let mut aggregator = Aggregator::new(features(r#""hi" [form="hi"];"#)).with_child("ROS");
        assert_eq!(aggregator.process(&transcript).unwrap(), 36);
        let counts = aggregator.results().get("hi", 36).unwrap();
        assert_eq!(counts.child_occurrences, 1);
        assert_eq!(counts.adult_occurrences, 1);
    }

    #[test]
    fn test_run_skips_and_sums() {
        use std::fs;

        let dir = tempfile::tempdir().unwrap();
        let one = chat(ADAM, &format!(r#"<u who="CHI" uID="u0">{}</u>"#, WALKED));
        let no_age = chat(
            r#"<participant id="CHI" role="Target_Child"/>"#,
            &format!(r#"<u who="CHI" uID="u0">{}</u>"#, WALKED),
        );
        fs::write(dir.path().join("a.xml"), &one).unwrap();
        fs::write(dir.path().join("b.xml"), &one).unwrap();
        fs::write(dir.path().join("c.xml"), &no_age).unwrap();
        fs::write(dir.path().join("d.xml"), "<CHAT>").unwrap();

        let corpus = Corpus::from_glob(&format!("{}/*.xml", dir.path().display())).unwrap();
        let mut aggregator = Aggregator::new(features(r#""past" [infl_affix="PAST"];"#));
        let summary = aggregator.run(&corpus);

        assert_eq!(summary, RunSummary { processed: 2, skipped: 2 });
        let counts = aggregator.results().get("past", 27).unwrap();
        assert_eq!(counts.child_occurrences, 2);
        assert_eq!(counts.child_utterances, 2);
    }

    #[test]
    fn test_write_tsv_and_json() {
        let mut results = Results::new();
        results.record(
            "plural -s",
            27,
            Counts {
                child_occurrences: 1,
                child_utterances: 4,
                adult_occurrences: 3,
                adult_utterances: 6,
            },
        );

        let mut tsv = Vec::new();
        results.write_tsv(&mut tsv).unwrap();
        let tsv = String::from_utf8(tsv).unwrap();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("feature\tage\t"));
        assert_eq!(lines[1], "plural -s\t27\t1\t4\t0.2500\t3\t6\t0.5000");

        let mut json = Vec::new();
        results.write_json(&mut json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value[0]["feature"], "plural -s");
        assert_eq!(value[0]["age"], 27);
        assert_eq!(value[0]["child_occurrences"], 1);
        assert_eq!(value[0]["adult_ratio"], 0.5);
    }
}
