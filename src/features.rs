//! Feature definition files
//!
//! Parses feature definitions into [`Feature`]s using a pest grammar.
//! Each definition names a label, the matcher criteria, and optionally a
//! sentence-level heuristic:
//!
//! ```text
//! "regular past"          [suffix="ed", infl_affix="PAST"];
//! "articles"              [form={"the", "a"}];
//! "uncontractible copula" [tag="cop"] uncontractible copula;
//! ```

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::matcher::{
    Feature, Heuristic, Matcher, MatcherConfig, MatcherError, SentenceMatcher, Values,
};

#[derive(Parser)]
#[grammar = "feature_grammar.pest"]
struct FeatureParser;

/// Brown's (1973) grammatical morphemes, as counted by default
pub const DEFAULT_FEATURES: &str = r#"
"present progressive -ing"  [infl="PRESP"];
"in"                        [form="in"];
"on"                        [form="on"];
"plural -s"                 [suffix="s", infl_affix="PL"];
"irregular past"            [infl_fusion="PAST"];
"possessive 's"             [sfx_tag="poss"];
"uncontractible copula"     [tag="cop"] uncontractible copula;
"articles"                  [form={"the", "a"}];
"regular past -ed"          [suffix="ed", infl_affix="PAST"];
"regular third person -s"   [suffix="s", infl_affix="3S"];
"irregular third person"    [tag="v", infl_fusion="3S"];
"uncontractible auxiliary"  [tag="aux", stem="be"] uncontractible auxiliary;
"contractible copula"       [sfx_tag="cop"];
"contractible auxiliary"    [sfx_tag="aux", sfx_form="be"];
"#;

/// Error type for feature definition failures
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Feature definition error: {0}")]
    Syntax(#[from] pest::error::Error<Rule>),

    #[error("Feature definition error: Unknown key: {0}")]
    UnknownKey(String),

    #[error("Feature definition error: {0} takes a single value")]
    ExpectedSingleValue(String),

    #[error("Feature definition error: {0} given more than once")]
    DuplicateKey(String),

    #[error("Feature definition error: Duplicate label: {0}")]
    DuplicateLabel(String),

    #[error("Feature definition error in {label:?}: {source}")]
    Matcher {
        label: String,
        #[source]
        source: MatcherError,
    },
}

/// Parse feature definitions
pub fn parse_features(input: &str) -> Result<Vec<Feature>, FeatureError> {
    let pairs = FeatureParser::parse(Rule::features, input)?;
    let mut features = Vec::new();
    let mut labels = FxHashSet::default();

    for pair in pairs.flat_map(Pair::into_inner) {
        if pair.as_rule() != Rule::feature {
            continue; // EOI
        }
        let feature = parse_feature(pair)?;
        if !labels.insert(feature.label().to_string()) {
            return Err(FeatureError::DuplicateLabel(feature.label().to_string()));
        }
        features.push(feature);
    }

    Ok(features)
}

/// The built-in feature set
pub fn default_features() -> Vec<Feature> {
    parse_features(DEFAULT_FEATURES).expect("built-in feature definitions are valid")
}

/// Parse one definition: "label" [criteria] heuristic?;
fn parse_feature(pair: Pair<Rule>) -> Result<Feature, FeatureError> {
    let mut label = String::new();
    let mut config = MatcherConfig::default();
    let mut heuristic = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::string => label = unescape(part),
            Rule::criteria => {
                for criterion in part.into_inner() {
                    apply_criterion(&mut config, criterion)?;
                }
            }
            Rule::heuristic => heuristic = parse_heuristic(part),
            _ => {}
        }
    }

    config.name = Some(label.clone());
    let matcher = Matcher::new(config).map_err(|source| FeatureError::Matcher { label, source })?;

    Ok(match heuristic {
        Some(heuristic) => SentenceMatcher::new(matcher, heuristic).into(),
        None => matcher.into(),
    })
}

/// Set one key="value" criterion on the config
fn apply_criterion(config: &mut MatcherConfig, pair: Pair<Rule>) -> Result<(), FeatureError> {
    let mut key = "";
    let mut value = None;
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::key => key = part.as_str(),
            Rule::value => value = parse_value(part),
            _ => {}
        }
    }
    let Some(value) = value else {
        return Ok(());
    };

    let duplicate = || FeatureError::DuplicateKey(key.to_string());
    match key {
        "infl" | "infl_affix" | "infl_fusion" => {
            let Values::One(code) = value else {
                return Err(FeatureError::ExpectedSingleValue(key.to_string()));
            };
            let slot = match key {
                "infl" => &mut config.infl,
                "infl_affix" => &mut config.infl_affix,
                _ => &mut config.infl_fusion,
            };
            if slot.replace(code).is_some() {
                return Err(duplicate());
            }
        }
        _ => {
            let slot = match key {
                "form" => &mut config.form,
                "suffix" => &mut config.suffix,
                "rel" => &mut config.rel,
                "post_rel" => &mut config.post_rel,
                "tag" => &mut config.tag,
                "sfx_tag" => &mut config.sfx_tag,
                "sfx_form" => &mut config.sfx_form,
                "stem" => &mut config.stem,
                _ => return Err(FeatureError::UnknownKey(key.to_string())),
            };
            if slot.replace(value).is_some() {
                return Err(duplicate());
            }
        }
    }

    Ok(())
}

/// Parse a quoted string or a {set} of them
fn parse_value(pair: Pair<Rule>) -> Option<Values> {
    let part = pair.into_inner().next()?;
    Some(match part.as_rule() {
        Rule::set => Values::Many(part.into_inner().map(unescape).collect()),
        _ => Values::One(unescape(part)),
    })
}

fn parse_heuristic(pair: Pair<Rule>) -> Option<Heuristic> {
    pair.into_inner().find_map(|part| match part.as_rule() {
        Rule::copula => Some(Heuristic::UncontractibleCopula),
        Rule::auxiliary => Some(Heuristic::UncontractibleAuxiliary),
        _ => None,
    })
}

/// Contents of a quoted string, with \" and \\ resolved
fn unescape(pair: Pair<Rule>) -> String {
    let raw = pair.as_str();
    let raw = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
