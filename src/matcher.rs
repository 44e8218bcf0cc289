//! Feature matchers
//!
//! A [`Matcher`] decides whether a single [`Token`] shows a morphosyntactic
//! feature. It is compiled from a [`MatcherConfig`] into a list of
//! [`Criterion`] values that must all hold.
//!
//! A [`SentenceMatcher`] wraps a matcher for features that depend on where
//! the word sits in the utterance, such as uncontractible copula "be".

use crate::token::{Sentence, Token};
use std::fmt;
use thiserror::Error;

/// `infl_type` of a separable inflectional suffix
pub const INFL_AFFIX: &str = "sfx";
/// `infl_type` of an inflection fused with the stem
pub const INFL_FUSION: &str = "sfxf";

const NEG_TAG: &str = "neg";
const PAST: &str = "PAST";
const DUMMY_AUX: &str = "do";
const PUNCT: &str = "PUNCT";
const SUBJ: &str = "SUBJ";

#[derive(Debug, Error, PartialEq)]
pub enum MatcherError {
    #[error("Matcher has no criteria and would match every token")]
    Empty,

    #[error("Matcher sets both infl_affix ({0}) and infl_fusion ({1})")]
    ConflictingInflection(String, String),
}

/// One accepted value or a set of them
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    One(String),
    Many(Vec<String>),
}

impl Values {
    pub fn many<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Values::Many(values.into_iter().map(Into::into).collect())
    }

    #[inline]
    pub fn contains(&self, s: &str) -> bool {
        match self {
            Values::One(v) => v == s,
            Values::Many(vs) => vs.iter().any(|v| v == s),
        }
    }

    /// True if `s` ends with any of the values
    #[inline]
    pub fn suffix_of(&self, s: &str) -> bool {
        match self {
            Values::One(v) => s.ends_with(v.as_str()),
            Values::Many(vs) => vs.iter().any(|v| s.ends_with(v.as_str())),
        }
    }
}

impl From<&str> for Values {
    fn from(s: &str) -> Self {
        Values::One(s.to_string())
    }
}

impl From<String> for Values {
    fn from(s: String) -> Self {
        Values::One(s)
    }
}

impl<const N: usize> From<[&str; N]> for Values {
    fn from(values: [&str; N]) -> Self {
        Values::many(values)
    }
}

/// A string written as a feature-definition literal: quoted, with only `"`
/// and `\` escaped
pub(crate) struct Quoted<'a>(pub &'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.0.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{}", c)?;
        }
        f.write_str("\"")
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Values::One(v) => write!(f, "{}", Quoted(v)),
            Values::Many(vs) => {
                write!(f, "{{")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", Quoted(v))?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Fields a matcher can be built from. Unset fields are not checked.
#[derive(Debug, Clone, Default)]
pub struct MatcherConfig {
    /// Label for the results table; generated from the criteria if unset
    pub name: Option<String>,
    pub form: Option<Values>,
    /// Inflection code, any inflection type
    pub infl: Option<String>,
    /// Inflection code realized as a separable suffix; overrides `infl`
    pub infl_affix: Option<String>,
    /// Inflection code fused with the stem; overrides `infl`
    pub infl_fusion: Option<String>,
    /// The form must end with (one of) these
    pub suffix: Option<Values>,
    pub rel: Option<Values>,
    pub post_rel: Option<Values>,
    pub tag: Option<Values>,
    pub sfx_tag: Option<Values>,
    /// Stem of the trailing clitic (`be` in `it's`)
    pub sfx_form: Option<Values>,
    pub stem: Option<Values>,
}

/// How the inflection type is constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflKind {
    Any,
    Affix,
    Fusion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Form(Values),
    Infl(String, InflKind),
    Suffix(Values),
    Rel(Values),
    PostRel(Values),
    Tag(Values),
    SfxTag(Values),
    SfxForm(Values),
    Stem(Values),
}

impl Criterion {
    #[inline]
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Criterion::Form(v) => v.contains(&token.form),
            Criterion::Infl(code, kind) => {
                token.infl == *code
                    && match kind {
                        InflKind::Any => true,
                        InflKind::Affix => token.infl_type == INFL_AFFIX,
                        InflKind::Fusion => token.infl_type == INFL_FUSION,
                    }
            }
            Criterion::Suffix(v) => v.suffix_of(&token.form),
            Criterion::Rel(v) => v.contains(&token.rel),
            Criterion::PostRel(v) => v.contains(&token.post_rel),
            Criterion::Tag(v) => v.contains(&token.tag),
            Criterion::SfxTag(v) => v.contains(&token.sfx_tag),
            Criterion::SfxForm(v) => v.contains(&token.sfx_form),
            Criterion::Stem(v) => v.contains(&token.stem),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Form(v) => write!(f, "form={}", v),
            Criterion::Infl(code, InflKind::Any) => write!(f, "infl={}", Quoted(code)),
            Criterion::Infl(code, InflKind::Affix) => write!(f, "infl_affix={}", Quoted(code)),
            Criterion::Infl(code, InflKind::Fusion) => write!(f, "infl_fusion={}", Quoted(code)),
            Criterion::Suffix(v) => write!(f, "suffix={}", v),
            Criterion::Rel(v) => write!(f, "rel={}", v),
            Criterion::PostRel(v) => write!(f, "post_rel={}", v),
            Criterion::Tag(v) => write!(f, "tag={}", v),
            Criterion::SfxTag(v) => write!(f, "sfx_tag={}", v),
            Criterion::SfxForm(v) => write!(f, "sfx_form={}", v),
            Criterion::Stem(v) => write!(f, "stem={}", v),
        }
    }
}

/// A predicate over tokens
#[derive(Debug, Clone)]
pub struct Matcher {
    name: Option<String>,
    label: String,
    criteria: Vec<Criterion>,
}

impl Matcher {
    /// Compile a config. Fails if no criterion is set, or if the
    /// affix and fusion inflection modes are both requested.
    pub fn new(config: MatcherConfig) -> Result<Self, MatcherError> {
        let infl = match (config.infl, config.infl_affix, config.infl_fusion) {
            (_, Some(affix), Some(fusion)) => {
                return Err(MatcherError::ConflictingInflection(affix, fusion));
            }
            (_, Some(affix), None) => Some(Criterion::Infl(affix, InflKind::Affix)),
            (_, None, Some(fusion)) => Some(Criterion::Infl(fusion, InflKind::Fusion)),
            (Some(code), None, None) => Some(Criterion::Infl(code, InflKind::Any)),
            (None, None, None) => None,
        };

        let criteria: Vec<Criterion> = [
            config.form.map(Criterion::Form),
            infl,
            config.suffix.map(Criterion::Suffix),
            config.rel.map(Criterion::Rel),
            config.post_rel.map(Criterion::PostRel),
            config.tag.map(Criterion::Tag),
            config.sfx_tag.map(Criterion::SfxTag),
            config.sfx_form.map(Criterion::SfxForm),
            config.stem.map(Criterion::Stem),
        ]
        .into_iter()
        .flatten()
        .collect();

        if criteria.is_empty() {
            return Err(MatcherError::Empty);
        }

        let label = match &config.name {
            Some(name) => name.clone(),
            None => describe(&criteria),
        };

        Ok(Self {
            name: config.name,
            label,
            criteria,
        })
    }

    /// True if every criterion holds and the token is not a replaced word
    #[inline]
    pub fn matches(&self, token: &Token) -> bool {
        !token.is_replaced() && self.criteria.iter().all(|c| c.matches(token))
    }

    /// Results table key
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn describe(criteria: &[Criterion]) -> String {
    let parts: Vec<String> = criteria.iter().map(ToString::to_string).collect();
    format!("Matcher({})", parts.join(", "))
}

/// Sentence-level heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// Copula "be" in a position where it cannot be contracted
    UncontractibleCopula,
    /// Auxiliary "be" in a position where it cannot be contracted;
    /// dummy "do" is passed over
    UncontractibleAuxiliary,
}

impl Heuristic {
    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::UncontractibleCopula => "uncontractible copula",
            Heuristic::UncontractibleAuxiliary => "uncontractible auxiliary",
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A matcher evaluated in the context of the whole utterance
#[derive(Debug, Clone)]
pub struct SentenceMatcher {
    matcher: Matcher,
    heuristic: Heuristic,
    label: String,
}

impl SentenceMatcher {
    pub fn new(matcher: Matcher, heuristic: Heuristic) -> Self {
        let label = match matcher.name() {
            Some(name) => name.to_string(),
            None => format!("SentenceMatcher({}, {})", matcher, heuristic),
        };
        Self {
            matcher,
            heuristic,
            label,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    /// Whether the sentence contains the feature.
    ///
    /// This approximates a linguistic judgement: the first matching word is
    /// uncontractible if it is negated or past tense, if it opens or closes
    /// the utterance, or if it precedes the subject of a question.
    pub fn matches(&self, sent: &Sentence) -> bool {
        let skip_do = self.heuristic == Heuristic::UncontractibleAuxiliary;

        let mut found = None;
        for (i, token) in sent.iter().enumerate() {
            if !self.matcher.matches(token) || (skip_do && token.stem == DUMMY_AUX) {
                continue;
            }
            // "isn't", "was"
            if token.sfx_tag == NEG_TAG || token.infl == PAST {
                return true;
            }
            found = Some(i);
            break;
        }
        let Some(pos) = found else {
            return false;
        };

        let last = sent.len() - 1;
        if pos == 0 || pos == last || (pos + 1 == last && is_punct(&sent[last])) {
            return true;
        }

        // No subject: probably ungrammatical
        let Some(subj) = sent.iter().position(is_subject) else {
            return false;
        };

        // Inverted question
        pos < subj && sent[last].form == "?"
    }
}

impl fmt::Display for SentenceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn is_punct(token: &Token) -> bool {
    token.tag == PUNCT || token.rel == PUNCT
}

fn is_subject(token: &Token) -> bool {
    token.tag == SUBJ || token.rel == SUBJ
}

/// A feature to count: per token or per utterance
#[derive(Debug, Clone)]
pub enum Feature {
    Token(Matcher),
    Sentence(SentenceMatcher),
}

impl Feature {
    pub fn label(&self) -> &str {
        match self {
            Feature::Token(m) => m.label(),
            Feature::Sentence(m) => m.label(),
        }
    }

    /// Occurrences of the feature in one utterance
    pub fn occurrences(&self, sent: &Sentence) -> u64 {
        match self {
            Feature::Token(m) => sent.iter().filter(|t| m.matches(t)).count() as u64,
            Feature::Sentence(m) => m.matches(sent) as u64,
        }
    }
}

/// Written in the feature definition syntax
impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (matcher, heuristic) = match self {
            Feature::Token(m) => (m, None),
            Feature::Sentence(m) => (m.matcher(), Some(m.heuristic())),
        };
        let criteria: Vec<String> = matcher.criteria().iter().map(ToString::to_string).collect();
        write!(f, "{} [{}]", Quoted(self.label()), criteria.join(", "))?;
        if let Some(heuristic) = heuristic {
            write!(f, " {}", heuristic)?;
        }
        f.write_str(";")
    }
}

impl From<Matcher> for Feature {
    fn from(m: Matcher) -> Self {
        Feature::Token(m)
    }
}

impl From<SentenceMatcher> for Feature {
    fn from(m: SentenceMatcher) -> Self {
        Feature::Sentence(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(form: &str, tag: &str) -> Token {
        Token::new(form, tag, "", "", "")
    }

    fn matcher(config: MatcherConfig) -> Matcher {
        Matcher::new(config).unwrap()
    }

    fn copula() -> Matcher {
        matcher(MatcherConfig {
            tag: Some("cop".into()),
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_config_rejected() {
        assert_eq!(
            Matcher::new(MatcherConfig::default()).unwrap_err(),
            MatcherError::Empty
        );

        // A name alone is not a criterion
        let named = MatcherConfig {
            name: Some("nothing".to_string()),
            ..Default::default()
        };
        assert_eq!(Matcher::new(named).unwrap_err(), MatcherError::Empty);
    }

    #[test]
    fn test_conflicting_inflection_rejected() {
        let config = MatcherConfig {
            infl_affix: Some("PAST".to_string()),
            infl_fusion: Some("PAST".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Matcher::new(config),
            Err(MatcherError::ConflictingInflection(_, _))
        ));
    }

    #[test]
    fn test_form_match() {
        let the = matcher(MatcherConfig {
            form: Some("the".into()),
            ..Default::default()
        });
        assert!(the.matches(&token("the", "det:art")));
        assert!(!the.matches(&token("a", "det:art")));

        let articles = matcher(MatcherConfig {
            form: Some(["the", "a"].into()),
            ..Default::default()
        });
        assert!(articles.matches(&token("the", "det:art")));
        assert!(articles.matches(&token("a", "det:art")));
        assert!(!articles.matches(&token("an", "det:art")));
    }

    #[test]
    fn test_suffix_match() {
        let plural = matcher(MatcherConfig {
            suffix: Some(["s", "es"].into()),
            ..Default::default()
        });
        assert!(plural.matches(&token("dogs", "n")));
        assert!(plural.matches(&token("boxes", "n")));
        assert!(!plural.matches(&token("dog", "n")));
        // Ends with, not equals
        assert!(plural.matches(&token("s", "n")));
    }

    #[test]
    fn test_field_matches() {
        let t = Token::new("that~be", "pro:dem~cop", "that", "", "")
            .with_rel("SUBJ")
            .with_post_rel("ROOT");

        for config in [
            MatcherConfig {
                tag: Some("pro:dem".into()),
                ..Default::default()
            },
            MatcherConfig {
                sfx_tag: Some("cop".into()),
                ..Default::default()
            },
            MatcherConfig {
                sfx_form: Some("be".into()),
                ..Default::default()
            },
            MatcherConfig {
                stem: Some("that".into()),
                ..Default::default()
            },
            MatcherConfig {
                rel: Some(["SUBJ", "OBJ"].into()),
                ..Default::default()
            },
            MatcherConfig {
                post_rel: Some("ROOT".into()),
                ..Default::default()
            },
        ] {
            let m = matcher(config);
            assert!(m.matches(&t), "{} should match {}", m, t);
        }

        let wrong = matcher(MatcherConfig {
            post_rel: Some("COMP".into()),
            ..Default::default()
        });
        assert!(!wrong.matches(&t));
    }

    #[test]
    fn test_affix_and_fusion_disjoint() {
        let affix = matcher(MatcherConfig {
            infl_affix: Some("PAST".to_string()),
            ..Default::default()
        });
        let fusion = matcher(MatcherConfig {
            infl_fusion: Some("PAST".to_string()),
            ..Default::default()
        });
        let any = matcher(MatcherConfig {
            infl: Some("PAST".to_string()),
            ..Default::default()
        });

        let walked = Token::new("walked", "v", "walk", "PAST", "sfx");
        let went = Token::new("went", "v", "go", "PAST", "sfxf");
        let walks = Token::new("walks", "v", "walk", "3S", "sfx");

        assert!(affix.matches(&walked) && !fusion.matches(&walked));
        assert!(fusion.matches(&went) && !affix.matches(&went));
        assert!(any.matches(&walked) && any.matches(&went));
        for t in [&walked, &went, &walks] {
            assert!(!(affix.matches(t) && fusion.matches(t)));
        }
        assert!(!any.matches(&walks));
    }

    #[test]
    fn test_affix_overrides_infl() {
        let m = matcher(MatcherConfig {
            infl: Some("PL".to_string()),
            infl_affix: Some("PAST".to_string()),
            ..Default::default()
        });
        assert_eq!(
            m.criteria(),
            &[Criterion::Infl("PAST".to_string(), InflKind::Affix)]
        );
    }

    #[test]
    fn test_regular_past() {
        let m = matcher(MatcherConfig {
            suffix: Some("ed".into()),
            infl_affix: Some("PAST".to_string()),
            ..Default::default()
        });
        assert!(m.matches(&Token::new("walked", "v", "walk", "PAST", "sfx")));
        assert!(!m.matches(&Token::new("walked", "v", "walk", "PAST", "sfxf")));
        assert!(!m.matches(&Token::new("ran", "v", "run", "PAST", "sfx")));
    }

    #[test]
    fn test_replaced_token_never_matches() {
        let t = Token::new("wat", "v", "watch", "", "").with_replacement("watch");
        for config in [
            MatcherConfig {
                form: Some("wat".into()),
                ..Default::default()
            },
            MatcherConfig {
                tag: Some("v".into()),
                ..Default::default()
            },
            MatcherConfig {
                stem: Some("watch".into()),
                ..Default::default()
            },
            MatcherConfig {
                suffix: Some("t".into()),
                ..Default::default()
            },
        ] {
            assert!(!matcher(config).matches(&t));
        }
    }

    #[test]
    fn test_labels() {
        let m = matcher(MatcherConfig {
            form: Some(["the", "a"].into()),
            suffix: Some("e".into()),
            infl_affix: Some("PAST".to_string()),
            ..Default::default()
        });
        assert_eq!(
            m.label(),
            r#"Matcher(form={"the", "a"}, infl_affix="PAST", suffix="e")"#
        );

        let named = matcher(MatcherConfig {
            name: Some("articles".to_string()),
            form: Some(["the", "a"].into()),
            ..Default::default()
        });
        assert_eq!(named.label(), "articles");
        assert_eq!(named.to_string(), "articles");

        let sm = SentenceMatcher::new(copula(), Heuristic::UncontractibleCopula);
        assert_eq!(
            sm.label(),
            r#"SentenceMatcher(Matcher(tag="cop"), uncontractible copula)"#
        );
    }

    #[test]
    fn test_uncontractible_single_copula() {
        let sm = SentenceMatcher::new(copula(), Heuristic::UncontractibleCopula);
        let sent = Sentence::new("CHI", vec![token("is", "cop").with_rel("ROOT")]);
        assert!(sm.matches(&sent));
    }

    #[test]
    fn test_uncontractible_no_subject() {
        let sm = SentenceMatcher::new(copula(), Heuristic::UncontractibleCopula);
        let sent = Sentence::new(
            "CHI",
            vec![token("that", "pro:dem"), token("is", "cop"), token("big", "adj")],
        );
        assert!(!sm.matches(&sent));
    }

    #[test]
    fn test_uncontractible_no_match() {
        let sm = SentenceMatcher::new(copula(), Heuristic::UncontractibleCopula);
        assert!(!sm.matches(&Sentence::new("CHI", vec![token("doggie", "n")])));
        assert!(!sm.matches(&Sentence::new("CHI", Vec::new())));
    }

    #[test]
    fn test_uncontractible_positions() {
        let sm = SentenceMatcher::new(copula(), Heuristic::UncontractibleCopula);

        // Sentence-final: "here it is"
        let final_cop = Sentence::new(
            "CHI",
            vec![token("here", "adv"), token("it", "pro").with_rel("SUBJ"), token("is", "cop")],
        );
        assert!(sm.matches(&final_cop));

        // Before final punctuation: "here it is ."
        let before_punct = Sentence::new(
            "CHI",
            vec![
                token("here", "adv"),
                token("it", "pro").with_rel("SUBJ"),
                token("is", "cop"),
                token(".", "PUNCT").with_rel("PUNCT"),
            ],
        );
        assert!(sm.matches(&before_punct));

        // Contractible: "it is big ."
        let medial = Sentence::new(
            "CHI",
            vec![
                token("it", "pro").with_rel("SUBJ"),
                token("is", "cop"),
                token("big", "adj"),
                token(".", "PUNCT"),
            ],
        );
        assert!(!sm.matches(&medial));
    }

    #[test]
    fn test_uncontractible_question() {
        let sm = SentenceMatcher::new(copula(), Heuristic::UncontractibleCopula);

        // "where is it ?"
        let question = Sentence::new(
            "CHI",
            vec![
                token("where", "pro:int"),
                token("is", "cop"),
                token("it", "pro").with_rel("SUBJ"),
                token("?", "PUNCT"),
            ],
        );
        assert!(sm.matches(&question));

        // Same words as a statement
        let statement = Sentence::new(
            "CHI",
            vec![
                token("where", "pro:int"),
                token("is", "cop"),
                token("it", "pro").with_rel("SUBJ"),
                token(".", "PUNCT"),
            ],
        );
        assert!(!sm.matches(&statement));
    }

    #[test]
    fn test_uncontractible_negation_and_past() {
        let sm = SentenceMatcher::new(copula(), Heuristic::UncontractibleCopula);

        let negated = Sentence::new(
            "CHI",
            vec![
                token("it", "pro").with_rel("SUBJ"),
                Token::new("is~n't", "cop~neg", "be", "", ""),
                token("big", "adj"),
            ],
        );
        assert!(sm.matches(&negated));

        let past = Sentence::new(
            "CHI",
            vec![
                token("it", "pro").with_rel("SUBJ"),
                Token::new("was", "cop", "be", "PAST", "sfxf"),
                token("big", "adj"),
            ],
        );
        assert!(sm.matches(&past));
    }

    #[test]
    fn test_auxiliary_skips_do() {
        let aux = matcher(MatcherConfig {
            tag: Some("aux".into()),
            ..Default::default()
        });

        // "do you like it": "do" is skipped, nothing else matches
        let sent = Sentence::new(
            "MOT",
            vec![
                Token::new("do", "aux", "do", "", ""),
                token("you", "pro").with_rel("SUBJ"),
                token("like", "v"),
                token("it", "pro"),
            ],
        );
        assert!(
            !SentenceMatcher::new(aux.clone(), Heuristic::UncontractibleAuxiliary).matches(&sent)
        );
        // The copula heuristic does not skip it
        assert!(SentenceMatcher::new(aux, Heuristic::UncontractibleCopula).matches(&sent));
    }

    #[test]
    fn test_feature_occurrences() {
        let articles: Feature = matcher(MatcherConfig {
            form: Some(["the", "a"].into()),
            ..Default::default()
        })
        .into();
        let sent = Sentence::new(
            "CHI",
            vec![token("the", "det"), token("dog", "n"), token("a", "det")],
        );
        assert_eq!(articles.occurrences(&sent), 2);

        let uncontractible: Feature =
            SentenceMatcher::new(copula(), Heuristic::UncontractibleCopula).into();
        assert_eq!(uncontractible.occurrences(&sent), 0);
        let is = Sentence::new("CHI", vec![token("is", "cop")]);
        assert_eq!(uncontractible.occurrences(&is), 1);
    }
}
