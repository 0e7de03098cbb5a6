// src/ranking.rs
//! Profile relevance: interest matching, preference bonuses/penalties, and the
//! total order the selector truncates.

use anyhow::{bail, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::profile::{
    Profile, AVOID_MARKETING_HYPE, PREFER_PRACTICAL, PREFER_PRODUCTION_FOCUS,
    PREFER_RESEARCH_BREAKTHROUGHS, PREFER_TECHNICAL_DEPTH,
};
use crate::config::{load_toml_or, ENV_RANKING_CONFIG_PATH};
use crate::ingest::types::Item;

/// Derived terms this short are matched on word boundaries ("RAG" must not hit "leverage").
pub const SHORT_TERM_MAX_LEN: usize = 4;

/// An item with its profile relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: Item,
    pub relevance_score: f32,
    pub matched_interests: Vec<String>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

fn default_interest_weight() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub ranking: RankingSection,
    /// Keyed by profile preference flag; applied only when the flag is enabled.
    #[serde(default)]
    pub preferences: BTreeMap<String, PreferenceRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingSection {
    /// Added once per matched interest.
    #[serde(default = "default_interest_weight")]
    pub interest_weight: f32,
}

impl Default for RankingSection {
    fn default() -> Self {
        Self {
            interest_weight: default_interest_weight(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreferenceRule {
    /// Signed: positive boosts, negative penalizes.
    pub weight: f32,
    pub keywords: Vec<String>,
}

impl RankingConfig {
    /// Load from `path`, or the built-in table when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let cfg: RankingConfig = load_toml_or(path, ENV_RANKING_CONFIG_PATH, Self::default_seed)?;
        cfg.validated()
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: RankingConfig = toml::from_str(s)?;
        cfg.validated()
    }

    fn validated(mut self) -> Result<Self> {
        let w = self.ranking.interest_weight;
        if !w.is_finite() || w <= 0.0 {
            bail!("ranking.interest_weight must be a positive number, got {w}");
        }
        for (name, rule) in self.preferences.iter_mut() {
            if !rule.weight.is_finite() {
                bail!("preferences.{name}.weight must be finite");
            }
            rule.keywords = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
        }
        Ok(self)
    }

    /// Built-in weight table.
    pub fn default_seed() -> Self {
        let rule = |weight: f32, kws: &[&str]| PreferenceRule {
            weight,
            keywords: kws.iter().map(|s| s.to_string()).collect(),
        };
        let mut preferences = BTreeMap::new();
        preferences.insert(
            PREFER_PRACTICAL.to_string(),
            rule(
                0.5,
                &[
                    "tutorial", "how to", "hands-on", "walkthrough", "guide", "build",
                    "implementation", "step by step", "cookbook", "code", "example",
                ],
            ),
        );
        preferences.insert(
            PREFER_TECHNICAL_DEPTH.to_string(),
            rule(
                0.5,
                &[
                    "architecture", "deep dive", "internals", "benchmark", "technical",
                    "evaluation", "fine-tuning", "inference", "under the hood",
                ],
            ),
        );
        preferences.insert(
            PREFER_RESEARCH_BREAKTHROUGHS.to_string(),
            rule(
                0.5,
                &["research", "paper", "breakthrough", "state-of-the-art", "arxiv", "novel"],
            ),
        );
        preferences.insert(
            PREFER_PRODUCTION_FOCUS.to_string(),
            rule(
                0.5,
                &[
                    "production", "deploy", "scaling", "scalable", "mlops", "latency",
                    "monitoring", "reliability", "observability",
                ],
            ),
        );
        preferences.insert(
            AVOID_MARKETING_HYPE.to_string(),
            rule(
                -1.5,
                &[
                    "marketing", "campaign", "revolutionary", "game-changer", "game changer",
                    "unprecedented", "exclusive offer", "exclusive access", "limited time",
                    "sign up", "webinar",
                    "customer story", "launch event",
                ],
            ),
        );
        Self {
            ranking: RankingSection::default(),
            preferences,
        }
    }
}

/* ----------------------------
Compiled matchers
---------------------------- */

#[derive(Debug)]
enum Term {
    /// Lowercased substring.
    Substring(String),
    /// Case-insensitive whole-word match.
    Word(Regex),
}

impl Term {
    fn build(raw: &str) -> Result<Self> {
        let t = raw.trim();
        if t.chars().count() <= SHORT_TERM_MAX_LEN {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(t)))?;
            Ok(Term::Word(re))
        } else {
            Ok(Term::Substring(t.to_lowercase()))
        }
    }

    fn matches(&self, text: &str, text_lower: &str) -> bool {
        match self {
            Term::Substring(s) => text_lower.contains(s.as_str()),
            Term::Word(re) => re.is_match(text),
        }
    }

    fn label(&self) -> String {
        match self {
            Term::Substring(s) => s.clone(),
            Term::Word(re) => re
                .as_str()
                .trim_start_matches(r"(?i)\b")
                .trim_end_matches(r"\b")
                .replace('\\', ""),
        }
    }
}

/// Preference keyword anchored at a word start, so "deploy" still hits
/// "deployment" but "sign up" never hits "design upgrades".
#[derive(Debug)]
struct Keyword {
    label: String,
    re: Regex,
}

impl Keyword {
    fn build(kw: &str) -> Result<Self> {
        let anchor = if kw.starts_with(|c: char| c.is_alphanumeric()) { r"\b" } else { "" };
        Ok(Self {
            label: kw.to_string(),
            re: Regex::new(&format!("(?i){anchor}{}", regex::escape(kw)))?,
        })
    }
}

#[derive(Debug)]
struct CompiledInterest {
    interest: String,
    phrase: Term,
    derived: Vec<Term>,
}

static RE_PARENS: once_cell::sync::Lazy<Regex> =
    once_cell::sync::Lazy::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

/// Extra match terms for a long interest phrase:
/// - parenthesised acronyms ("RAG", "LLMs" plus its singular "LLM")
/// - the head before the parenthesis ("Retrieval-Augmented Generation")
/// - the phrase without the parentheses, split on " and " / ",", when multi-word
fn derive_terms(interest: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in RE_PARENS.captures_iter(interest) {
        for part in caps[1].split([',', '/']) {
            let acr = part.trim();
            if acr.is_empty() {
                continue;
            }
            out.push(acr.to_string());
            if acr.len() > 2 && acr.ends_with('s') {
                out.push(acr[..acr.len() - 1].to_string());
            }
        }
    }

    if let Some((head, _)) = interest.split_once('(') {
        let head = head.trim();
        if head.split_whitespace().count() >= 2 {
            out.push(head.to_string());
        }
    }

    let stripped = RE_PARENS.replace_all(interest, " ");
    let stripped = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    for seg in stripped.split(" and ").flat_map(|s| s.split(',')) {
        let seg = seg.trim();
        if seg.split_whitespace().count() >= 2 && !seg.eq_ignore_ascii_case(interest.trim()) {
            out.push(seg.to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    out.retain(|t| seen.insert(t.to_lowercase()));
    out
}

/// Scores items against one profile. Built once per run.
#[derive(Debug)]
pub struct Ranker {
    interest_weight: f32,
    interests: Vec<CompiledInterest>,
    /// (flag, weight, keywords) for enabled preference flags only.
    rules: Vec<(String, f32, Vec<Keyword>)>,
}

impl Ranker {
    pub fn new(profile: &Profile, cfg: &RankingConfig) -> Result<Self> {
        let interests = profile
            .interests
            .iter()
            .map(|i| {
                let derived = derive_terms(i)
                    .iter()
                    .map(|t| Term::build(t))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledInterest {
                    interest: i.clone(),
                    phrase: Term::build(i)?,
                    derived,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut rules = Vec::new();
        for (flag, rule) in &cfg.preferences {
            if profile.prefers(flag) {
                let keywords = rule
                    .keywords
                    .iter()
                    .map(|k| Keyword::build(k))
                    .collect::<Result<Vec<_>>>()?;
                rules.push((flag.clone(), rule.weight, keywords));
            }
        }
        for flag in profile.preferences.keys() {
            if !cfg.preferences.contains_key(flag) {
                tracing::debug!(flag = %flag, "profile preference has no ranking rule");
            }
        }

        Ok(Self {
            interest_weight: cfg.ranking.interest_weight,
            interests,
            rules,
        })
    }

    /// Score one item. Never drops it; an unmatched item scores 0.
    pub fn score(&self, item: Item) -> ScoredItem {
        let text = format!("{} {}", item.title, item.summary.as_deref().unwrap_or_default());
        let text_lower = text.to_lowercase();

        let mut matched = Vec::new();
        let mut reasons = Vec::new();
        for ci in &self.interests {
            let hit = std::iter::once(&ci.phrase)
                .chain(ci.derived.iter())
                .find(|t| t.matches(&text, &text_lower));
            if let Some(t) = hit {
                matched.push(ci.interest.clone());
                reasons.push(format!("interest:{}", t.label().to_lowercase()));
            }
        }
        let mut score = self.interest_weight * matched.len() as f32;

        let pref_text = format!("{} {}", text_lower, item.metadata_text().to_lowercase());
        for (flag, weight, keywords) in &self.rules {
            if let Some(kw) = keywords.iter().find(|k| k.re.is_match(&pref_text)) {
                score += *weight;
                reasons.push(format!("pref:{flag}:{}", kw.label));
            }
        }

        ScoredItem {
            item,
            relevance_score: score,
            matched_interests: matched,
            reasons,
        }
    }

    /// Score all items and sort: score desc, then newer first, then input order.
    pub fn rank(&self, items: Vec<Item>) -> Vec<ScoredItem> {
        let mut scored: Vec<ScoredItem> = items.into_iter().map(|it| self.score(it)).collect();
        scored.sort_by(|a, b| {
            b.relevance_score
                .total_cmp(&a.relevance_score)
                .then_with(|| b.item.published_at.cmp(&a.item.published_at))
        });
        scored
    }
}
