// src/config/profile.rs
//! The single reader profile the ranker scores against.
//!
//! Loaded once (TOML), validated, then only ever borrowed immutably.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::config::{load_toml_or, ENV_PROFILE_PATH};

pub const PREFER_PRACTICAL: &str = "prefer_practical";
pub const PREFER_TECHNICAL_DEPTH: &str = "prefer_technical_depth";
pub const PREFER_RESEARCH_BREAKTHROUGHS: &str = "prefer_research_breakthroughs";
pub const PREFER_PRODUCTION_FOCUS: &str = "prefer_production_focus";
pub const AVOID_MARKETING_HYPE: &str = "avoid_marketing_hype";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub background: String,
    /// Ordered; earlier interests are listed first in match reports.
    pub interests: Vec<String>,
    #[serde(default)]
    pub preferences: BTreeMap<String, bool>,
    #[serde(default)]
    pub expertise_level: String,
}

impl Profile {
    /// Load from `path`, or the built-in profile when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let raw: Profile = load_toml_or(path, ENV_PROFILE_PATH, Self::default_seed)?;
        raw.validated()
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let raw: Profile = toml::from_str(s)?;
        raw.validated()
    }

    /// Trim fields, drop blank and case-insensitive duplicate interests
    /// (first spelling wins), and reject profiles that cannot rank anything.
    pub fn validated(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            bail!("profile: `name` must not be empty");
        }

        let mut seen = HashSet::new();
        self.interests = self
            .interests
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty() && seen.insert(i.to_lowercase()))
            .collect();
        if self.interests.is_empty() {
            bail!("profile `{}`: at least one interest is required", self.name);
        }

        self.preferences = self
            .preferences
            .into_iter()
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v))
            .filter(|(k, _)| !k.is_empty())
            .collect();

        Ok(self)
    }

    /// True when the named preference flag is present and enabled.
    pub fn prefers(&self, flag: &str) -> bool {
        self.preferences.get(flag).copied().unwrap_or(false)
    }

    /// Built-in profile used when no profile file is deployed.
    pub fn default_seed() -> Self {
        let interests = [
            "Large Language Models (LLMs) and applied use cases",
            "Retrieval-Augmented Generation (RAG) systems",
            "AI agent architectures and orchestration frameworks",
            "Multimodal AI and vision-language models",
            "Production AI systems and MLOps fundamentals",
            "Research papers with practical implementation value",
            "System design for scalable AI applications",
            "End-to-end AI pipelines from prototype to deployment",
        ];
        let preferences = [
            PREFER_PRACTICAL,
            PREFER_TECHNICAL_DEPTH,
            PREFER_RESEARCH_BREAKTHROUGHS,
            PREFER_PRODUCTION_FOCUS,
            AVOID_MARKETING_HYPE,
        ];
        Self {
            name: "Reader".to_string(),
            title: "AI Engineer".to_string(),
            background: "AI engineer focused on building practical, production-ready AI systems, \
                         with a strong interest in applied research and real-world deployment challenges."
                .to_string(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            preferences: preferences.iter().map(|p| (p.to_string(), true)).collect(),
            expertise_level: "Junior".to_string(),
        }
    }
}
