//! Tenant-tunable engine settings.
//!
//! Consumed as an immutable snapshot per call. Written through the settings API after
//! validation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Zip codes that earn the location bonus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZipTiers {
    #[serde(default)]
    pub premium: BTreeSet<String>,
    #[serde(default)]
    pub target: BTreeSet<String>,
}

/// Source channel weights, keyed by normalized source name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceWeights {
    pub weights: BTreeMap<String, u8>,
    /// Weight for sources missing from the table
    #[serde(default = "default_source_weight")]
    pub default_weight: u8,
}

fn default_source_weight() -> u8 {
    8
}

impl Default for SourceWeights {
    fn default() -> Self {
        let weights = [
            ("website_form", 15),
            ("phone_inquiry", 15),
            ("referral", 13),
            ("google_ads", 12),
            ("facebook_ads", 9),
            ("door_to_door", 6),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            weights,
            default_weight: default_source_weight(),
        }
    }
}

/// Minimum score for each temperature band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemperatureThresholds {
    pub hot: u8,
    pub warm: u8,
    pub cool: u8,
}

impl Default for TemperatureThresholds {
    fn default() -> Self {
        Self {
            hot: 80,
            warm: 60,
            cool: 40,
        }
    }
}

/// How strictly status changes are governed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Any status may move to any other status
    #[default]
    Permissive,
    /// Only edges in the transition table are allowed
    Strict,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    #[default]
    RoundRobin,
    Territory,
    SkillBased,
}

impl AssignmentStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStrategy::RoundRobin => "round_robin",
            AssignmentStrategy::Territory => "territory",
            AssignmentStrategy::SkillBased => "skill_based",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSettings {
    #[serde(default)]
    pub strategy: AssignmentStrategy,
    /// Fall back to round-robin when no territory matches
    #[serde(default = "default_true")]
    pub territory_fallback: bool,
    /// Run auto-assignment right after intake
    #[serde(default)]
    pub auto_assign_on_intake: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            strategy: AssignmentStrategy::default(),
            territory_fallback: true,
            auto_assign_on_intake: false,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    #[serde(default)]
    pub zip_tiers: ZipTiers,
    #[serde(default)]
    pub source_weights: SourceWeights,
    #[serde(default)]
    pub thresholds: TemperatureThresholds,
    #[serde(default)]
    pub pipeline_mode: PipelineMode,
    #[serde(default)]
    pub assignment: AssignmentSettings,
}
