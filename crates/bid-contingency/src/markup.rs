//! Markup recommendation tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schedule confidence behind a markup recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// Markup range in percent, applied to base bid + weather contingency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupRecommendation {
    pub min: u8,
    pub recommended: u8,
    pub max: u8,
    pub confidence: Confidence,
}

pub const HIGH_CONFIDENCE_MARKUP: MarkupRecommendation = MarkupRecommendation {
    min: 10,
    recommended: 12,
    max: 15,
    confidence: Confidence::High,
};

pub const MEDIUM_CONFIDENCE_MARKUP: MarkupRecommendation = MarkupRecommendation {
    min: 15,
    recommended: 18,
    max: 22,
    confidence: Confidence::Medium,
};

pub const LOW_CONFIDENCE_MARKUP: MarkupRecommendation = MarkupRecommendation {
    min: 20,
    recommended: 25,
    max: 30,
    confidence: Confidence::Low,
};
