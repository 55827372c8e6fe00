//! Bid Contingency Estimator
//!
//! Prices weather risk into a construction bid. Takes the base costs, the
//! project's delay cost parameters and a weather-risk analysis computed
//! upstream (from the resolved station's history), and returns a weather
//! contingency breakdown plus a markup recommendation.
//!
//! # Contingency Model
//!
//! ```text
//! likely   = round(non_workable_days × delay_factor(risk))
//! overhead = likely × daily_overhead_rate
//! labor    = base_labor × (likely / total_days) × labor_delay_multiplier
//! penalty  = likely × delay_penalty_per_day
//! remob    = base_equipment × remobilization_factor(extreme_events)
//! ```
//!
//! | Risk score | Delay factor |
//! |------------|--------------|
//! | ≤ 30       | 0.3          |
//! | ≤ 60       | 0.5          |
//! | > 60       | 0.7          |
//!
//! | Condition                    | Markup (min/rec/max) | Confidence |
//! |------------------------------|----------------------|------------|
//! | risk ≤ 30 and workable ≥ 80% | 10 / 12 / 15         | High       |
//! | risk ≤ 60 and workable ≥ 65% | 15 / 18 / 22         | Medium     |
//! | otherwise                    | 20 / 25 / 30         | Low        |

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod estimator;
pub mod markup;

pub use estimator::{BidContingencyEstimator, EstimatorConfig};
pub use markup::{Confidence, MarkupRecommendation};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BidError {
    #[error("Enter at least one base cost (labor, materials, or equipment)")]
    NoBaseCosts,
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, BidError>;

/// Base bid costs before weather contingency
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseCosts {
    #[serde(default)]
    pub labor: f64,
    #[serde(default)]
    pub materials: f64,
    #[serde(default)]
    pub equipment: f64,
}

impl BaseCosts {
    pub fn total(&self) -> f64 {
        self.labor + self.materials + self.equipment
    }
}

/// Daily delay cost parameters of the project
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectParams {
    pub daily_overhead_rate: f64,
    pub delay_penalty_per_day: f64,
    pub labor_delay_multiplier: f64,
}

impl Default for ProjectParams {
    fn default() -> Self {
        Self {
            daily_overhead_rate: 2000.0,
            delay_penalty_per_day: 0.0,
            labor_delay_multiplier: 1.5,
        }
    }
}

/// Weather-risk analysis of the project window, computed upstream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// 0 (benign) to 100 (severe)
    pub risk_score: f64,
    pub total_days: u32,
    pub workable_days: u32,
    pub non_workable_days: u32,
    #[serde(default)]
    pub extreme_event_count: u32,
}

/// A bid estimation request as read from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRequest {
    pub base_costs: BaseCosts,
    #[serde(default)]
    pub project_params: ProjectParams,
    pub risk_analysis: RiskAnalysis,
}

/// Best / most likely / worst case weather delay in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayDayRange {
    pub min: u32,
    pub likely: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContingencyBreakdown {
    pub delay_overhead_cost: f64,
    pub delay_labor_cost: f64,
    pub delay_penalty_cost: f64,
    pub remobilization_cost: f64,
    pub total: f64,
    /// Contingency as a percentage of the base bid
    pub contingency_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRecommendation {
    pub base_costs: BaseCosts,
    pub base_bid: f64,
    pub weather_contingency: ContingencyBreakdown,
    pub total_bid_with_contingency: f64,
    pub delay_days: DelayDayRange,
    pub markup: MarkupRecommendation,
    pub risk_score: f64,
    pub workable_percent: f64,
}

impl fmt::Display for BidRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "base {:.2} + contingency {:.2} ({:.1}%) = {:.2}; delay {}/{}/{} days; markup {}% ({})",
            self.base_bid,
            self.weather_contingency.total,
            self.weather_contingency.contingency_percent,
            self.total_bid_with_contingency,
            self.delay_days.min,
            self.delay_days.likely,
            self.delay_days.max,
            self.markup.recommended,
            self.markup.confidence,
        )
    }
}
