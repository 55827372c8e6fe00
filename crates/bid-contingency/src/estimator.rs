//! Weather contingency estimation
//!
//! Calibration constants are fixed policy values, not derived from data.
//! [`EstimatorConfig::default`] is built from them.

use crate::markup::{
    MarkupRecommendation, HIGH_CONFIDENCE_MARKUP, LOW_CONFIDENCE_MARKUP, MEDIUM_CONFIDENCE_MARKUP,
};
use crate::{
    BaseCosts, BidError, BidRecommendation, ContingencyBreakdown, DelayDayRange, ProjectParams,
    Result, RiskAnalysis,
};
use tracing::debug;

/// Upper bound (inclusive) of the low risk tier
pub const LOW_RISK_MAX_SCORE: f64 = 30.0;
/// Upper bound (inclusive) of the medium risk tier
pub const MEDIUM_RISK_MAX_SCORE: f64 = 60.0;

/// Share of non-workable days that turn into schedule delay, per risk tier
pub const LOW_RISK_DELAY_FACTOR: f64 = 0.3;
pub const MEDIUM_RISK_DELAY_FACTOR: f64 = 0.5;
pub const HIGH_RISK_DELAY_FACTOR: f64 = 0.7;

/// Best / worst case multipliers on the likely delay
pub const BEST_CASE_DELAY_FACTOR: f64 = 0.7;
pub const WORST_CASE_DELAY_FACTOR: f64 = 1.5;

/// Extreme event counts above which remobilization gets more expensive
pub const MAJOR_EVENT_THRESHOLD: u32 = 10;
pub const MODERATE_EVENT_THRESHOLD: u32 = 5;

/// Remobilization cost as a fraction of base equipment cost
pub const MAJOR_REMOBILIZATION_FACTOR: f64 = 0.05;
pub const MODERATE_REMOBILIZATION_FACTOR: f64 = 0.03;
pub const MINIMAL_REMOBILIZATION_FACTOR: f64 = 0.02;

/// Minimum workable-day percentage for the high / medium confidence markups
pub const HIGH_CONFIDENCE_MIN_WORKABLE_PCT: f64 = 80.0;
pub const MEDIUM_CONFIDENCE_MIN_WORKABLE_PCT: f64 = 65.0;

/// Estimator calibration
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    pub low_risk_max_score: f64,
    pub medium_risk_max_score: f64,
    pub low_risk_delay_factor: f64,
    pub medium_risk_delay_factor: f64,
    pub high_risk_delay_factor: f64,
    pub best_case_delay_factor: f64,
    pub worst_case_delay_factor: f64,
    pub major_event_threshold: u32,
    pub moderate_event_threshold: u32,
    pub major_remobilization_factor: f64,
    pub moderate_remobilization_factor: f64,
    pub minimal_remobilization_factor: f64,
    pub high_confidence_min_workable_pct: f64,
    pub medium_confidence_min_workable_pct: f64,
    pub high_confidence_markup: MarkupRecommendation,
    pub medium_confidence_markup: MarkupRecommendation,
    pub low_confidence_markup: MarkupRecommendation,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            low_risk_max_score: LOW_RISK_MAX_SCORE,
            medium_risk_max_score: MEDIUM_RISK_MAX_SCORE,
            low_risk_delay_factor: LOW_RISK_DELAY_FACTOR,
            medium_risk_delay_factor: MEDIUM_RISK_DELAY_FACTOR,
            high_risk_delay_factor: HIGH_RISK_DELAY_FACTOR,
            best_case_delay_factor: BEST_CASE_DELAY_FACTOR,
            worst_case_delay_factor: WORST_CASE_DELAY_FACTOR,
            major_event_threshold: MAJOR_EVENT_THRESHOLD,
            moderate_event_threshold: MODERATE_EVENT_THRESHOLD,
            major_remobilization_factor: MAJOR_REMOBILIZATION_FACTOR,
            moderate_remobilization_factor: MODERATE_REMOBILIZATION_FACTOR,
            minimal_remobilization_factor: MINIMAL_REMOBILIZATION_FACTOR,
            high_confidence_min_workable_pct: HIGH_CONFIDENCE_MIN_WORKABLE_PCT,
            medium_confidence_min_workable_pct: MEDIUM_CONFIDENCE_MIN_WORKABLE_PCT,
            high_confidence_markup: HIGH_CONFIDENCE_MARKUP,
            medium_confidence_markup: MEDIUM_CONFIDENCE_MARKUP,
            low_confidence_markup: LOW_CONFIDENCE_MARKUP,
        }
    }
}

/// Weather contingency estimator. Stateless apart from its calibration.
#[derive(Debug, Clone, Default)]
pub struct BidContingencyEstimator {
    config: EstimatorConfig,
}

impl BidContingencyEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Days of schedule slip expected from the non-workable days.
    ///
    /// Not every non-workable day delays the project: buffers, parallel
    /// activities and weekend recovery absorb part of them.
    pub fn estimate_delay_days(&self, non_workable_days: u32, risk_score: f64) -> u32 {
        let c = &self.config;
        let factor = if risk_score <= c.low_risk_max_score {
            c.low_risk_delay_factor
        } else if risk_score <= c.medium_risk_max_score {
            c.medium_risk_delay_factor
        } else {
            c.high_risk_delay_factor
        };

        (non_workable_days as f64 * factor).round() as u32
    }

    /// Cost of demobilizing and remobilizing equipment around weather events
    pub fn estimate_remobilization_cost(&self, extreme_event_count: u32, base_equipment_cost: f64) -> f64 {
        let c = &self.config;
        let factor = if extreme_event_count > c.major_event_threshold {
            c.major_remobilization_factor
        } else if extreme_event_count > c.moderate_event_threshold {
            c.moderate_remobilization_factor
        } else {
            c.minimal_remobilization_factor
        };

        base_equipment_cost * factor
    }

    pub fn recommended_markup(&self, risk_score: f64, workable_percent: f64) -> MarkupRecommendation {
        let c = &self.config;
        if risk_score <= c.low_risk_max_score && workable_percent >= c.high_confidence_min_workable_pct {
            c.high_confidence_markup
        } else if risk_score <= c.medium_risk_max_score
            && workable_percent >= c.medium_confidence_min_workable_pct
        {
            c.medium_confidence_markup
        } else {
            c.low_confidence_markup
        }
    }

    /// Full contingency estimate. Pure and deterministic.
    pub fn compute(
        &self,
        costs: &BaseCosts,
        params: &ProjectParams,
        analysis: &RiskAnalysis,
    ) -> Result<BidRecommendation> {
        validate(costs, params, analysis)?;

        let base_bid = costs.total();
        let risk_score = analysis.risk_score;
        let total_days = analysis.total_days.max(1);
        let workable_percent = analysis.workable_days as f64 / total_days as f64 * 100.0;

        let likely = self.estimate_delay_days(analysis.non_workable_days, risk_score);
        let delay_days = DelayDayRange {
            min: (likely as f64 * self.config.best_case_delay_factor).floor() as u32,
            likely,
            max: (likely as f64 * self.config.worst_case_delay_factor).ceil() as u32,
        };

        // Labor extension uses the rounded likely delay
        let delay_overhead_cost = likely as f64 * params.daily_overhead_rate;
        let delay_labor_cost =
            costs.labor * (likely as f64 / total_days as f64) * params.labor_delay_multiplier;
        let delay_penalty_cost = params.delay_penalty_per_day * likely as f64;
        let remobilization_cost =
            self.estimate_remobilization_cost(analysis.extreme_event_count, costs.equipment);

        let total = delay_overhead_cost + delay_labor_cost + delay_penalty_cost + remobilization_cost;
        let contingency_percent = total / base_bid.max(1.0) * 100.0;

        let markup = self.recommended_markup(risk_score, workable_percent);

        debug!(
            "Contingency {:.2} ({:.1}%) on base bid {:.2}, likely delay {} days, {} confidence",
            total, contingency_percent, base_bid, likely, markup.confidence
        );

        Ok(BidRecommendation {
            base_costs: *costs,
            base_bid,
            weather_contingency: ContingencyBreakdown {
                delay_overhead_cost,
                delay_labor_cost,
                delay_penalty_cost,
                remobilization_cost,
                total,
                contingency_percent,
            },
            total_bid_with_contingency: base_bid + total,
            delay_days,
            markup,
            risk_score,
            workable_percent,
        })
    }
}

fn validate(costs: &BaseCosts, params: &ProjectParams, analysis: &RiskAnalysis) -> Result<()> {
    let amounts = [
        ("labor", costs.labor),
        ("materials", costs.materials),
        ("equipment", costs.equipment),
        ("daily_overhead_rate", params.daily_overhead_rate),
        ("delay_penalty_per_day", params.delay_penalty_per_day),
        ("labor_delay_multiplier", params.labor_delay_multiplier),
    ];
    for (field, value) in amounts {
        if !value.is_finite() || value < 0.0 {
            return Err(BidError::InvalidInput {
                field,
                reason: format!("must be a non-negative amount, got {}", value),
            });
        }
    }

    if costs.labor == 0.0 && costs.materials == 0.0 && costs.equipment == 0.0 {
        return Err(BidError::NoBaseCosts);
    }

    if !(0.0..=100.0).contains(&analysis.risk_score) {
        return Err(BidError::InvalidInput {
            field: "risk_score",
            reason: format!("must be within 0-100, got {}", analysis.risk_score),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Confidence;

    fn costs() -> BaseCosts {
        BaseCosts {
            labor: 100_000.0,
            materials: 50_000.0,
            equipment: 30_000.0,
        }
    }

    fn params() -> ProjectParams {
        ProjectParams {
            daily_overhead_rate: 2000.0,
            delay_penalty_per_day: 500.0,
            labor_delay_multiplier: 1.5,
        }
    }

    fn analysis() -> RiskAnalysis {
        RiskAnalysis {
            risk_score: 45.0,
            total_days: 120,
            workable_days: 90,
            non_workable_days: 30,
            extreme_event_count: 7,
        }
    }

    #[test]
    fn test_delay_day_tiers() {
        let est = BidContingencyEstimator::new();
        assert_eq!(est.estimate_delay_days(20, 0.0), 6);
        assert_eq!(est.estimate_delay_days(20, 30.0), 6);
        assert_eq!(est.estimate_delay_days(20, 30.5), 10);
        assert_eq!(est.estimate_delay_days(20, 60.0), 10);
        assert_eq!(est.estimate_delay_days(20, 61.0), 14);
        assert_eq!(est.estimate_delay_days(0, 90.0), 0);
        // 0.3 × 5 = 1.5 rounds up
        assert_eq!(est.estimate_delay_days(5, 10.0), 2);
    }

    #[test]
    fn test_remobilization_tiers() {
        let est = BidContingencyEstimator::new();
        assert_eq!(est.estimate_remobilization_cost(0, 10_000.0), 200.0);
        assert_eq!(est.estimate_remobilization_cost(5, 10_000.0), 200.0);
        assert_eq!(est.estimate_remobilization_cost(6, 10_000.0), 300.0);
        assert_eq!(est.estimate_remobilization_cost(10, 10_000.0), 300.0);
        assert_eq!(est.estimate_remobilization_cost(11, 10_000.0), 500.0);
    }

    #[test]
    fn test_markup_tier_boundaries() {
        let est = BidContingencyEstimator::new();

        let high = est.recommended_markup(30.0, 80.0);
        assert_eq!(high.confidence, Confidence::High);
        assert_eq!(high.recommended, 12);

        let medium = est.recommended_markup(31.0, 80.0);
        assert_eq!(medium.confidence, Confidence::Medium);
        assert_eq!(medium.recommended, 18);

        assert_eq!(est.recommended_markup(30.0, 79.9).confidence, Confidence::Medium);
        assert_eq!(est.recommended_markup(60.0, 65.0).confidence, Confidence::Medium);
        assert_eq!(est.recommended_markup(60.0, 64.9).confidence, Confidence::Low);
        assert_eq!(est.recommended_markup(61.0, 100.0), LOW_CONFIDENCE_MARKUP);
    }

    #[test]
    fn test_compute_worked_example() {
        let est = BidContingencyEstimator::new();
        let rec = est.compute(&costs(), &params(), &analysis()).unwrap();

        assert_eq!(rec.base_bid, 180_000.0);
        assert_eq!(rec.workable_percent, 75.0);
        assert_eq!(
            rec.delay_days,
            DelayDayRange {
                min: 10,
                likely: 15,
                max: 23
            }
        );

        let c = &rec.weather_contingency;
        assert_eq!(c.delay_overhead_cost, 30_000.0);
        assert_eq!(c.delay_labor_cost, 18_750.0);
        assert_eq!(c.delay_penalty_cost, 7_500.0);
        assert!((c.remobilization_cost - 900.0).abs() < 1e-9);
        assert!((c.total - 57_150.0).abs() < 1e-9);
        assert!((c.contingency_percent - 31.75).abs() < 1e-9);
        assert!((rec.total_bid_with_contingency - 237_150.0).abs() < 1e-9);

        assert_eq!(rec.markup, MEDIUM_CONFIDENCE_MARKUP);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let est = BidContingencyEstimator::new();
        let a = est.compute(&costs(), &params(), &analysis()).unwrap();
        let b = est.compute(&costs(), &params(), &analysis()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.weather_contingency.total.to_bits(),
            b.weather_contingency.total.to_bits()
        );
    }

    #[test]
    fn test_all_zero_costs_rejected() {
        let est = BidContingencyEstimator::new();
        let err = est
            .compute(&BaseCosts::default(), &params(), &analysis())
            .unwrap_err();
        assert_eq!(err, BidError::NoBaseCosts);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let est = BidContingencyEstimator::new();

        let mut bad = costs();
        bad.materials = -1.0;
        let err = est.compute(&bad, &params(), &analysis()).unwrap_err();
        assert!(matches!(err, BidError::InvalidInput { field: "materials", .. }));

        let mut bad = params();
        bad.daily_overhead_rate = f64::NAN;
        let err = est.compute(&costs(), &bad, &analysis()).unwrap_err();
        assert!(matches!(err, BidError::InvalidInput { field: "daily_overhead_rate", .. }));

        let mut bad = analysis();
        bad.risk_score = 120.0;
        let err = est.compute(&costs(), &params(), &bad).unwrap_err();
        assert!(matches!(err, BidError::InvalidInput { field: "risk_score", .. }));
    }

    #[test]
    fn test_zero_total_days_is_floored() {
        let est = BidContingencyEstimator::new();
        let analysis = RiskAnalysis {
            risk_score: 80.0,
            total_days: 0,
            workable_days: 0,
            non_workable_days: 10,
            extreme_event_count: 12,
        };
        let costs = BaseCosts {
            labor: 1000.0,
            materials: 0.0,
            equipment: 1000.0,
        };

        let rec = est.compute(&costs, &ProjectParams::default(), &analysis).unwrap();
        assert_eq!(rec.workable_percent, 0.0);
        assert_eq!(rec.delay_days.likely, 7);
        // Divides by the floored single day
        assert_eq!(rec.weather_contingency.delay_labor_cost, 1000.0 * 7.0 * 1.5);
        assert_eq!(rec.weather_contingency.remobilization_cost, 50.0);
        assert_eq!(rec.markup.confidence, Confidence::Low);
    }

    #[test]
    fn test_custom_calibration() {
        let config = EstimatorConfig {
            low_risk_delay_factor: 1.0,
            ..EstimatorConfig::default()
        };
        let est = BidContingencyEstimator::with_config(config);
        assert_eq!(est.estimate_delay_days(12, 10.0), 12);
    }
}
