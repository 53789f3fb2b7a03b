//! Rules-based valuation: a revenue/margin tier lookup sets the EBITDA estimate and
//! base multiple range, then optional adjusters shift the range before a 2.0x floor.

mod answers;
pub mod format;
pub mod rules;

pub use answers::{AnswerSet, AnswerValue};
pub use format::{format_currency, format_currency_range, format_multiple_range};
pub use rules::{Adjustment, AdjusterRule, ScoringRules};

use rules::{
    CLIENT_CONCENTRATION_KEY, CONCENTRATION_RISK_TOKENS, EBITDA_MARGIN_KEY, REVENUE_RANGE_KEY,
};
use serde::{Deserialize, Serialize};

/// Lowest EBITDA multiple the engine will report.
pub const MULTIPLE_FLOOR: f64 = 2.0;

/// Direction an adjuster moved the multiple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorImpact {
    Premium,
    Neutral,
    Discount,
}

impl FactorImpact {
    /// Any positive delta wins over a negative one; only an all-zero shift is neutral.
    pub fn classify(adjustment: Adjustment) -> Self {
        if adjustment.low > 0.0 || adjustment.high > 0.0 {
            FactorImpact::Premium
        } else if adjustment.low < 0.0 || adjustment.high < 0.0 {
            FactorImpact::Discount
        } else {
            FactorImpact::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FactorImpact::Premium => "premium",
            FactorImpact::Neutral => "neutral",
            FactorImpact::Discount => "discount",
        }
    }
}

/// Explanation line for one applied adjuster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationFactor {
    pub name: String,
    pub impact: FactorImpact,
    pub description: String,
    pub adjustment_low: f64,
    pub adjustment_high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResult {
    pub valuation_low: f64,
    pub valuation_high: f64,
    pub ebitda_multiple_low: f64,
    pub ebitda_multiple_high: f64,
    pub estimated_ebitda: f64,
    pub factors: Vec<ValuationFactor>,
}

impl ValuationResult {
    pub fn valuation_range_label(&self) -> String {
        format_currency_range(self.valuation_low, self.valuation_high)
    }

    pub fn multiple_range_label(&self) -> String {
        format_multiple_range(self.ebitda_multiple_low, self.ebitda_multiple_high)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValuationError {
    #[error("missing required financial answers for valuation: {}", .fields.join(", "))]
    MissingInput { fields: Vec<&'static str> },
}

/// Stateless scorer over a set of [`ScoringRules`].
#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    rules: ScoringRules,
}

impl ValuationEngine {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(ScoringRules::standard())
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn score(&self, answers: &AnswerSet) -> Result<ValuationResult, ValuationError> {
        let band = answers
            .single(REVENUE_RANGE_KEY)
            .and_then(|token| self.rules.revenue_band(token));
        let margin_rate = answers
            .single(EBITDA_MARGIN_KEY)
            .and_then(|token| self.rules.margin_rate(token));

        let (band, margin_rate) = match (band, margin_rate) {
            (Some(band), Some(rate)) => (band, rate),
            (band, rate) => {
                let mut fields = Vec::new();
                if band.is_none() {
                    fields.push(REVENUE_RANGE_KEY);
                }
                if rate.is_none() {
                    fields.push(EBITDA_MARGIN_KEY);
                }
                return Err(ValuationError::MissingInput { fields });
            }
        };

        let estimated_ebitda = band.midpoint * margin_rate;

        let mut factors = Vec::new();
        let mut total_low = 0.0;
        let mut total_high = 0.0;

        for rule in self.rules.adjusters {
            let Some(adjustment) = answers
                .single(rule.id)
                .and_then(|token| rule.adjustment(token))
            else {
                continue;
            };

            total_low += adjustment.low;
            total_high += adjustment.high;

            let impact = FactorImpact::classify(adjustment);
            let description = match impact {
                FactorImpact::Premium => rule.premium_label,
                FactorImpact::Neutral => rule.neutral_label,
                FactorImpact::Discount => rule.discount_label,
            };

            factors.push(ValuationFactor {
                name: rule.name.to_string(),
                impact,
                description: description.to_string(),
                adjustment_low: adjustment.low,
                adjustment_high: adjustment.high,
            });
        }

        let ebitda_multiple_low = (band.multiple_low + total_low).max(MULTIPLE_FLOOR);
        let ebitda_multiple_high = (band.multiple_high + total_high).max(MULTIPLE_FLOOR);

        Ok(ValuationResult {
            valuation_low: estimated_ebitda * ebitda_multiple_low,
            valuation_high: estimated_ebitda * ebitda_multiple_high,
            ebitda_multiple_low,
            ebitda_multiple_high,
            estimated_ebitda,
            factors,
        })
    }
}

/// Scores `answers` against the standard rule tables.
pub fn calculate_valuation(answers: &AnswerSet) -> Result<ValuationResult, ValuationError> {
    ValuationEngine::standard().score(answers)
}

/// True when the top-client share is high enough to call out on the results page.
pub fn has_concentration_risk(answers: &AnswerSet) -> bool {
    answers
        .single(CLIENT_CONCENTRATION_KEY)
        .is_some_and(|token| CONCENTRATION_RISK_TOKENS.contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> AnswerSet {
        AnswerSet::new()
            .with("revenue_range", "3m_7m")
            .with("ebitda_margin", "10_15")
    }

    #[test]
    fn baseline_without_adjusters_uses_tier_multiples() {
        let result = calculate_valuation(&baseline()).expect("valuation computes");

        assert_eq!(result.estimated_ebitda, 625_000.0);
        assert_eq!(result.ebitda_multiple_low, 4.0);
        assert_eq!(result.ebitda_multiple_high, 5.5);
        assert_eq!(result.valuation_low, 2_500_000.0);
        assert_eq!(result.valuation_high, 3_437_500.0);
        assert!(result.factors.is_empty());
    }

    #[test]
    fn heavy_concentration_hits_the_multiple_floor() {
        let answers = baseline().with("top_client_concentration", "over_60");
        let result = calculate_valuation(&answers).expect("valuation computes");

        assert_eq!(result.ebitda_multiple_low, 2.0);
        assert_eq!(result.ebitda_multiple_high, 3.5);
        assert_eq!(result.valuation_low, 1_250_000.0);
        assert_eq!(result.valuation_high, 2_187_500.0);
        assert_eq!(result.factors.len(), 1);
        assert_eq!(result.factors[0].name, "Client Concentration");
        assert_eq!(result.factors[0].impact, FactorImpact::Discount);
        assert_eq!(
            result.factors[0].description,
            "High client concentration is a significant risk"
        );
    }

    #[test]
    fn floor_applies_to_both_ends_when_every_adjuster_is_negative() {
        let answers = AnswerSet::new()
            .with("revenue_range", "under_1m")
            .with("ebitda_margin", "under_5")
            .with("revenue_trend", "declining")
            .with("top_client_concentration", "over_60")
            .with("recurring_revenue_pct", "transactional")
            .with("mgmt_independence", "heavily_involved")
            .with("lease_terms", "short_lease");
        let result = calculate_valuation(&answers).expect("valuation computes");

        assert_eq!(result.ebitda_multiple_low, MULTIPLE_FLOOR);
        assert_eq!(result.ebitda_multiple_high, MULTIPLE_FLOOR);
        assert_eq!(result.factors.len(), 5);
        assert!(result
            .factors
            .iter()
            .all(|factor| factor.impact == FactorImpact::Discount));
    }

    #[test]
    fn no_ceiling_on_premium_stacking() {
        let answers = AnswerSet::new()
            .with("revenue_range", "30m_plus")
            .with("ebitda_margin", "20_plus")
            .with("revenue_trend", "growing_fast")
            .with("top_client_concentration", "under_10")
            .with("recurring_revenue_pct", "mostly_contracted")
            .with("mgmt_independence", "hands_off")
            .with("lease_terms", "own");
        let result = calculate_valuation(&answers).expect("valuation computes");

        assert_eq!(result.ebitda_multiple_low, 5.5 + 2.25);
        assert_eq!(result.ebitda_multiple_high, 7.0 + 3.25);
        assert_eq!(result.estimated_ebitda, 45_000_000.0 * 0.225);
    }

    #[test]
    fn neutral_tokens_emit_neutral_factors_in_rule_order() {
        let answers = baseline()
            .with("lease_terms", "mid_lease")
            .with("revenue_trend", "flat");
        let result = calculate_valuation(&answers).expect("valuation computes");

        let names: Vec<_> = result.factors.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Revenue Growth", "Lease Terms"]);
        assert!(result
            .factors
            .iter()
            .all(|factor| factor.impact == FactorImpact::Neutral));
        assert_eq!(result.ebitda_multiple_low, 4.0);
    }

    #[test]
    fn unrecognized_and_multi_select_adjusters_are_skipped() {
        let mut answers = baseline().with("revenue_trend", "skyrocketing");
        answers.insert(
            "lease_terms",
            AnswerValue::Multiple(vec!["own".to_string(), "long_lease".to_string()]),
        );
        let result = calculate_valuation(&answers).expect("valuation computes");

        assert!(result.factors.is_empty());
        assert_eq!(result.valuation_low, 2_500_000.0);
    }

    #[test]
    fn missing_financials_are_fatal() {
        match calculate_valuation(&AnswerSet::new()) {
            Err(ValuationError::MissingInput { fields }) => {
                assert_eq!(fields, vec!["revenue_range", "ebitda_margin"]);
            }
            other => panic!("expected missing input, got {other:?}"),
        }

        let answers = AnswerSet::new()
            .with("revenue_range", "3m_7m")
            .with("ebitda_margin", "negative");
        match calculate_valuation(&answers) {
            Err(ValuationError::MissingInput { fields }) => {
                assert_eq!(fields, vec!["ebitda_margin"]);
            }
            other => panic!("expected missing input, got {other:?}"),
        }
    }

    #[test]
    fn every_tier_and_adjuster_is_deterministic_monotone_and_floored() {
        let engine = ValuationEngine::standard();
        let rules = engine.rules();
        let spread = |adjustment: &Adjustment| adjustment.low + adjustment.high;

        for band in rules.revenue_bands {
            for margin in rules.margin_bands {
                let tier = AnswerSet::new()
                    .with(REVENUE_RANGE_KEY, band.token)
                    .with(EBITDA_MARGIN_KEY, margin.token);

                for rule in rules.adjusters {
                    let (discount, _) = rule
                        .adjustments
                        .iter()
                        .min_by(|a, b| spread(&a.1).total_cmp(&spread(&b.1)))
                        .expect("adjuster has options");
                    let (premium, _) = rule
                        .adjustments
                        .iter()
                        .max_by(|a, b| spread(&a.1).total_cmp(&spread(&b.1)))
                        .expect("adjuster has options");
                    let case = format!("{} / {} / {}", band.token, margin.token, rule.id);

                    let discounted = tier.clone().with(rule.id, *discount);
                    let premiumed = tier.clone().with(rule.id, *premium);
                    let low_end = engine.score(&discounted).expect("valuation computes");
                    let high_end = engine.score(&premiumed).expect("valuation computes");

                    assert_eq!(
                        low_end,
                        engine.score(&discounted).expect("valuation computes"),
                        "{case}: repeated scoring differs"
                    );
                    assert_eq!(
                        high_end,
                        engine.score(&premiumed).expect("valuation computes"),
                        "{case}: repeated scoring differs"
                    );
                    assert!(
                        high_end.valuation_low >= low_end.valuation_low
                            && high_end.valuation_high >= low_end.valuation_high,
                        "{case}: {premium} valued below {discount}"
                    );
                    for result in [&low_end, &high_end] {
                        assert!(
                            result.ebitda_multiple_low >= MULTIPLE_FLOOR
                                && result.ebitda_multiple_high >= MULTIPLE_FLOOR,
                            "{case}: multiple below the floor"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn mixed_sign_adjustment_classifies_as_premium() {
        assert_eq!(
            FactorImpact::classify(Adjustment::new(-0.5, 0.25)),
            FactorImpact::Premium
        );
        assert_eq!(
            FactorImpact::classify(Adjustment::new(0.0, -0.25)),
            FactorImpact::Discount
        );
        assert_eq!(
            FactorImpact::classify(Adjustment::new(0.0, 0.0)),
            FactorImpact::Neutral
        );
    }

    #[test]
    fn flags_concentration_risk() {
        assert!(has_concentration_risk(
            &baseline().with("top_client_concentration", "25_40")
        ));
        assert!(!has_concentration_risk(
            &baseline().with("top_client_concentration", "10_25")
        ));
        assert!(!has_concentration_risk(&baseline()));
    }

    #[test]
    fn result_serializes_with_camel_case_keys() {
        let result = calculate_valuation(&baseline().with("lease_terms", "own"))
            .expect("valuation computes");
        let json = serde_json::to_value(&result).expect("serializes");

        assert_eq!(json["valuationLow"], 2_500_000.0 + 625_000.0 * 0.25);
        assert_eq!(json["estimatedEbitda"], 625_000.0);
        assert_eq!(json["factors"][0]["impact"], "premium");
        assert_eq!(json["factors"][0]["adjustmentHigh"], 0.25);
    }
}
