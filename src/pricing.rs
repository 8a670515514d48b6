// src/pricing.rs
// Pricing Calculator - token usage to USD/EUR cost

use crate::model::ModelChoice;

/// Bump when the table below changes.
pub const PRICING_TABLE_VERSION: &str = "2025-06";

/// Fixed approximation, not a live exchange rate.
pub const USD_TO_EUR: f64 = 0.92;

/// All prices are USD per million tokens.
const TOKENS_PER_UNIT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_unit: f64,
    pub output_per_unit: f64,
    pub unit_divisor: f64,
}

/// One entry per `ModelChoice`; the match is exhaustive so a new tier
/// cannot be added without a price.
pub fn pricing_for(model: ModelChoice) -> ModelPricing {
    match model {
        ModelChoice::Fast => ModelPricing {
            input_per_unit: 4.0,
            output_per_unit: 20.0,
            unit_divisor: TOKENS_PER_UNIT,
        },
        ModelChoice::Accurate => ModelPricing {
            input_per_unit: 4.0,
            output_per_unit: 20.0,
            unit_divisor: TOKENS_PER_UNIT,
        },
    }
}

/// Derived on demand from a generation's token counts.
#[derive(Debug, Clone, PartialEq)]
pub struct CostBreakdown {
    pub input_cost_usd: f64,
    pub output_cost_usd: f64,
    pub total_usd: f64,
    pub total_eur: f64,
    pub model: ModelChoice,
}

/// Cost of a single generation. Missing token counts are passed as zero.
pub fn compute_cost(model: ModelChoice, input_tokens: u64, output_tokens: u64) -> CostBreakdown {
    let pricing = pricing_for(model);
    let input_cost_usd = input_tokens as f64 * pricing.input_per_unit / pricing.unit_divisor;
    let output_cost_usd = output_tokens as f64 * pricing.output_per_unit / pricing.unit_divisor;
    let total_usd = input_cost_usd + output_cost_usd;

    CostBreakdown {
        input_cost_usd,
        output_cost_usd,
        total_usd,
        total_eur: total_usd * USD_TO_EUR,
        model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_flash_cost() {
        let cost = compute_cost(ModelChoice::Fast, 1000, 500);
        assert!(approx(cost.input_cost_usd, 0.004));
        assert!(approx(cost.output_cost_usd, 0.010));
        assert!(approx(cost.total_usd, 0.014));
        assert!(approx(cost.total_eur, 0.01288));
    }

    #[test]
    fn test_eur_is_exact_multiple() {
        for (input, output) in [(0, 0), (1, 1), (123_456, 7_890), (2_000_000, 1)] {
            for model in [ModelChoice::Fast, ModelChoice::Accurate] {
                let cost = compute_cost(model, input, output);
                assert!(cost.total_usd >= 0.0);
                assert_eq!(cost.total_eur, cost.total_usd * USD_TO_EUR);
            }
        }
    }

    #[test]
    fn test_zero_tokens_cost_nothing() {
        let cost = compute_cost(ModelChoice::Accurate, 0, 0);
        assert_eq!(cost.total_usd, 0.0);
        assert_eq!(cost.total_eur, 0.0);
    }
}
