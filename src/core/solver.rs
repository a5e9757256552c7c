use log::debug;

use super::engine::CheckedProfile;
use super::error::FireError;
use super::numeric::{clamped_amount, ensure_growth_rate, future_value, required_annual_contribution};
use super::types::{
    CalibrationPolicy, CalibrationRequest, CalibrationResult, CalibrationScenario,
    FIRE_MULTIPLE, FinancialProfile, INFEASIBLE_CUT_REASON, MAX_HORIZON_YEARS, MONTHS_PER_YEAR,
    ScenarioId,
};

/// Calibrates against the default scenario offsets (+3 balanced, +7 lifestyle).
pub fn calibrate(
    profile: &FinancialProfile,
    desired_retire_year: i32,
    current_year: i32,
    annual_growth_rate: f64,
    minimum_needs_floor: f64,
) -> Result<CalibrationResult, FireError> {
    calibrate_with(
        profile,
        &CalibrationRequest {
            desired_retire_year,
            current_year,
            annual_growth_rate,
            minimum_needs_floor,
        },
        &CalibrationPolicy::default(),
    )
}

pub fn calibrate_with(
    profile: &FinancialProfile,
    request: &CalibrationRequest,
    policy: &CalibrationPolicy,
) -> Result<CalibrationResult, FireError> {
    let checked = CheckedProfile::from_profile(profile)?;
    let horizon = validate_request(request)?;
    validate_policy(policy)?;
    let growth = request.annual_growth_rate;
    let needs_floor = clamped_amount("minimum_needs_floor", request.minimum_needs_floor)?;

    let required_monthly_savings = required_monthly_savings(&checked, growth, horizon);
    let current_monthly_savings = checked.monthly_savings();
    let gap = (required_monthly_savings - current_monthly_savings).max(0.0);

    let scenarios = ScenarioId::ALL.map(|id| {
        build_scenario(
            &checked,
            id,
            request,
            horizon.saturating_add(policy.offset_for(id)),
            needs_floor,
        )
    });
    debug!(
        "calibrated horizon={horizon} required={required_monthly_savings:.2} current={current_monthly_savings:.2} gap={gap:.2}"
    );

    Ok(CalibrationResult {
        gap,
        gap_exists: gap > 0.0,
        required_monthly_savings,
        current_monthly_savings,
        scenarios,
    })
}

/// Monthly contribution that lands the profile exactly on its FIRE number
/// after `years` of annual compounding.
pub(crate) fn required_monthly_savings(profile: &CheckedProfile, growth: f64, years: u32) -> f64 {
    required_annual_contribution(
        profile.fire_number(),
        profile.current_net_worth,
        growth,
        years,
    ) / MONTHS_PER_YEAR
}

fn validate_request(request: &CalibrationRequest) -> Result<u32, FireError> {
    ensure_growth_rate("annual_growth_rate", request.annual_growth_rate)?;
    if request.desired_retire_year <= request.current_year {
        return Err(FireError::invalid(
            "desired_retire_year must be after current_year",
        ));
    }
    let horizon = i64::from(request.desired_retire_year) - i64::from(request.current_year);
    match u32::try_from(horizon) {
        Ok(years) if years <= MAX_HORIZON_YEARS => Ok(years),
        _ => Err(FireError::invalid(format!(
            "retirement horizon must be <= {MAX_HORIZON_YEARS} years"
        ))),
    }
}

fn validate_policy(policy: &CalibrationPolicy) -> Result<(), FireError> {
    let widest = policy
        .balanced_offset_years
        .max(policy.lifestyle_offset_years);
    if widest > MAX_HORIZON_YEARS {
        return Err(FireError::invalid(format!(
            "scenario offsets must be <= {MAX_HORIZON_YEARS} years"
        )));
    }
    Ok(())
}

fn build_scenario(
    profile: &CheckedProfile,
    id: ScenarioId,
    request: &CalibrationRequest,
    years: u32,
    needs_floor: f64,
) -> CalibrationScenario {
    let required_monthly_budget =
        affordable_monthly_budget(profile, request.annual_growth_rate, years);
    let wants_cut = (profile.monthly_expenses - required_monthly_budget).max(0.0);
    let feasible = profile.monthly_expenses - wants_cut >= needs_floor;

    CalibrationScenario {
        id,
        retire_year: request
            .current_year
            .saturating_add(i32::try_from(years).unwrap_or(i32::MAX)),
        retire_age: profile.current_age.saturating_add(years),
        required_monthly_budget,
        wants_cut,
        feasible,
        infeasibility_reason: (!feasible).then(|| INFEASIBLE_CUT_REASON.to_string()),
    }
}

/// Largest current monthly spend whose lifestyle-adjusted FIRE number is
/// covered by the portfolio after `years`, with contributions held at
/// today's savings.
fn affordable_monthly_budget(profile: &CheckedProfile, growth: f64, years: u32) -> f64 {
    let portfolio_at_retirement = future_value(
        profile.current_net_worth,
        growth,
        profile.monthly_savings() * MONTHS_PER_YEAR,
        years,
    );
    portfolio_at_retirement / (MONTHS_PER_YEAR * FIRE_MULTIPLE * profile.lifestyle_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::numeric::step_year;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_profile() -> FinancialProfile {
        FinancialProfile {
            current_age: 35,
            monthly_income: 6_000.0,
            monthly_expenses: 5_000.0,
            current_net_worth: 500_000.0,
            lifestyle_multiplier: 1.0,
        }
    }

    #[test]
    fn scenarios_are_ordered_and_offset_by_policy() {
        let result = calibrate(&sample_profile(), 2036, 2026, 0.07, 2_500.0).expect("valid");
        let ids: Vec<ScenarioId> = result.scenarios.iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec![ScenarioId::StrictFire, ScenarioId::Balanced, ScenarioId::Lifestyle]
        );
        let years: Vec<i32> = result.scenarios.iter().map(|s| s.retire_year).collect();
        assert_eq!(years, vec![2036, 2039, 2043]);
        let ages: Vec<u32> = result.scenarios.iter().map(|s| s.retire_age).collect();
        assert_eq!(ages, vec![45, 48, 52]);
    }

    #[test]
    fn gap_reflects_shortfall_against_ten_year_goal() {
        // The profile needs 14 years at current savings, so 10 years must cost more.
        let result = calibrate(&sample_profile(), 2036, 2026, 0.07, 2_500.0).expect("valid");
        assert!(result.gap_exists);
        assert_approx(result.current_monthly_savings, 1_000.0);
        assert_approx(
            result.gap,
            result.required_monthly_savings - result.current_monthly_savings,
        );

        let fv = 500_000.0 * 1.07_f64.powi(10);
        let annuity = (1.07_f64.powi(10) - 1.0) / 0.07;
        let expected = (1_500_000.0 - fv) / (12.0 * annuity);
        assert_approx(result.required_monthly_savings, expected);
    }

    #[test]
    fn no_gap_when_goal_is_already_on_track() {
        let result = calibrate(&sample_profile(), 2046, 2026, 0.07, 0.0).expect("valid");
        assert!(!result.gap_exists);
        assert_approx(result.gap, 0.0);
        assert!(result.required_monthly_savings < result.current_monthly_savings);
    }

    #[test]
    fn funded_profile_requires_no_savings() {
        let mut profile = sample_profile();
        profile.current_net_worth = 3_000_000.0;
        let result = calibrate(&profile, 2027, 2026, 0.07, 0.0).expect("valid");
        assert_approx(result.required_monthly_savings, 0.0);
        assert!(!result.gap_exists);
        for scenario in &result.scenarios {
            assert_approx(scenario.wants_cut, 0.0);
            assert!(scenario.feasible);
            assert!(scenario.infeasibility_reason.is_none());
        }
    }

    #[test]
    fn later_scenarios_need_smaller_cuts() {
        let result = calibrate(&sample_profile(), 2030, 2026, 0.07, 0.0).expect("valid");
        let [strict, balanced, lifestyle] = &result.scenarios;
        assert!(strict.required_monthly_budget < balanced.required_monthly_budget);
        assert!(balanced.required_monthly_budget < lifestyle.required_monthly_budget);
        assert!(strict.wants_cut >= balanced.wants_cut);
        assert!(balanced.wants_cut >= lifestyle.wants_cut);
    }

    #[test]
    fn scenario_budget_matches_hand_calculation() {
        // Strict horizon of 4 years: (500k*1.07^4 + 12k*annuity(4)) / 300
        let result = calibrate(&sample_profile(), 2030, 2026, 0.07, 0.0).expect("valid");
        let portfolio = 500_000.0 * 1.07_f64.powi(4) + 12_000.0 * (1.07_f64.powi(4) - 1.0) / 0.07;
        let strict = &result.scenarios[0];
        assert_approx(strict.required_monthly_budget, portfolio / 300.0);
        assert_approx(strict.wants_cut, 5_000.0 - portfolio / 300.0);
    }

    #[test]
    fn cut_below_needs_floor_is_infeasible() {
        let result = calibrate(&sample_profile(), 2028, 2026, 0.07, 4_500.0).expect("valid");
        let strict = &result.scenarios[0];
        assert!(strict.wants_cut > 500.0);
        assert!(!strict.feasible);
        assert_eq!(
            strict.infeasibility_reason.as_deref(),
            Some("Would require cutting below essential needs")
        );
    }

    #[test]
    fn custom_policy_offsets_are_honoured() {
        let policy = CalibrationPolicy {
            balanced_offset_years: 1,
            lifestyle_offset_years: 10,
        };
        let request = CalibrationRequest {
            desired_retire_year: 2040,
            current_year: 2026,
            annual_growth_rate: 0.05,
            minimum_needs_floor: 0.0,
        };
        let result = calibrate_with(&sample_profile(), &request, &policy).expect("valid");
        let years: Vec<i32> = result.scenarios.iter().map(|s| s.retire_year).collect();
        assert_eq!(years, vec![2040, 2041, 2050]);
    }

    #[test]
    fn rejects_retire_year_not_after_current_year() {
        let err = calibrate(&sample_profile(), 2026, 2026, 0.07, 0.0).expect_err("must reject");
        assert!(matches!(err, FireError::InvalidInput(_)));
        assert!(err.to_string().contains("desired_retire_year"));
        assert!(calibrate(&sample_profile(), 2020, 2026, 0.07, 0.0).is_err());
    }

    #[test]
    fn rejects_horizons_beyond_bound() {
        let err = calibrate(&sample_profile(), i32::MAX, -1, 0.07, 0.0).expect_err("too long");
        assert!(err.to_string().contains("horizon"));
        let too_long = 2026 + MAX_HORIZON_YEARS as i32 + 1;
        assert!(calibrate(&sample_profile(), too_long, 2026, 0.07, 0.0).is_err());

        let at_bound = 2026 + MAX_HORIZON_YEARS as i32;
        let result = calibrate(&sample_profile(), at_bound, 2026, 0.07, 0.0).expect("valid");
        assert!(result.required_monthly_savings.is_finite());
    }

    #[test]
    fn rejects_oversized_policy_offsets() {
        let policy = CalibrationPolicy {
            balanced_offset_years: 3,
            lifestyle_offset_years: u32::MAX,
        };
        let request = CalibrationRequest {
            desired_retire_year: 2036,
            current_year: 2026,
            annual_growth_rate: 0.07,
            minimum_needs_floor: 0.0,
        };
        assert!(calibrate_with(&sample_profile(), &request, &policy).is_err());
    }

    #[test]
    fn rejects_non_finite_floor_and_rate() {
        assert!(calibrate(&sample_profile(), 2036, 2026, 0.07, f64::NAN).is_err());
        assert!(calibrate(&sample_profile(), 2036, 2026, f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn negative_floor_is_treated_as_zero() {
        let result = calibrate(&sample_profile(), 2028, 2026, 0.07, -10.0).expect("valid");
        assert!(result.scenarios.iter().all(|s| s.feasible));
    }

    #[test]
    fn zero_growth_inversion_is_linear() {
        let result = calibrate(&sample_profile(), 2036, 2026, 0.0, 0.0).expect("valid");
        // (1.5M - 500k) / (12 * 10)
        assert_approx(result.required_monthly_savings, 1_000_000.0 / 120.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_required_savings_round_trips_to_fire_number(
            expenses in 500u32..15_000,
            net_worth in 0u32..1_000_000,
            horizon in 1i32..45,
            growth_bp in 0i32..1200,
            multiplier_pct in 50u32..200
        ) {
            let profile = FinancialProfile {
                current_age: 30,
                monthly_income: 0.0,
                monthly_expenses: expenses as f64,
                current_net_worth: net_worth as f64,
                lifestyle_multiplier: multiplier_pct as f64 / 100.0,
            };
            let growth = growth_bp as f64 / 10_000.0;
            let result = calibrate(&profile, 2026 + horizon, 2026, growth, 0.0).expect("valid");
            let fire_number = expenses as f64 * profile.lifestyle_multiplier * 12.0 * 25.0;

            let mut balance = net_worth as f64;
            for _ in 0..horizon {
                balance = step_year(balance, growth, result.required_monthly_savings * 12.0);
            }
            if result.required_monthly_savings > 0.0 {
                prop_assert!((balance - fire_number).abs() <= 0.01);
            } else {
                prop_assert!(balance >= fire_number - 0.01);
            }
        }

        #[test]
        fn prop_always_three_scenarios_in_fixed_order(
            income in 0u32..20_000,
            expenses in 0u32..20_000,
            net_worth in 0u32..5_000_000,
            horizon in 1i32..60,
            floor in 0u32..10_000
        ) {
            let profile = FinancialProfile {
                current_age: 40,
                monthly_income: income as f64,
                monthly_expenses: expenses as f64,
                current_net_worth: net_worth as f64,
                lifestyle_multiplier: 1.0,
            };
            let result = calibrate(&profile, 2026 + horizon, 2026, 0.07, floor as f64)
                .expect("valid");
            prop_assert_eq!(result.scenarios.len(), 3);
            prop_assert_eq!(result.scenarios[0].id, ScenarioId::StrictFire);
            prop_assert_eq!(result.scenarios[1].id, ScenarioId::Balanced);
            prop_assert_eq!(result.scenarios[2].id, ScenarioId::Lifestyle);
            for scenario in &result.scenarios {
                prop_assert!(scenario.wants_cut >= 0.0);
                prop_assert_eq!(scenario.feasible, scenario.infeasibility_reason.is_none());
            }
        }
    }
}
