use log::debug;

use super::error::FireError;
use super::numeric::{clamped_amount, ensure_finite, ensure_growth_rate, growth_factor, step_year};
use super::types::{
    FIRE_MULTIPLE, FinancialProfile, MAX_HORIZON_YEARS, MONTHS_PER_YEAR, ProjectionAssumptions,
    ProjectionResult, TrajectoryPoint,
};

/// Profile after boundary checks: every amount finite and non-negative.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CheckedProfile {
    pub current_age: u32,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub current_net_worth: f64,
    pub lifestyle_multiplier: f64,
}

impl CheckedProfile {
    pub(crate) fn from_profile(profile: &FinancialProfile) -> Result<Self, FireError> {
        let lifestyle_multiplier =
            ensure_finite("lifestyle_multiplier", profile.lifestyle_multiplier)?;
        if lifestyle_multiplier <= 0.0 {
            return Err(FireError::invalid("lifestyle_multiplier must be > 0"));
        }
        Ok(Self {
            current_age: profile.current_age,
            monthly_income: clamped_amount("monthly_income", profile.monthly_income)?,
            monthly_expenses: clamped_amount("monthly_expenses", profile.monthly_expenses)?,
            current_net_worth: clamped_amount("current_net_worth", profile.current_net_worth)?,
            lifestyle_multiplier,
        })
    }

    pub(crate) fn monthly_savings(&self) -> f64 {
        (self.monthly_income - self.monthly_expenses).max(0.0)
    }

    pub(crate) fn savings_rate(&self) -> f64 {
        if self.monthly_income > 0.0 {
            (self.monthly_income - self.monthly_expenses) / self.monthly_income
        } else {
            0.0
        }
    }

    pub(crate) fn target_monthly_spend(&self) -> f64 {
        self.monthly_expenses * self.lifestyle_multiplier
    }

    pub(crate) fn fire_number(&self) -> f64 {
        self.target_monthly_spend() * MONTHS_PER_YEAR * FIRE_MULTIPLE
    }
}

/// Projects a profile with the default target handling (FIRE number held at
/// today's value) and the default year cap.
pub fn project(
    profile: &FinancialProfile,
    annual_growth_rate: f64,
    annual_inflation_rate: f64,
) -> Result<ProjectionResult, FireError> {
    project_with(
        profile,
        &ProjectionAssumptions {
            annual_growth_rate,
            annual_inflation_rate,
            ..ProjectionAssumptions::default()
        },
    )
}

pub fn project_with(
    profile: &FinancialProfile,
    assumptions: &ProjectionAssumptions,
) -> Result<ProjectionResult, FireError> {
    let checked = CheckedProfile::from_profile(profile)?;
    validate_assumptions(assumptions)?;

    let monthly_savings = checked.monthly_savings();
    let fire_number = checked.fire_number();
    let years_to_fire = simulate_years_to_fire(&checked, assumptions);
    debug!(
        "projected fire_number={fire_number:.2} monthly_savings={monthly_savings:.2} years_to_fire={years_to_fire}"
    );

    Ok(ProjectionResult {
        savings_rate: checked.savings_rate(),
        monthly_savings,
        target_monthly_spend: checked.target_monthly_spend(),
        fire_number,
        years_to_fire,
        freedom_age: checked.current_age.saturating_add(years_to_fire),
        reachable: years_to_fire < assumptions.year_cap,
    })
}

/// Year-by-year balances for the retirement-age chart. Row 0 is today; there
/// are `years + 1` rows in total.
pub fn project_trajectory(
    profile: &FinancialProfile,
    assumptions: &ProjectionAssumptions,
    years: u32,
) -> Result<Vec<TrajectoryPoint>, FireError> {
    let checked = CheckedProfile::from_profile(profile)?;
    validate_assumptions(assumptions)?;
    if years > MAX_HORIZON_YEARS {
        return Err(FireError::invalid(format!(
            "trajectory years must be <= {MAX_HORIZON_YEARS}"
        )));
    }

    let annual_contribution = checked.monthly_savings() * MONTHS_PER_YEAR;
    let fire_number = checked.fire_number();
    let mut net_worth = checked.current_net_worth;
    let mut points = Vec::with_capacity(years as usize + 1);
    for year_offset in 0..=years {
        if year_offset > 0 {
            net_worth = step_year(net_worth, assumptions.annual_growth_rate, annual_contribution);
        }
        let fire_target = target_for_year(fire_number, assumptions, year_offset);
        points.push(TrajectoryPoint {
            year_offset,
            age: checked.current_age.saturating_add(year_offset),
            net_worth,
            fire_target,
            reached: net_worth >= fire_target,
        });
    }
    Ok(points)
}

pub(crate) fn validate_assumptions(assumptions: &ProjectionAssumptions) -> Result<(), FireError> {
    ensure_growth_rate("annual_growth_rate", assumptions.annual_growth_rate)?;
    ensure_growth_rate("annual_inflation_rate", assumptions.annual_inflation_rate)?;
    if assumptions.year_cap == 0 {
        return Err(FireError::invalid("year_cap must be > 0"));
    }
    if assumptions.year_cap > MAX_HORIZON_YEARS {
        return Err(FireError::invalid(format!(
            "year_cap must be <= {MAX_HORIZON_YEARS}"
        )));
    }
    Ok(())
}

fn target_for_year(fire_number: f64, assumptions: &ProjectionAssumptions, year: u32) -> f64 {
    if assumptions.inflate_target {
        fire_number * growth_factor(assumptions.annual_inflation_rate, year)
    } else {
        fire_number
    }
}

fn simulate_years_to_fire(profile: &CheckedProfile, assumptions: &ProjectionAssumptions) -> u32 {
    let fire_number = profile.fire_number();
    let mut accumulated = profile.current_net_worth;
    if accumulated >= fire_number {
        return 0;
    }

    let annual_contribution = profile.monthly_savings() * MONTHS_PER_YEAR;
    // Nothing going in, nothing compounding and a target that never shrinks.
    let target_can_shrink = assumptions.inflate_target && assumptions.annual_inflation_rate < 0.0;
    if annual_contribution <= 0.0
        && (accumulated <= 0.0 || assumptions.annual_growth_rate <= 0.0)
        && !target_can_shrink
    {
        return assumptions.year_cap;
    }

    let mut years = 0;
    while years < assumptions.year_cap {
        accumulated = step_year(accumulated, assumptions.annual_growth_rate, annual_contribution);
        years += 1;
        if accumulated >= target_for_year(fire_number, assumptions, years) {
            return years;
        }
    }
    assumptions.year_cap
}
