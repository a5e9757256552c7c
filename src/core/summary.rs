use super::engine::{CheckedProfile, project_with};
use super::error::FireError;
use super::solver::required_monthly_savings;
use super::types::{FinancialProfile, FireSummary, ProjectionAssumptions, SummaryPolicy};

/// Builds the `fireSummary` block returned when a profile is created.
pub fn summarize(
    profile: &FinancialProfile,
    assumptions: &ProjectionAssumptions,
    policy: &SummaryPolicy,
) -> Result<FireSummary, FireError> {
    let projection = project_with(profile, assumptions)?;
    let checked = CheckedProfile::from_profile(profile)?;

    let horizon = policy
        .target_retirement_age
        .saturating_sub(checked.current_age)
        .max(1);
    let required_monthly =
        required_monthly_savings(&checked, assumptions.annual_growth_rate, horizon);
    let required_savings_rate =
        (checked.monthly_income > 0.0).then(|| required_monthly / checked.monthly_income);

    Ok(FireSummary {
        fire_number: projection.fire_number,
        freedom_age: projection.freedom_age,
        years_left: projection.years_to_fire,
        required_savings_rate,
        current_net_worth: checked.current_net_worth,
        gap_to_fire: (projection.fire_number - checked.current_net_worth).max(0.0),
        on_track: projection.reachable && projection.freedom_age <= policy.target_retirement_age,
    })
}
