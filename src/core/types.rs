use serde::Serialize;

/// Conventional 4% safe withdrawal rate expressed as a multiple of annual spend.
pub const FIRE_MULTIPLE: f64 = 25.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;
pub const DEFAULT_YEAR_CAP: u32 = 99;
/// Upper bound on any simulated horizon: year caps, trajectory lengths and
/// calibration horizons and scenario offsets.
pub const MAX_HORIZON_YEARS: u32 = 150;
pub const INFEASIBLE_CUT_REASON: &str = "Would require cutting below essential needs";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Lifestyle {
    Current,
    Simpler,
    Dream,
}

impl Lifestyle {
    pub fn multiplier(self) -> f64 {
        match self {
            Lifestyle::Current => 1.0,
            Lifestyle::Simpler => 0.8,
            Lifestyle::Dream => 1.5,
        }
    }
}

/// Snapshot of the user's self-reported finances. The engine only ever
/// borrows it; an edit produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialProfile {
    pub current_age: u32,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub current_net_worth: f64,
    pub lifestyle_multiplier: f64,
}

impl FinancialProfile {
    pub fn with_lifestyle(
        current_age: u32,
        monthly_income: f64,
        monthly_expenses: f64,
        current_net_worth: f64,
        lifestyle: Lifestyle,
    ) -> Self {
        Self {
            current_age,
            monthly_income,
            monthly_expenses,
            current_net_worth,
            lifestyle_multiplier: lifestyle.multiplier(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectionAssumptions {
    pub annual_growth_rate: f64,
    pub annual_inflation_rate: f64,
    /// Grow the FIRE number by inflation each simulated year instead of
    /// holding it at today's value.
    pub inflate_target: bool,
    pub year_cap: u32,
}

impl Default for ProjectionAssumptions {
    fn default() -> Self {
        Self {
            annual_growth_rate: 0.07,
            annual_inflation_rate: 0.02,
            inflate_target: false,
            year_cap: DEFAULT_YEAR_CAP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    /// Fraction, not percent. Negative when expenses exceed income.
    pub savings_rate: f64,
    pub monthly_savings: f64,
    pub target_monthly_spend: f64,
    pub fire_number: f64,
    pub years_to_fire: u32,
    pub freedom_age: u32,
    pub reachable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryPoint {
    pub year_offset: u32,
    pub age: u32,
    pub net_worth: f64,
    pub fire_target: f64,
    pub reached: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScenarioId {
    StrictFire,
    Balanced,
    Lifestyle,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 3] = [
        ScenarioId::StrictFire,
        ScenarioId::Balanced,
        ScenarioId::Lifestyle,
    ];
}

#[derive(Debug, Clone, Copy)]
pub struct CalibrationPolicy {
    pub balanced_offset_years: u32,
    pub lifestyle_offset_years: u32,
}

impl CalibrationPolicy {
    pub fn offset_for(&self, id: ScenarioId) -> u32 {
        match id {
            ScenarioId::StrictFire => 0,
            ScenarioId::Balanced => self.balanced_offset_years,
            ScenarioId::Lifestyle => self.lifestyle_offset_years,
        }
    }
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            balanced_offset_years: 3,
            lifestyle_offset_years: 7,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CalibrationRequest {
    pub desired_retire_year: i32,
    pub current_year: i32,
    pub annual_growth_rate: f64,
    pub minimum_needs_floor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationScenario {
    pub id: ScenarioId,
    pub retire_year: i32,
    pub retire_age: u32,
    pub required_monthly_budget: f64,
    pub wants_cut: f64,
    pub feasible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infeasibility_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationResult {
    pub gap: f64,
    pub gap_exists: bool,
    pub required_monthly_savings: f64,
    pub current_monthly_savings: f64,
    pub scenarios: [CalibrationScenario; 3],
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryPolicy {
    pub target_retirement_age: u32,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            target_retirement_age: 55,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireSummary {
    pub fire_number: f64,
    pub freedom_age: u32,
    pub years_left: u32,
    /// Fraction of income; `None` when there is no income to save from.
    pub required_savings_rate: Option<f64>,
    pub current_net_worth: f64,
    pub gap_to_fire: f64,
    pub on_track: bool,
}
