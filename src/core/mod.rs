mod engine;
mod error;
mod numeric;
mod solver;
mod summary;
mod types;

pub use engine::{project, project_trajectory, project_with};
pub use error::FireError;
pub use numeric::round_cents;
pub use solver::{calibrate, calibrate_with};
pub use summary::summarize;
pub use types::{
    CalibrationPolicy, CalibrationRequest, CalibrationResult, CalibrationScenario,
    DEFAULT_YEAR_CAP, FinancialProfile, FireSummary, Lifestyle, MAX_HORIZON_YEARS,
    ProjectionAssumptions, ProjectionResult, ScenarioId, SummaryPolicy, TrajectoryPoint,
};
