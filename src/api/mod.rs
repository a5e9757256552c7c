mod cli;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Datelike;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    CalibrationPolicy, CalibrationRequest, CalibrationResult, CalibrationScenario,
    FinancialProfile, FireSummary, Lifestyle, MAX_HORIZON_YEARS, ProjectionAssumptions,
    ProjectionResult, SummaryPolicy, TrajectoryPoint, calibrate_with, project_trajectory,
    project_with, round_cents, summarize,
};

pub use cli::{Cli, Command, run_cli};

/// Decides whether a user may use premium-only features such as calibration.
pub trait EntitlementOracle: Send + Sync {
    fn is_premium(&self, user_id: Option<&str>) -> bool;
}

/// Grants (or denies) premium to every caller.
#[derive(Debug, Clone, Copy)]
pub struct StaticEntitlements {
    premium: bool,
}

impl StaticEntitlements {
    pub fn new(premium: bool) -> Self {
        Self { premium }
    }
}

impl EntitlementOracle for StaticEntitlements {
    fn is_premium(&self, _user_id: Option<&str>) -> bool {
        self.premium
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub assumptions: ProjectionAssumptions,
    pub calibration: CalibrationPolicy,
    pub summary: SummaryPolicy,
    /// Share of monthly expenses treated as essential needs when a request
    /// carries no explicit floor.
    pub needs_share: f64,
    pub trajectory_years: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            assumptions: ProjectionAssumptions::default(),
            calibration: CalibrationPolicy::default(),
            summary: SummaryPolicy::default(),
            needs_share: 0.5,
            trajectory_years: 40,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    settings: Settings,
    entitlements: Arc<dyn EntitlementOracle>,
}

impl AppState {
    pub fn new(settings: Settings, entitlements: Arc<dyn EntitlementOracle>) -> Self {
        Self {
            settings,
            entitlements,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ApiLifestyle {
    Current,
    Simpler,
    Dream,
}

impl From<ApiLifestyle> for Lifestyle {
    fn from(value: ApiLifestyle) -> Self {
        match value {
            ApiLifestyle::Current => Lifestyle::Current,
            ApiLifestyle::Simpler => Lifestyle::Simpler,
            ApiLifestyle::Dream => Lifestyle::Dream,
        }
    }
}

/// Onboarding answers, in the snake_case shape the mobile client posts.
#[derive(Debug, Deserialize)]
struct CreateProfilePayload {
    user_id: String,
    username: String,
    #[serde(default)]
    motivations: Vec<String>,
    age: u32,
    currency_code: String,
    rough_monthly_income: f64,
    rough_monthly_expenses: f64,
    rough_net_worth: f64,
    desired_lifestyle: ApiLifestyle,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileView {
    user_id: String,
    username: String,
    motivations: Vec<String>,
    age: u32,
    currency_code: String,
    monthly_income: f64,
    monthly_expenses: f64,
    net_worth: f64,
    desired_lifestyle: ApiLifestyle,
    lifestyle_multiplier: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateProfileResponse {
    profile: ProfileView,
    fire_summary: FireSummary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlannerPayload {
    #[serde(alias = "user_id")]
    user_id: Option<String>,
    #[serde(alias = "age", alias = "current_age")]
    current_age: Option<u32>,
    #[serde(alias = "monthly_income")]
    monthly_income: Option<f64>,
    #[serde(alias = "monthly_expenses")]
    monthly_expenses: Option<f64>,
    #[serde(alias = "netWorth", alias = "current_net_worth")]
    current_net_worth: Option<f64>,
    lifestyle: Option<ApiLifestyle>,
    #[serde(alias = "lifestyle_multiplier")]
    lifestyle_multiplier: Option<f64>,

    #[serde(alias = "growth_rate")]
    growth_rate: Option<f64>,
    #[serde(alias = "inflation_rate")]
    inflation_rate: Option<f64>,
    #[serde(alias = "inflate_target")]
    inflate_target: Option<bool>,
    #[serde(alias = "year_cap")]
    year_cap: Option<u32>,
    #[serde(alias = "trajectory_years")]
    trajectory_years: Option<u32>,

    #[serde(alias = "desired_retire_year")]
    desired_retire_year: Option<i32>,
    #[serde(alias = "current_year")]
    current_year: Option<i32>,
    #[serde(alias = "minimum_needs_floor")]
    minimum_needs_floor: Option<f64>,
}

#[derive(Debug)]
struct PlannerRequest {
    user_id: Option<String>,
    profile: FinancialProfile,
    assumptions: ProjectionAssumptions,
    trajectory_years: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssumptionsView {
    growth_rate: f64,
    inflation_rate: f64,
    inflate_target: bool,
    year_cap: u32,
}

impl From<&ProjectionAssumptions> for AssumptionsView {
    fn from(value: &ProjectionAssumptions) -> Self {
        Self {
            growth_rate: value.annual_growth_rate,
            inflation_rate: value.annual_inflation_rate,
            inflate_target: value.inflate_target,
            year_cap: value.year_cap,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectResponse {
    assumptions: AssumptionsView,
    projection: ProjectionResult,
    trajectory: Vec<TrajectoryPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalibrateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    projection: ProjectionResult,
    calibration: CalibrationResult,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/profile", post(create_profile_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .route("/api/calibrate", post(calibrate_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("FIRE planner API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/healthz");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn create_profile_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateProfilePayload>,
) -> Response {
    match build_create_profile_response(payload, &state.settings) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!("rejected profile: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

async fn project_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<PlannerPayload>,
) -> Response {
    project_handler_impl(&state, payload)
}

async fn project_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<PlannerPayload>,
) -> Response {
    project_handler_impl(&state, payload)
}

fn project_handler_impl(state: &AppState, payload: PlannerPayload) -> Response {
    let result = planner_request_from_payload(&payload, &state.settings).and_then(|request| {
        build_project_response(
            &request.profile,
            &request.assumptions,
            request.trajectory_years,
        )
    });
    match result {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!("rejected projection: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

async fn calibrate_handler(
    State(state): State<AppState>,
    Json(payload): Json<PlannerPayload>,
) -> Response {
    if !state.entitlements.is_premium(payload.user_id.as_deref()) {
        return error_response(
            StatusCode::FORBIDDEN,
            "Calibration requires a premium subscription",
        );
    }

    let result = planner_request_from_payload(&payload, &state.settings).and_then(|request| {
        let calibration =
            calibration_request_from_payload(&payload, &request, &state.settings, clock_year())?;
        build_calibrate_response(request, &calibration, &state.settings.calibration)
    });
    match result {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => {
            warn!("rejected calibration: {msg}");
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
    }
}

fn clock_year() -> i32 {
    chrono::Local::now().year()
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn build_create_profile_response(
    payload: CreateProfilePayload,
    settings: &Settings,
) -> Result<CreateProfileResponse, String> {
    let profile = FinancialProfile::with_lifestyle(
        payload.age,
        payload.rough_monthly_income,
        payload.rough_monthly_expenses,
        payload.rough_net_worth,
        payload.desired_lifestyle.into(),
    );
    let summary =
        summarize(&profile, &settings.assumptions, &settings.summary).map_err(|e| e.to_string())?;

    Ok(CreateProfileResponse {
        profile: ProfileView {
            user_id: payload.user_id,
            username: payload.username,
            motivations: payload.motivations,
            age: payload.age,
            currency_code: payload.currency_code,
            monthly_income: round_cents(profile.monthly_income.max(0.0)),
            monthly_expenses: round_cents(profile.monthly_expenses.max(0.0)),
            net_worth: round_cents(summary.current_net_worth),
            desired_lifestyle: payload.desired_lifestyle,
            lifestyle_multiplier: profile.lifestyle_multiplier,
        },
        fire_summary: rounded_summary(summary),
    })
}

fn planner_request_from_payload(
    payload: &PlannerPayload,
    settings: &Settings,
) -> Result<PlannerRequest, String> {
    let Some(current_age) = payload.current_age else {
        return Err("currentAge is required".to_string());
    };
    let Some(monthly_income) = payload.monthly_income else {
        return Err("monthlyIncome is required".to_string());
    };
    let Some(monthly_expenses) = payload.monthly_expenses else {
        return Err("monthlyExpenses is required".to_string());
    };

    let lifestyle_multiplier = match (payload.lifestyle_multiplier, payload.lifestyle) {
        (Some(multiplier), _) => multiplier,
        (None, Some(lifestyle)) => Lifestyle::from(lifestyle).multiplier(),
        (None, None) => Lifestyle::Current.multiplier(),
    };
    if !lifestyle_multiplier.is_finite() || lifestyle_multiplier <= 0.0 {
        return Err("lifestyleMultiplier must be > 0".to_string());
    }

    let mut assumptions = settings.assumptions;
    if let Some(v) = payload.growth_rate {
        if !v.is_finite() || v <= -100.0 {
            return Err("growthRate must be > -100".to_string());
        }
        assumptions.annual_growth_rate = v / 100.0;
    }
    if let Some(v) = payload.inflation_rate {
        if !v.is_finite() || v <= -100.0 {
            return Err("inflationRate must be > -100".to_string());
        }
        assumptions.annual_inflation_rate = v / 100.0;
    }
    if let Some(v) = payload.inflate_target {
        assumptions.inflate_target = v;
    }
    if let Some(v) = payload.year_cap {
        if v == 0 || v > MAX_HORIZON_YEARS {
            return Err(format!("yearCap must be between 1 and {MAX_HORIZON_YEARS}"));
        }
        assumptions.year_cap = v;
    }
    let trajectory_years = payload.trajectory_years.unwrap_or(settings.trajectory_years);
    if trajectory_years > MAX_HORIZON_YEARS {
        return Err(format!("trajectoryYears must be <= {MAX_HORIZON_YEARS}"));
    }

    Ok(PlannerRequest {
        user_id: payload.user_id.clone(),
        profile: FinancialProfile {
            current_age,
            monthly_income,
            monthly_expenses,
            current_net_worth: payload.current_net_worth.unwrap_or(0.0),
            lifestyle_multiplier,
        },
        assumptions,
        trajectory_years,
    })
}

fn calibration_request_from_payload(
    payload: &PlannerPayload,
    request: &PlannerRequest,
    settings: &Settings,
    clock_year: i32,
) -> Result<CalibrationRequest, String> {
    let Some(desired_retire_year) = payload.desired_retire_year else {
        return Err("desiredRetireYear is required".to_string());
    };
    let current_year = payload.current_year.unwrap_or(clock_year);
    if desired_retire_year <= current_year {
        return Err("desiredRetireYear must be after currentYear".to_string());
    }

    let minimum_needs_floor = payload
        .minimum_needs_floor
        .unwrap_or(request.profile.monthly_expenses.max(0.0) * settings.needs_share);

    Ok(CalibrationRequest {
        desired_retire_year,
        current_year,
        annual_growth_rate: request.assumptions.annual_growth_rate,
        minimum_needs_floor,
    })
}

pub(crate) fn build_project_response(
    profile: &FinancialProfile,
    assumptions: &ProjectionAssumptions,
    trajectory_years: u32,
) -> Result<ProjectResponse, String> {
    let projection = project_with(profile, assumptions).map_err(|e| e.to_string())?;
    let trajectory =
        project_trajectory(profile, assumptions, trajectory_years).map_err(|e| e.to_string())?;

    Ok(ProjectResponse {
        assumptions: assumptions.into(),
        projection: rounded_projection(projection),
        trajectory: trajectory.into_iter().map(rounded_point).collect(),
    })
}

fn build_calibrate_response(
    request: PlannerRequest,
    calibration: &CalibrationRequest,
    policy: &CalibrationPolicy,
) -> Result<CalibrateResponse, String> {
    let projection =
        project_with(&request.profile, &request.assumptions).map_err(|e| e.to_string())?;
    let result =
        calibrate_with(&request.profile, calibration, policy).map_err(|e| e.to_string())?;

    Ok(CalibrateResponse {
        user_id: request.user_id,
        projection: rounded_projection(projection),
        calibration: rounded_calibration(result),
    })
}

pub(crate) fn build_cli_calibrate_response(
    profile: FinancialProfile,
    assumptions: ProjectionAssumptions,
    calibration: &CalibrationRequest,
    policy: &CalibrationPolicy,
) -> Result<CalibrateResponse, String> {
    build_calibrate_response(
        PlannerRequest {
            user_id: None,
            profile,
            assumptions,
            trajectory_years: 0,
        },
        calibration,
        policy,
    )
}

fn rounded_projection(projection: ProjectionResult) -> ProjectionResult {
    ProjectionResult {
        monthly_savings: round_cents(projection.monthly_savings),
        target_monthly_spend: round_cents(projection.target_monthly_spend),
        fire_number: round_cents(projection.fire_number),
        ..projection
    }
}

fn rounded_point(point: TrajectoryPoint) -> TrajectoryPoint {
    TrajectoryPoint {
        net_worth: round_cents(point.net_worth),
        fire_target: round_cents(point.fire_target),
        ..point
    }
}

fn rounded_scenario(scenario: CalibrationScenario) -> CalibrationScenario {
    CalibrationScenario {
        required_monthly_budget: round_cents(scenario.required_monthly_budget),
        wants_cut: round_cents(scenario.wants_cut),
        ..scenario
    }
}

fn rounded_calibration(result: CalibrationResult) -> CalibrationResult {
    CalibrationResult {
        gap: round_cents(result.gap),
        required_monthly_savings: round_cents(result.required_monthly_savings),
        current_monthly_savings: round_cents(result.current_monthly_savings),
        scenarios: result.scenarios.map(rounded_scenario),
        ..result
    }
}

fn rounded_summary(summary: FireSummary) -> FireSummary {
    FireSummary {
        fire_number: round_cents(summary.fire_number),
        current_net_worth: round_cents(summary.current_net_worth),
        gap_to_fire: round_cents(summary.gap_to_fire),
        ..summary
    }
}
