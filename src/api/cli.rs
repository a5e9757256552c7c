use std::sync::Arc;

use chrono::Datelike;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use super::{AppState, Settings, StaticEntitlements, build_cli_calibrate_response};
use super::{build_project_response, run_http_server};
use crate::core::{
    CalibrationPolicy, CalibrationRequest, FinancialProfile, Lifestyle, MAX_HORIZON_YEARS,
    ProjectionAssumptions, SummaryPolicy,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliLifestyle {
    Current,
    Simpler,
    Dream,
}

impl From<CliLifestyle> for Lifestyle {
    fn from(value: CliLifestyle) -> Self {
        match value {
            CliLifestyle::Current => Lifestyle::Current,
            CliLifestyle::Simpler => Lifestyle::Simpler,
            CliLifestyle::Dream => Lifestyle::Dream,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fire-planner",
    about = "FIRE number, freedom age and retirement calibration scenarios"
)]
pub struct Cli {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct AssumptionArgs {
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual portfolio growth in percent, e.g. 7"
    )]
    pub growth_rate: f64,
    #[arg(long, default_value_t = 2.0, help = "Expected annual inflation in percent")]
    pub inflation_rate: f64,
    #[arg(
        long,
        default_value_t = false,
        help = "Grow the FIRE number with inflation during the projection"
    )]
    pub inflate_target: bool,
    #[arg(
        long,
        default_value_t = 99,
        help = "Years after which FIRE is reported as not reachable"
    )]
    pub year_cap: u32,
    #[arg(
        long,
        default_value_t = 3,
        help = "Years the balanced scenario adds to the desired retirement year"
    )]
    pub balanced_offset: u32,
    #[arg(
        long,
        default_value_t = 7,
        help = "Years the lifestyle scenario adds to the desired retirement year"
    )]
    pub lifestyle_offset: u32,
    #[arg(
        long,
        default_value_t = 55,
        help = "Retirement age used for the on-track flag and required savings rate"
    )]
    pub target_retirement_age: u32,
    #[arg(
        long,
        default_value_t = 50.0,
        help = "Share of monthly expenses treated as essential needs, in percent"
    )]
    pub needs_share: f64,
    #[arg(long, default_value_t = 40, help = "Years of trajectory to report")]
    pub trajectory_years: u32,
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    pub age: u32,
    #[arg(long, help = "After-tax monthly income")]
    pub monthly_income: f64,
    #[arg(long)]
    pub monthly_expenses: f64,
    #[arg(long, default_value_t = 0.0)]
    pub net_worth: f64,
    #[arg(long, value_enum, default_value_t = CliLifestyle::Current)]
    pub lifestyle: CliLifestyle,
    #[arg(long, help = "Overrides the multiplier implied by --lifestyle")]
    pub lifestyle_multiplier: Option<f64>,
}

impl ProfileArgs {
    fn to_profile(&self) -> FinancialProfile {
        let mut profile = FinancialProfile::with_lifestyle(
            self.age,
            self.monthly_income,
            self.monthly_expenses,
            self.net_worth,
            self.lifestyle.into(),
        );
        if let Some(multiplier) = self.lifestyle_multiplier {
            profile.lifestyle_multiplier = multiplier;
        }
        profile
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, help = "Treat every caller as a premium subscriber")]
        premium: bool,
    },
    /// Print the projection and trajectory for one profile.
    Project {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Print the three calibration scenarios for one profile.
    Calibrate {
        #[command(flatten)]
        profile: ProfileArgs,
        #[arg(long)]
        desired_retire_year: i32,
        #[arg(long, help = "Defaults to the current calendar year")]
        current_year: Option<i32>,
        #[arg(long, help = "Monthly spend that cannot be cut; defaults to --needs-share")]
        needs_floor: Option<f64>,
    },
}

pub fn build_settings(args: &AssumptionArgs) -> Result<Settings, String> {
    if !args.growth_rate.is_finite() || args.growth_rate <= -100.0 {
        return Err("--growth-rate must be > -100".to_string());
    }
    if !args.inflation_rate.is_finite() || args.inflation_rate <= -100.0 {
        return Err("--inflation-rate must be > -100".to_string());
    }
    if args.year_cap == 0 || args.year_cap > MAX_HORIZON_YEARS {
        return Err(format!("--year-cap must be between 1 and {MAX_HORIZON_YEARS}"));
    }
    if args.trajectory_years > MAX_HORIZON_YEARS {
        return Err(format!("--trajectory-years must be <= {MAX_HORIZON_YEARS}"));
    }
    if args.lifestyle_offset < args.balanced_offset {
        return Err("--lifestyle-offset must be >= --balanced-offset".to_string());
    }
    if args.lifestyle_offset > MAX_HORIZON_YEARS {
        return Err(format!("--lifestyle-offset must be <= {MAX_HORIZON_YEARS}"));
    }
    if !(0.0..=100.0).contains(&args.needs_share) {
        return Err("--needs-share must be between 0 and 100".to_string());
    }

    Ok(Settings {
        assumptions: ProjectionAssumptions {
            annual_growth_rate: args.growth_rate / 100.0,
            annual_inflation_rate: args.inflation_rate / 100.0,
            inflate_target: args.inflate_target,
            year_cap: args.year_cap,
        },
        calibration: CalibrationPolicy {
            balanced_offset_years: args.balanced_offset,
            lifestyle_offset_years: args.lifestyle_offset,
        },
        summary: SummaryPolicy {
            target_retirement_age: args.target_retirement_age,
        },
        needs_share: args.needs_share / 100.0,
        trajectory_years: args.trajectory_years,
    })
}

pub async fn run_cli(cli: Cli) -> Result<(), String> {
    let settings = build_settings(&cli.assumptions)?;

    match cli.command {
        Command::Serve { port, premium } => {
            info!("starting server on port {port} (premium for all callers: {premium})");
            let state = AppState::new(settings, Arc::new(StaticEntitlements::new(premium)));
            run_http_server(port, state)
                .await
                .map_err(|e| format!("Server error: {e}"))
        }
        Command::Project { profile } => {
            let response = build_project_response(
                &profile.to_profile(),
                &settings.assumptions,
                settings.trajectory_years,
            )?;
            print_json(&response)
        }
        Command::Calibrate {
            profile,
            desired_retire_year,
            current_year,
            needs_floor,
        } => {
            let profile = profile.to_profile();
            let current_year = current_year.unwrap_or_else(|| chrono::Local::now().year());
            let minimum_needs_floor =
                needs_floor.unwrap_or(profile.monthly_expenses.max(0.0) * settings.needs_share);
            let request = CalibrationRequest {
                desired_retire_year,
                current_year,
                annual_growth_rate: settings.assumptions.annual_growth_rate,
                minimum_needs_floor,
            };
            let response = build_cli_calibrate_response(
                profile,
                settings.assumptions,
                &request,
                &settings.calibration,
            )?;
            print_json(&response)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("JSON error: {e}"))?;
    println!("{json}");
    Ok(())
}
