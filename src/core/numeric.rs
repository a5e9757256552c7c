use super::error::FireError;

const RATE_EPS: f64 = 1e-12;

pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<f64, FireError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FireError::invalid(format!("{name} must be a finite number")))
    }
}

/// Rejects NaN/infinity, clamps negatives to zero.
pub(crate) fn clamped_amount(name: &str, value: f64) -> Result<f64, FireError> {
    ensure_finite(name, value).map(|v| v.max(0.0))
}

pub(crate) fn ensure_growth_rate(name: &str, rate: f64) -> Result<f64, FireError> {
    let rate = ensure_finite(name, rate)?;
    if rate <= -1.0 {
        return Err(FireError::invalid(format!("{name} must be > -100%")));
    }
    Ok(rate)
}

pub fn growth_factor(rate: f64, years: u32) -> f64 {
    (1.0 + rate).powi(i32::try_from(years).unwrap_or(i32::MAX))
}

/// Sum of `(1 + rate)^k` for `k` in `0..years`: the future value of one unit
/// contributed at the end of each year.
pub fn annuity_factor(rate: f64, years: u32) -> f64 {
    if years == 0 {
        return 0.0;
    }
    if rate.abs() < RATE_EPS {
        return years as f64;
    }
    (growth_factor(rate, years) - 1.0) / rate
}

/// One year of the forward simulation: grow, then add the year's contribution.
pub fn step_year(balance: f64, rate: f64, annual_contribution: f64) -> f64 {
    balance * (1.0 + rate) + annual_contribution
}

pub fn future_value(start: f64, rate: f64, annual_contribution: f64, years: u32) -> f64 {
    start * growth_factor(rate, years) + annual_contribution * annuity_factor(rate, years)
}

/// Inverts [`future_value`] for the contribution. Never negative; zero when
/// `start` already compounds past `target` on its own.
pub fn required_annual_contribution(target: f64, start: f64, rate: f64, years: u32) -> f64 {
    let factor = annuity_factor(rate, years);
    if factor <= 0.0 {
        return if start >= target { 0.0 } else { f64::INFINITY };
    }
    ((target - start * growth_factor(rate, years)) / factor).max(0.0)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
