//! Closed-form LogNormal math in `(loc, scale)` form.
//!
//! `loc` and `scale` are the mean and standard deviation of `ln X`, which is
//! the same parametrization `rand_distr::LogNormal::new(mu, sigma)` uses.

use puruspe::{erf, inverf};
use rand_distr::LogNormal;

use crate::error::{finite, positive, Error, Result};

/// Natural log of `sqrt(2π)`.
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Probability level of the upper estimate in [`log_params_from_estimates`].
pub const Q95: f64 = 0.95;

/// Moment matching: the `(loc, scale)` whose LogNormal has the given mean and
/// standard deviation.
///
/// `scale = sqrt(ln(1 + (stddev/mean)^2))`, `loc = ln(mean) - scale^2 / 2`.
pub fn log_params_from_moments(mean: f64, stddev: f64) -> Result<(f64, f64)> {
    let mean = positive("mean", mean)?;
    let stddev = positive("stddev", stddev)?;

    let cv = stddev / mean;
    let variance = finite("log-space variance", (cv * cv).ln_1p())?;
    let scale = finite("scale", variance.sqrt())?;
    if scale <= 0.0 {
        return Err(Error::ComputationFailure(format!(
            "scale underflowed to zero (stddev/mean = {})",
            cv
        )));
    }
    let loc = finite("loc", mean.ln() - 0.5 * variance)?;

    Ok((loc, scale))
}

/// `(loc, scale)` from a median and a 95th percentile estimate.
pub fn log_params_from_estimates(q50: f64, q95: f64) -> Result<(f64, f64)> {
    let q50 = positive("median", q50)?;
    let q95 = positive("q95", q95)?;
    if q95 <= q50 {
        return Err(Error::InvalidInput(format!(
            "q95 must be greater than the median, got median={} q95={}",
            q50, q95
        )));
    }

    let scale = 1.0 / 2.0_f64.sqrt()
        * ((q95 / q50).ln() / (inverf(2.0 * Q95 - 1.0) - inverf(2.0 * 0.50 - 1.0)));
    let loc = q50.ln() - (2.0 * scale * scale).sqrt() * inverf(2.0 * 0.50 - 1.0);

    Ok((finite("loc", loc)?, finite("scale", scale)?))
}

/// Build the sampling distribution, checking the parameters on the way.
pub fn distribution(loc: f64, scale: f64) -> Result<LogNormal<f64>> {
    let loc = finite("loc", loc)?;
    let scale = positive("scale", scale)?;
    LogNormal::new(loc, scale).map_err(|e| Error::ComputationFailure(e.to_string()))
}

/// Analytic mean `exp(loc + scale^2 / 2)`.
pub fn mean(loc: f64, scale: f64) -> f64 {
    (loc + 0.5 * scale * scale).exp()
}

/// Analytic standard deviation `mean * sqrt(exp(scale^2) - 1)`.
pub fn std_dev(loc: f64, scale: f64) -> f64 {
    mean(loc, scale) * (scale * scale).exp_m1().sqrt()
}

/// Log-PDF at `x`; `-inf` outside the support.
///
/// `log p(x) = -0.5 * ((ln x - loc)/scale)^2 - ln(scale) - ln(sqrt(2π)) - ln x`
pub fn logpdf(x: f64, loc: f64, scale: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let lx = x.ln();
    let z = (lx - loc) / scale;
    -0.5 * z * z - scale.ln() - LN_SQRT_2PI - lx
}

pub fn pdf(x: f64, loc: f64, scale: f64) -> f64 {
    logpdf(x, loc, scale).exp()
}

pub fn cdf(x: f64, loc: f64, scale: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    0.5 * (1.0 + erf((x.ln() - loc) / (scale * std::f64::consts::SQRT_2)))
}

/// Inverse CDF for `p` in `(0, 1)`.
pub fn quantile(p: f64, loc: f64, scale: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::InvalidInput(format!("probability must be in (0, 1), got {}", p)));
    }
    let z = std::f64::consts::SQRT_2 * inverf(2.0 * p - 1.0);
    finite("quantile", (loc + scale * z).exp())
}
