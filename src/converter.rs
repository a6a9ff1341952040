//! Moment matching from real-space `(mean, stddev)` to LogNormal `(loc, scale)`.
//!
//! A conversion is a single request/response computation: the target moments
//! are validated, converted, verified against the analytic moments of the
//! resulting distribution, and the density is sampled for display.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};

use crate::error::{finite, positive, Error, Result};
use crate::statistics;

/// Target moments of the positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealMoments {
    pub mean: f64,
    pub stddev: f64,
}

impl RealMoments {
    pub fn new(mean: f64, stddev: f64) -> Result<Self> {
        Ok(Self { mean: positive("mean", mean)?, stddev: positive("stddev", stddev)? })
    }
}

/// Mean (`loc`) and standard deviation (`scale`) of `ln X`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogParams {
    pub loc: f64,
    pub scale: f64,
}

impl LogParams {
    pub fn distribution(&self) -> Result<LogNormal<f64>> {
        statistics::distribution(self.loc, self.scale)
    }
}

/// Analytic moments of the distribution rebuilt from [`LogParams`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerifiedMoments {
    pub mean: f64,
    pub stddev: f64,
}

/// Moments estimated from random draws of the rebuilt distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalMoments {
    pub samples: usize,
    pub mean: f64,
    pub stddev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantiles {
    pub q05: f64,
    pub median: f64,
    pub q95: f64,
}

/// Density samples `(x, pdf(x))` with strictly increasing `x`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DensityCurve {
    pub points: Vec<(f64, f64)>,
}

impl DensityCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(x, _)| x)
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(_, y)| y)
    }

    pub fn max_density(&self) -> f64 {
        self.ys().fold(0.0_f64, f64::max)
    }
}

/// Full response of a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub input: RealMoments,
    pub params: LogParams,
    pub verified: VerifiedMoments,
    pub quantiles: Quantiles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empirical: Option<EmpiricalMoments>,
    pub curve: DensityCurve,
}

/// Knobs of a conversion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConverterConfig {
    /// Number of density samples.
    pub points: usize,
    /// First `x` of the density curve; `x = 0` is excluded.
    pub lower_bound: f64,
    /// The curve ends at `mean + tail_stddevs * stddev`.
    pub tail_stddevs: f64,
    /// Random draws for the empirical check (0 disables it).
    pub samples: usize,
    pub seed: Option<u64>,
}

pub const DEFAULT_POINTS: usize = 500;
pub const DEFAULT_LOWER_BOUND: f64 = 0.001;
pub const DEFAULT_TAIL_STDDEVS: f64 = 4.0;

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            points: DEFAULT_POINTS,
            lower_bound: DEFAULT_LOWER_BOUND,
            tail_stddevs: DEFAULT_TAIL_STDDEVS,
            samples: 0,
            seed: None,
        }
    }
}

/// Convert target moments into log-space parameters.
pub fn convert_to_log_params(mean: f64, stddev: f64) -> Result<LogParams> {
    let (loc, scale) = statistics::log_params_from_moments(mean, stddev)?;
    Ok(LogParams { loc, scale })
}

/// Rebuild the distribution from `params` and report its analytic moments.
pub fn verify(params: LogParams) -> Result<VerifiedMoments> {
    params.distribution()?;
    Ok(VerifiedMoments {
        mean: finite("verified mean", statistics::mean(params.loc, params.scale))?,
        stddev: finite("verified stddev", statistics::std_dev(params.loc, params.scale))?,
    })
}

/// Sample the density over `[0.001, mean + 4 * stddev]` at `num_points` points.
///
/// See [`density_on`] for curves ending below 0.001.
pub fn sample_density(
    params: LogParams,
    moments: RealMoments,
    num_points: usize,
) -> Result<DensityCurve> {
    let lower = DEFAULT_LOWER_BOUND;
    let upper = moments.mean + DEFAULT_TAIL_STDDEVS * moments.stddev;
    density_on(params, lower, upper, num_points)
}

/// Sample the density at `num_points` evenly spaced points of `[lower, upper]`.
///
/// When `upper <= lower` the grid starts at `upper / num_points` instead, so
/// tiny moments still get a curve ending at `upper`. A single point is
/// `upper` itself.
pub fn density_on(
    params: LogParams,
    lower: f64,
    upper: f64,
    num_points: usize,
) -> Result<DensityCurve> {
    if num_points == 0 {
        return Err(Error::InvalidInput("at least 1 density point is required".into()));
    }
    let lower = positive("lower bound", lower)?;
    let upper = finite("upper bound", upper)?;
    let upper = positive("upper bound", upper)?;
    let lower = if upper <= lower {
        tracing::debug!(lower, upper, "lower bound above curve end, starting inside the support");
        upper / num_points as f64
    } else {
        lower
    };

    let step = match num_points {
        1 => 0.0,
        n => (upper - lower) / (n - 1) as f64,
    };
    let mut points = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let x = if i == num_points - 1 { upper } else { lower + step * i as f64 };
        let y = statistics::pdf(x, params.loc, params.scale);
        if !y.is_finite() || y < 0.0 {
            return Err(Error::ComputationFailure(format!("density at x={} is {}", x, y)));
        }
        points.push((x, y));
    }

    if points.windows(2).any(|w| w[1].0 <= w[0].0) {
        return Err(Error::ComputationFailure(format!(
            "density grid over [{}, {}] is too fine for {} points",
            lower, upper, num_points
        )));
    }

    Ok(DensityCurve { points })
}

/// Parameters and implied moments from a median and 95th percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimateConversion {
    pub median: f64,
    pub q95: f64,
    pub params: LogParams,
    pub implied: VerifiedMoments,
}

pub fn convert_from_estimates(median: f64, q95: f64) -> Result<EstimateConversion> {
    let (loc, scale) = statistics::log_params_from_estimates(median, q95)?;
    let params = LogParams { loc, scale };
    Ok(EstimateConversion { median, q95, params, implied: verify(params)? })
}

pub fn quantiles(params: LogParams) -> Result<Quantiles> {
    Ok(Quantiles {
        q05: statistics::quantile(0.05, params.loc, params.scale)?,
        median: statistics::quantile(0.5, params.loc, params.scale)?,
        q95: statistics::quantile(statistics::Q95, params.loc, params.scale)?,
    })
}

/// Draw `samples` values and report their mean and sample standard deviation.
pub fn empirical_moments(
    params: LogParams,
    samples: usize,
    seed: Option<u64>,
) -> Result<EmpiricalMoments> {
    if samples < 2 {
        return Err(Error::InvalidInput(format!(
            "at least 2 samples are required, got {}",
            samples
        )));
    }
    let dist = params.distribution()?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Welford
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (i, x) in dist.sample_iter(&mut rng).take(samples).enumerate() {
        let delta = x - mean;
        mean += delta / (i + 1) as f64;
        m2 += delta * (x - mean);
    }

    Ok(EmpiricalMoments {
        samples,
        mean: finite("empirical mean", mean)?,
        stddev: finite("empirical stddev", (m2 / (samples - 1) as f64).sqrt())?,
    })
}

/// Runs full conversions with a fixed [`ConverterConfig`].
#[derive(Debug, Clone, Default)]
pub struct MomentConverter {
    config: ConverterConfig,
}

impl MomentConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn convert(&self, mean: f64, stddev: f64) -> Result<Conversion> {
        let input = RealMoments::new(mean, stddev)?;
        let params = convert_to_log_params(input.mean, input.stddev)?;
        tracing::debug!(loc = params.loc, scale = params.scale, "log-space parameters");

        let verified = verify(params)?;
        tracing::debug!(mean = verified.mean, stddev = verified.stddev, "verified moments");

        let upper = finite("upper bound", input.mean + self.config.tail_stddevs * input.stddev)?;
        let curve = density_on(params, self.config.lower_bound, upper, self.config.points)?;
        let quantiles = quantiles(params)?;

        let empirical = match self.config.samples {
            0 => None,
            n => {
                let e = empirical_moments(params, n, self.config.seed)?;
                tracing::debug!(samples = n, mean = e.mean, stddev = e.stddev, "empirical moments");
                Some(e)
            }
        };

        Ok(Conversion { input, params, verified, quantiles, empirical, curve })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_trip_scenario_a() {
        let params = convert_to_log_params(2.0, 1.0).unwrap();
        let v = verify(params).unwrap();
        assert_relative_eq!(v.mean, 2.0, max_relative = 1e-12);
        assert_relative_eq!(v.stddev, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_scenario_b() {
        let params = convert_to_log_params(1.0, 1.0).unwrap();
        assert_relative_eq!(params.scale, 0.832_554_611_157_697_7, epsilon = 1e-12);
        assert_relative_eq!(params.loc, -0.346_573_590_279_972_6, epsilon = 1e-12);
    }

    #[test]
    fn test_near_zero_variance_is_stable() {
        let input = RealMoments::new(10.0, 0.0001).unwrap();
        let params = convert_to_log_params(input.mean, input.stddev).unwrap();
        assert_relative_eq!(params.scale, 1e-5, max_relative = 1e-6);
        assert_relative_eq!(params.loc, 10.0_f64.ln(), epsilon = 1e-9);

        let v = verify(params).unwrap();
        assert_relative_eq!(v.mean, 10.0, max_relative = 1e-9);
        assert_relative_eq!(v.stddev, 0.0001, max_relative = 1e-6);

        let curve = sample_density(params, input, DEFAULT_POINTS).unwrap();
        assert_eq!(curve.len(), DEFAULT_POINTS);
        assert!(curve.ys().all(|y| y.is_finite() && y >= 0.0));
    }

    #[test]
    fn test_density_domain() {
        let input = RealMoments::new(2.0, 1.0).unwrap();
        let params = convert_to_log_params(2.0, 1.0).unwrap();
        let curve = sample_density(params, input, 500).unwrap();
        assert_eq!(curve.len(), 500);
        assert_eq!(curve.points[0].0, 0.001);
        assert_eq!(curve.points[499].0, 6.0);
        assert!(curve.points.windows(2).all(|w| w[1].0 > w[0].0));
        assert!(curve.max_density() > 0.0);
    }

    #[test]
    fn test_density_rejects_degenerate_requests() {
        let params = LogParams { loc: 0.0, scale: 1.0 };
        assert!(matches!(density_on(params, 0.001, 5.0, 0), Err(Error::InvalidInput(_))));
        assert!(matches!(density_on(params, 0.001, -1.0, 10), Err(Error::InvalidInput(_))));
        assert!(matches!(
            density_on(params, 0.001, f64::INFINITY, 10),
            Err(Error::ComputationFailure(_))
        ));
    }

    #[test]
    fn test_density_single_point_is_curve_end() {
        let params = LogParams { loc: 0.0, scale: 1.0 };
        let curve = density_on(params, 0.001, 5.0, 1).unwrap();
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.points[0].0, 5.0);
        assert_relative_eq!(curve.points[0].1, statistics::pdf(5.0, 0.0, 1.0), max_relative = 1e-15);
    }

    #[test]
    fn test_density_below_lower_bound_starts_inside_support() {
        let params = LogParams { loc: 0.0, scale: 1.0 };
        let curve = density_on(params, 0.001, 0.0005, 5).unwrap();
        assert_eq!(curve.len(), 5);
        assert_relative_eq!(curve.points[0].0, 0.0001, max_relative = 1e-12);
        assert_eq!(curve.points[4].0, 0.0005);
        assert!(curve.points.windows(2).all(|w| w[1].0 > w[0].0));
    }

    #[test]
    fn test_converter_accepts_tiny_moments() {
        let c = MomentConverter::default().convert(0.0001, 0.0001).unwrap();
        assert_relative_eq!(c.params.scale, 2.0_f64.ln().sqrt(), epsilon = 1e-12);
        assert_relative_eq!(c.verified.mean, 0.0001, max_relative = 1e-9);
        assert_relative_eq!(c.verified.stddev, 0.0001, max_relative = 1e-9);
        assert_eq!(c.curve.len(), DEFAULT_POINTS);
        assert_eq!(c.curve.points[DEFAULT_POINTS - 1].0, 0.0005);
        assert!(c.curve.points[0].0 > 0.0);
        assert!(c.curve.points.windows(2).all(|w| w[1].0 > w[0].0));
        assert!(c.curve.ys().all(|y| y.is_finite() && y >= 0.0));
        assert!(c.curve.max_density() > 0.0);
    }

    #[test]
    fn test_density_is_deterministic() {
        let input = RealMoments::new(3.0, 2.5).unwrap();
        let params = convert_to_log_params(3.0, 2.5).unwrap();
        let a = sample_density(params, input, 200).unwrap();
        let b = sample_density(params, input, 200).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_quantiles_ordered() {
        let params = convert_to_log_params(2.0, 1.0).unwrap();
        let q = quantiles(params).unwrap();
        assert!(q.q05 < q.median && q.median < q.q95);
        assert_relative_eq!(q.median, params.loc.exp(), max_relative = 1e-9);
    }

    #[test]
    fn test_empirical_moments_seeded() {
        let params = convert_to_log_params(2.0, 1.0).unwrap();
        let a = empirical_moments(params, 200_000, Some(7)).unwrap();
        let b = empirical_moments(params, 200_000, Some(7)).unwrap();
        assert_eq!(a, b);
        assert_relative_eq!(a.mean, 2.0, max_relative = 0.02);
        assert_relative_eq!(a.stddev, 1.0, max_relative = 0.05);
        assert!(empirical_moments(params, 1, Some(7)).is_err());
    }

    #[test]
    fn test_estimates_imply_moments() {
        let params = convert_to_log_params(2.0, 1.0).unwrap();
        let q = quantiles(params).unwrap();
        let e = convert_from_estimates(q.median, q.q95).unwrap();
        assert_relative_eq!(e.implied.mean, 2.0, max_relative = 1e-6);
        assert_relative_eq!(e.implied.stddev, 1.0, max_relative = 1e-5);
        assert!(convert_from_estimates(2.0, 1.0).is_err());
    }

    #[test]
    fn test_converter_full_response() {
        let converter = MomentConverter::new(ConverterConfig {
            samples: 10_000,
            seed: Some(42),
            ..Default::default()
        });
        let c = converter.convert(2.0, 1.0).unwrap();
        assert_eq!(c.curve.len(), DEFAULT_POINTS);
        assert_relative_eq!(c.verified.mean, c.input.mean, max_relative = 1e-9);
        assert_eq!(c.empirical.map(|e| e.samples), Some(10_000));
    }

    #[test]
    fn test_converter_rejects_invalid_input() {
        let converter = MomentConverter::default();
        for (m, s) in [(0.0, 1.0), (-2.0, 1.0), (2.0, 0.0), (2.0, -1.0)] {
            assert!(matches!(converter.convert(m, s), Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn test_converter_surfaces_overflow() {
        let converter = MomentConverter::default();
        let err = converter.convert(1e308, 1e308).unwrap_err();
        assert!(matches!(err, Error::ComputationFailure(_)));
    }
}
