//! LogNormal prior calculator.
//!
//! Converts the real-space mean and standard deviation of a positive quantity
//! into the log-space `(loc, scale)` of a LogNormal distribution, checks the
//! result against the analytic moments of the rebuilt distribution, and samples
//! its density for plotting.

pub mod converter;
pub mod error;
pub mod render;
pub mod statistics;

pub use converter::{
    convert_to_log_params, sample_density, verify, Conversion, ConverterConfig, DensityCurve,
    LogParams, MomentConverter, RealMoments, VerifiedMoments,
};
pub use error::{Error, Result};
