use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use lognorm_prior::converter::{
    ConverterConfig, DEFAULT_LOWER_BOUND, DEFAULT_POINTS, DEFAULT_TAIL_STDDEVS,
};

#[derive(Parser)]
#[command(author, version)]
/// LogNormal prior calculator: real-space mean and standard deviation to `loc` and `scale`.
pub struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Compute loc and scale, verify them and sample the density.
    Convert {
        #[command(flatten)]
        moments: MomentArgs,

        #[command(flatten)]
        curve: CurveArgs,

        /// Draw this many samples to report empirical moments as well.
        #[arg(long, default_value = "0")]
        samples: usize,

        /// Seed for the empirical check. Random when omitted.
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file for results. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the density plot as an SVG document.
        #[arg(long)]
        svg: Option<PathBuf>,
    },

    /// Print the density curve as `x,y` CSV rows.
    Curve {
        #[command(flatten)]
        moments: MomentArgs,

        #[command(flatten)]
        curve: CurveArgs,
    },

    /// Compute loc and scale from a median and a 95th percentile instead.
    FromEstimates {
        /// The median (50th percentile) of the quantity.
        #[arg(long, value_parser = parse_positive)]
        median: f64,

        /// The 95th percentile of the quantity.
        #[arg(long, value_parser = parse_positive)]
        q95: f64,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file for results. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone)]
pub struct MomentArgs {
    /// Desired real-space mean (must be > 0), e.g. the expected ROI.
    #[arg(short, long, default_value = "2.0", value_parser = parse_positive)]
    pub mean: f64,

    /// Desired real-space standard deviation (must be > 0).
    #[arg(short, long, default_value = "1.0", value_parser = parse_positive)]
    pub stddev: f64,
}

#[derive(Args, Clone)]
pub struct CurveArgs {
    /// Number of density samples.
    #[arg(short = 'n', long, default_value_t = DEFAULT_POINTS)]
    pub points: usize,

    /// Width of the plotted tail, in standard deviations above the mean.
    #[arg(long, default_value_t = DEFAULT_TAIL_STDDEVS, value_parser = parse_positive)]
    pub tail: f64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl CurveArgs {
    pub fn config(&self, samples: usize, seed: Option<u64>) -> ConverterConfig {
        ConverterConfig {
            points: self.points,
            lower_bound: DEFAULT_LOWER_BOUND,
            tail_stddevs: self.tail,
            samples,
            seed,
        }
    }
}

/// Positivity floor for numeric inputs.
pub fn parse_positive(s: &str) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|e| format!("`{}` is not a number: {}", s, e))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("must be a finite number > 0, got {}", value))
    }
}
