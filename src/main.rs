mod cli;

use std::fmt::Write as FmtWrite;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, CurveArgs, MomentArgs, OutputFormat};
use lognorm_prior::converter::{self, Conversion, EstimateConversion, MomentConverter};
use lognorm_prior::render::{render_svg, PlotConfig};

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Commands::Convert { moments, curve, samples, seed, format, output, svg } => {
                let converter = MomentConverter::new(curve.config(samples, seed));
                let conversion = converter.convert(moments.mean, moments.stddev)?;
                tracing::info!(
                    loc = conversion.params.loc,
                    scale = conversion.params.scale,
                    "conversion complete"
                );

                let body = match format {
                    OutputFormat::Text => format_conversion(&conversion)?,
                    OutputFormat::Json => serde_json::to_string_pretty(&conversion)? + "\n",
                };
                emit(&body, output.as_deref())?;

                if let Some(path) = svg {
                    let doc = render_svg(&conversion.curve, &PlotConfig::default());
                    std::fs::write(&path, doc)
                        .with_context(|| format!("writing plot to {}", path.display()))?;
                    tracing::info!(path = %path.display(), "plot written");
                }
            }
            Commands::Curve { moments: MomentArgs { mean, stddev }, curve } => {
                print!("{}", curve_csv(mean, stddev, &curve)?);
            }
            Commands::FromEstimates { median, q95, format, output } => {
                let estimate = converter::convert_from_estimates(median, q95)?;
                let body = match format {
                    OutputFormat::Text => format_estimates(&estimate)?,
                    OutputFormat::Json => serde_json::to_string_pretty(&estimate)? + "\n",
                };
                emit(&body, output.as_deref())?;
            }
        }

        Ok(())
    }
}

fn format_conversion(c: &Conversion) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "loc (μ_log): {:.4}", c.params.loc)?;
    writeln!(out, "scale (σ_log): {:.4}", c.params.scale)?;
    writeln!(
        out,
        "Verificación: Media real: {:.4}, Desviación real: {:.4}",
        c.verified.mean, c.verified.stddev
    )?;
    writeln!(
        out,
        "Cuantiles: 5%: {:.4}, mediana: {:.4}, 95%: {:.4}",
        c.quantiles.q05, c.quantiles.median, c.quantiles.q95
    )?;
    if let Some(e) = c.empirical {
        writeln!(
            out,
            "Muestreo ({} muestras): Media: {:.4}, Desviación: {:.4}",
            e.samples, e.mean, e.stddev
        )?;
    }
    Ok(out)
}

fn format_estimates(e: &EstimateConversion) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "loc (μ_log): {:.4}", e.params.loc)?;
    writeln!(out, "scale (σ_log): {:.4}", e.params.scale)?;
    writeln!(
        out,
        "Momentos implícitos: Media real: {:.4}, Desviación real: {:.4}",
        e.implied.mean, e.implied.stddev
    )?;
    Ok(out)
}

fn curve_csv(mean: f64, stddev: f64, args: &CurveArgs) -> Result<String> {
    let conversion = MomentConverter::new(args.config(0, None)).convert(mean, stddev)?;
    let mut out = String::from("x,y\n");
    for (x, y) in conversion.curve.points {
        writeln!(out, "{},{}", x, y)?;
    }
    Ok(out)
}

fn emit(body: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, body)
            .with_context(|| format!("writing results to {}", path.display())),
        None => {
            print!("{}", body);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.run() {
        eprintln!("Ocurrió un error: {:#}", e);
        std::process::exit(1);
    }
}
