//! SVG line plot of a [`DensityCurve`].

use std::fmt::Write as FmtWrite;

use crate::converter::DensityCurve;

/// Figure size, labels and stroke of the density plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend: String,
    pub line_color: String,
    pub line_width: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            title: "Distribución LogNormal generada".into(),
            x_label: "Valor".into(),
            y_label: "Densidad de probabilidad".into(),
            legend: "LogNormal PDF".into(),
            line_color: "#1f77b4".into(),
            line_width: 1.5,
        }
    }
}

/// Plot area inside the figure, in points.
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn for_figure(config: &PlotConfig) -> Self {
        let (left, right, top, bottom) = (72.0, 24.0, 40.0, 56.0);
        Self {
            left,
            top,
            width: (config.width - left - right).max(1.0),
            height: (config.height - top - bottom).max(1.0),
        }
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Linear axis with "nice number" ticks.
#[derive(Debug, Clone)]
struct Axis {
    min: f64,
    max: f64,
    ticks: Vec<f64>,
    step: f64,
}

impl Axis {
    fn auto_linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (min, max, step) = nice_range(data_min, data_max, target_ticks);
        let mut ticks = Vec::new();
        let mut v = min;
        while v <= max + step * 0.01 {
            ticks.push(v);
            v += step;
        }
        Self { min, max, ticks, step }
    }

    fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        px_min + frac * (px_max - px_min)
    }
}

fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if !(data_max - data_min).is_finite() || (data_max - data_min).abs() < 1e-15 {
        return (data_min - 1.0, data_max + 1.0, 1.0);
    }
    let rough_step = (data_max - data_min) / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough_step);
    ((data_min / step).floor() * step, (data_max / step).ceil() * step, step)
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    // Avoid "-0"
    let value = if value.abs() < step * 0.01 { 0.0 } else { value };
    format!("{:.prec$}", value, prec = decimals)
}

fn escape_xml(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn text(out: &mut String, x: f64, y: f64, size: f64, anchor: &str, rotate: bool, content: &str) {
    write!(
        out,
        r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{size:.1}" text-anchor="{anchor}""#
    )
    .unwrap();
    if rotate {
        write!(out, r#" transform="rotate(-90,{x:.2},{y:.2})""#).unwrap();
    }
    out.push('>');
    escape_xml(out, content);
    out.push_str("</text>\n");
}

fn line(out: &mut String, x1: f64, y1: f64, x2: f64, y2: f64, color: &str, width: f64) {
    writeln!(
        out,
        r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{color}" stroke-width="{width:.2}" />"#
    )
    .unwrap();
}

fn empty_svg() -> String {
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><text x="10" y="30">No density data</text></svg>"#.into()
}

/// Render the curve as a standalone SVG document.
pub fn render_svg(curve: &DensityCurve, config: &PlotConfig) -> String {
    if curve.is_empty() {
        return empty_svg();
    }

    let x_min = curve.points.first().map(|p| p.0).unwrap_or(0.0);
    let x_max = curve.points.last().map(|p| p.0).unwrap_or(1.0);
    let x_axis = Axis::auto_linear(x_min.min(0.0), x_max, 6);
    let y_axis = Axis::auto_linear(0.0, curve.max_density(), 5);
    let area = PlotArea::for_figure(config);

    let mut out = String::with_capacity(16 * 1024 + curve.len() * 16);
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = config.width,
        h = config.height,
    )
    .unwrap();
    writeln!(out, r#"<rect width="{}" height="{}" fill="white" />"#, config.width, config.height)
        .unwrap();

    // Frame
    let black = "#000000";
    line(&mut out, area.left, area.top, area.right(), area.top, black, 0.8);
    line(&mut out, area.left, area.bottom(), area.right(), area.bottom(), black, 0.8);
    line(&mut out, area.left, area.top, area.left, area.bottom(), black, 0.8);
    line(&mut out, area.right(), area.top, area.right(), area.bottom(), black, 0.8);

    for &v in &x_axis.ticks {
        let px = x_axis.data_to_pixel(v, area.left, area.right());
        line(&mut out, px, area.bottom(), px, area.bottom() + 5.0, black, 0.6);
        text(&mut out, px, area.bottom() + 18.0, 10.0, "middle", false, &format_tick(v, x_axis.step));
    }
    for &v in &y_axis.ticks {
        let py = y_axis.data_to_pixel(v, area.bottom(), area.top);
        line(&mut out, area.left - 5.0, py, area.left, py, black, 0.6);
        text(&mut out, area.left - 8.0, py + 3.5, 10.0, "end", false, &format_tick(v, y_axis.step));
    }

    text(&mut out, area.left + area.width / 2.0, 24.0, 14.0, "middle", false, &config.title);
    text(
        &mut out,
        area.left + area.width / 2.0,
        config.height - 14.0,
        12.0,
        "middle",
        false,
        &config.x_label,
    );
    text(&mut out, 18.0, area.top + area.height / 2.0, 12.0, "middle", true, &config.y_label);

    // Curve
    out.push_str(r#"<polyline points=""#);
    for (i, &(x, y)) in curve.points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let px = x_axis.data_to_pixel(x, area.left, area.right());
        let py = y_axis.data_to_pixel(y, area.bottom(), area.top);
        write!(out, "{px:.2},{py:.2}").unwrap();
    }
    writeln!(
        out,
        r#"" fill="none" stroke="{}" stroke-width="{:.2}" />"#,
        config.line_color, config.line_width
    )
    .unwrap();

    // Legend
    let lx = area.right() - 130.0;
    let ly = area.top + 16.0;
    line(&mut out, lx, ly, lx + 24.0, ly, &config.line_color, config.line_width);
    text(&mut out, lx + 30.0, ly + 3.5, 10.0, "start", false, &config.legend);

    out.push_str("</svg>\n");
    out
}
