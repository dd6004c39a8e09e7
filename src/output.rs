//! Presentation of the dashboard state.
//!
//! Two pie charts (confirmed and estimated cases per epidemiological week)
//! and a summary panel, rendered either as terminal text or as JSON.

use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;

use crate::analyzers::types::Snapshot;
use crate::state::DashboardState;

pub const CONFIRMED_TITLE: &str = "Casos confirmados";
pub const ESTIMATED_TITLE: &str = "Casos estimados";
pub const LEGEND: &str = "Semana epidemiológica";

/// Fill alpha shared by every chart color.
pub const ALPHA: f64 = 0.6;

/// A chart fill color; alpha is always [`ALPHA`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, ALPHA)
    }
}

impl Serialize for Rgba {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How slice colors are picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorScheme {
    /// Fresh random color per slice on every render. Cosmetic only.
    #[default]
    Random,
    /// Color derived from the slice index, identical across renders.
    Stable,
}

impl ColorScheme {
    pub fn color(self, index: usize) -> Rgba {
        match self {
            Self::Random => Rgba {
                r: rand::random(),
                g: rand::random(),
                b: rand::random(),
            },
            Self::Stable => {
                // Knuth multiplicative hash spreads neighbouring indices apart
                let h = (index as u32).wrapping_add(1).wrapping_mul(2_654_435_761);
                Rgba {
                    r: (h >> 24) as u8,
                    g: (h >> 16) as u8,
                    b: (h >> 8) as u8,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: Option<f64>,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: &'static str,
    pub legend: &'static str,
    pub slices: Vec<Slice>,
}

impl PieChart {
    /// Pairs `labels` with `values` position by position.
    pub fn new(
        title: &'static str,
        labels: &[String],
        values: &[Option<f64>],
        scheme: ColorScheme,
    ) -> Self {
        let slices = labels
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (label, value))| Slice {
                label: label.clone(),
                value: *value,
                color: scheme.color(i),
            })
            .collect();

        Self {
            title,
            legend: LEGEND,
            slices,
        }
    }

    pub fn total(&self) -> f64 {
        self.slices.iter().filter_map(|s| s.value).sum()
    }

    /// Fraction of the pie taken by slice `index`; 0.0 when the pie is empty.
    pub fn share(&self, index: usize) -> f64 {
        let total = self.total();
        match self.slices.get(index).and_then(|s| s.value) {
            Some(v) if total > 0.0 => v / total,
            _ => 0.0,
        }
    }
}

/// Both charts for `state`; empty when no series has been delivered.
pub fn charts(state: &DashboardState, scheme: ColorScheme) -> [PieChart; 2] {
    match state.series() {
        Some(series) => [
            PieChart::new(CONFIRMED_TITLE, &series.labels, &series.confirmed, scheme),
            PieChart::new(ESTIMATED_TITLE, &series.labels, &series.estimated, scheme),
        ],
        None => [
            PieChart::new(CONFIRMED_TITLE, &[], &[], scheme),
            PieChart::new(ESTIMATED_TITLE, &[], &[], scheme),
        ],
    }
}

/// Renders a metric; absent values render as an empty string.
pub fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Every summary field with its fixed label, in display order.
pub fn summary_rows(latest: &Snapshot) -> Vec<(&'static str, Option<f64>)> {
    vec![
        ("CASOS", latest.casos),
        ("CASOS ESTIMADOS", latest.casos_est),
        ("CASOS ESTIMADO MÁX", latest.casos_est_max),
        ("CASOS ESTIMADO MIN", latest.casos_est_min),
        ("CASOS APROVADOS", latest.casprov),
        ("NÍVEL DE TRANSMISSÃO", latest.nivel),
        ("NÍVEL DE INCIDÊNCIA", latest.nivel_inc),
        ("RECEPTIVIDADE", latest.receptivo),
        ("TRANSMISSÃO", latest.transmissao),
        ("NOTIFICAÇÕES NO ANO", latest.notif_accum_year),
        ("TEMP. MÁX", latest.tempmax),
        ("TEMP. MED", latest.tempmed),
        ("TEMP. MIN", latest.tempmin),
        ("UMIDADE MÁX", latest.umidmax),
        ("UMIDADE MED", latest.umidmed),
        ("UMIDADE MIN", latest.umidmin),
    ]
}

fn swatch(color: Rgba, ansi: bool) -> String {
    if ansi {
        format!("\x1b[38;2;{};{};{}m██\x1b[0m", color.r, color.g, color.b)
    } else {
        "██".to_string()
    }
}

/// Renders the dashboard as terminal text. `ansi` enables 24-bit color
/// swatches.
pub fn render_text(state: &DashboardState, scheme: ColorScheme, ansi: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", state.title());

    for chart in charts(state, scheme) {
        let _ = writeln!(out, "{}", chart.title);
        let _ = writeln!(out, "  {}", chart.legend);
        for (i, slice) in chart.slices.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {} {:<9} {:>8} {:>6.1}%",
                swatch(slice.color, ansi),
                slice.label,
                format_value(slice.value),
                chart.share(i) * 100.0
            );
        }
        out.push('\n');
    }

    let latest = state
        .series()
        .map(|s| s.latest.clone())
        .unwrap_or_default();
    for (label, value) in summary_rows(&latest) {
        let _ = writeln!(out, "{label}: {}", format_value(value));
    }

    out
}

/// Renders the dashboard as a JSON document. The summary is an array of
/// `{label, value}` rows in display order.
pub fn render_json(state: &DashboardState, scheme: ColorScheme) -> serde_json::Value {
    let latest = state
        .series()
        .map(|s| s.latest.clone())
        .unwrap_or_default();
    let summary: Vec<serde_json::Value> = summary_rows(&latest)
        .into_iter()
        .map(|(label, value)| serde_json::json!({ "label": label, "value": value }))
        .collect();

    serde_json::json!({
        "title": state.title(),
        "city": state.city_name(),
        "city_code": state.city_code(),
        "charts": charts(state, scheme),
        "summary": summary,
    })
}

/// Prints the dashboard to stdout as text.
pub fn print_text(state: &DashboardState, scheme: ColorScheme, ansi: bool) {
    print!("{}", render_text(state, scheme, ansi));
}

/// Prints the dashboard to stdout as pretty-printed JSON.
pub fn print_json(state: &DashboardState, scheme: ColorScheme) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&render_json(state, scheme))?
    );
    Ok(())
}
