//! Terminal rendering of a calculator's chart.
//!
//! `ChartPanel` owns the one chart on screen. Each update renders the new
//! chart completely before swapping it in, so the panel never holds a
//! half-built chart and the old one is handed back to the caller.

use crate::cli::ui::format_compact;
use crate::core::ChartSpec;
use console::style;

const BAR_WIDTH: usize = 40;
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub title: String,
    pub lines: Vec<String>,
}

impl std::fmt::Display for RenderedChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", style(&self.title).bold())?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ChartPanel {
    current: Option<RenderedChart>,
    symbol: String,
}

impl ChartPanel {
    pub fn new(symbol: &str) -> Self {
        ChartPanel {
            current: None,
            symbol: symbol.to_string(),
        }
    }

    /// Replaces the displayed chart, returning the one it supersedes.
    pub fn update(&mut self, spec: &ChartSpec) -> Option<RenderedChart> {
        let rendered = render(spec, &self.symbol);
        self.current.replace(rendered)
    }

    pub fn current(&self) -> Option<&RenderedChart> {
        self.current.as_ref()
    }
}

pub fn render(spec: &ChartSpec, symbol: &str) -> RenderedChart {
    let lines = match spec {
        ChartSpec::Breakdown { slices, .. } => {
            let total: f64 = slices.iter().map(|s| s.value.max(0.0)).sum();
            let label_width = slices.iter().map(|s| s.label.chars().count()).max().unwrap_or(0);
            slices
                .iter()
                .enumerate()
                .map(|(i, slice)| {
                    let share = if total > 0.0 {
                        slice.value.max(0.0) / total
                    } else {
                        0.0
                    };
                    let filled = (share * BAR_WIDTH as f64).round() as usize;
                    let bar = "█".repeat(filled);
                    let bar = if i % 2 == 0 {
                        style(bar).cyan()
                    } else {
                        style(bar).green()
                    };
                    format!(
                        "{:<label_width$}  {}{} {:>5.1}%  {}",
                        slice.label,
                        bar,
                        " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
                        share * 100.0,
                        format_compact(slice.value, symbol),
                    )
                })
                .collect()
        }
        ChartSpec::Series { points, .. } => {
            if points.is_empty() {
                vec![style("(no data)").dim().to_string()]
            } else {
                let min = points.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
                let max = points.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
                let span = max - min;
                let line: String = points
                    .iter()
                    .map(|(_, v)| {
                        let level = if span > 0.0 {
                            ((v - min) / span * (SPARKS.len() - 1) as f64).round() as usize
                        } else {
                            SPARKS.len() - 1
                        };
                        SPARKS[level.min(SPARKS.len() - 1)]
                    })
                    .collect();
                let (first_label, _) = &points[0];
                let (last_label, last_value) = &points[points.len() - 1];
                vec![
                    style(line).cyan().to_string(),
                    format!(
                        "{first_label} .. {last_label}  (low {}, high {}, last {})",
                        format_compact(min, symbol),
                        format_compact(max, symbol),
                        format_compact(*last_value, symbol),
                    ),
                ]
            }
        }
    };

    RenderedChart {
        title: spec.title().to_string(),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_replaces_and_returns_previous() {
        let mut panel = ChartPanel::new("₹");
        assert!(panel.current().is_none());

        let first = ChartSpec::breakdown("GST", &[("Base", 1000.0), ("Tax", 180.0)]);
        assert!(panel.update(&first).is_none());
        assert_eq!(panel.current().map(|c| c.title.as_str()), Some("GST"));

        let second = ChartSpec::series("Growth", vec![("Y1".to_string(), 1.0), ("Y2".to_string(), 2.0)]);
        let previous = panel.update(&second).unwrap();
        assert_eq!(previous.title, "GST");
        assert_eq!(panel.current().map(|c| c.title.as_str()), Some("Growth"));
    }

    #[test]
    fn test_breakdown_shows_shares() {
        let chart = render(
            &ChartSpec::breakdown("Split", &[("A", 75.0), ("B", 25.0)]),
            "₹",
        );
        assert_eq!(chart.lines.len(), 2);
        assert!(chart.lines[0].contains("75.0%"));
        assert!(chart.lines[1].contains("25.0%"));
    }

    #[test]
    fn test_series_spans_low_to_high() {
        let points = (1..=8).map(|i| (format!("Y{i}"), i as f64));
        let chart = render(&ChartSpec::series("Up", points), "₹");
        let spark = console::strip_ansi_codes(&chart.lines[0]).to_string();
        assert!(spark.starts_with('▁'));
        assert!(spark.ends_with('█'));
        assert!(chart.lines[1].starts_with("Y1 .. Y8"));
    }
}
