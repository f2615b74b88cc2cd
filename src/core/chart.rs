//! Renderer-agnostic description of the chart each calculator shows.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartSpec {
    /// Parts of a whole, e.g. invested vs. returns.
    Breakdown { title: String, slices: Vec<Slice> },
    /// A labelled series over time.
    Series {
        title: String,
        points: Vec<(String, f64)>,
    },
}

impl ChartSpec {
    pub fn breakdown(title: &str, slices: &[(&str, f64)]) -> Self {
        ChartSpec::Breakdown {
            title: title.to_string(),
            slices: slices
                .iter()
                .map(|(label, value)| Slice {
                    label: label.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    pub fn series<I>(title: &str, points: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        ChartSpec::Series {
            title: title.to_string(),
            points: points.into_iter().collect(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Breakdown { title, .. } | ChartSpec::Series { title, .. } => title,
        }
    }
}
