use super::chart::ChartPanel;
use super::render;
use crate::core::{CalcRequest, CalcResponse, Calculator};
use anyhow::Result;
use tracing::info;

/// Output switches shared by the result-printing commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Print the raw response as JSON instead of tables.
    pub json: bool,
    /// Skip the chart under the tables.
    pub no_chart: bool,
}

/// Formats one result the way every command prints it.
pub fn format_response(res: &CalcResponse, symbol: &str, opts: OutputOptions) -> Result<String> {
    if opts.json {
        return Ok(serde_json::to_string_pretty(res)?);
    }

    let mut output = render::display(res, symbol);
    if !opts.no_chart {
        let mut panel = ChartPanel::new(symbol);
        panel.update(&res.chart());
        if let Some(chart) = panel.current() {
            output.push_str("\n\n");
            output.push_str(&chart.to_string());
        }
    }
    Ok(output)
}

pub async fn run(
    calculator: &dyn Calculator,
    req: &CalcRequest,
    symbol: &str,
    opts: OutputOptions,
) -> Result<String> {
    info!(calculator = %req.kind(), "Running calculation");
    let res = calculator.calculate(req).await?;
    format_response(&res, symbol, opts)
}
