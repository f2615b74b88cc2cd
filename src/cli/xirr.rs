use super::calc::OutputOptions;
use super::chart::ChartPanel;
use super::ui;
use crate::calc::xirr::{CashFlow, XirrRequest, XirrResponse};
use crate::core::{CalcRequest, CalcResponse, Calculator};
use anyhow::{Result, anyhow};
use comfy_table::{Attribute, Cell};
use tracing::info;

pub async fn run(
    calculator: &dyn Calculator,
    cash_flows: Vec<CashFlow>,
    symbol: &str,
    opts: OutputOptions,
) -> Result<String> {
    info!(flows = cash_flows.len(), "Analyzing cash flows...");

    let req = CalcRequest::XirrAnalysis(XirrRequest { cash_flows });
    let res = calculator.calculate(&req).await?;
    if opts.json {
        return Ok(serde_json::to_string_pretty(&res)?);
    }
    let CalcResponse::XirrAnalysis(analysis) = &res else {
        return Err(anyhow!("Unexpected response for {}", req.kind()));
    };

    let mut output = display_analysis(analysis, symbol);
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

pub fn display_analysis(analysis: &XirrResponse, symbol: &str) -> String {
    let mut flows = ui::new_styled_table();
    flows.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Cumulative"),
    ]);
    for flow in &analysis.cumulative_flows {
        flows.add_row(vec![
            Cell::new(&flow.label),
            ui::signed_cell(flow.amount, ui::format_amount(flow.amount, symbol)),
        ]);
    }

    let mut totals = ui::new_styled_table();
    totals.set_header(vec![
        ui::header_cell("Invested"),
        ui::header_cell("Withdrawn"),
        ui::header_cell("Gain/Loss"),
        ui::header_cell("XIRR"),
        ui::header_cell("Flows"),
    ]);
    totals.add_row(vec![
        ui::value_cell(ui::format_amount(analysis.total_invested, symbol)),
        ui::value_cell(ui::format_amount(analysis.total_withdrawn, symbol)),
        ui::signed_cell(
            analysis.net_gain_loss,
            ui::format_amount(analysis.net_gain_loss, symbol),
        )
        .add_attribute(Attribute::Bold),
        ui::format_optional_cell(analysis.xirr_percentage, ui::format_percentage),
        ui::value_cell(analysis.cash_flow_count.to_string()),
    ]);

    let mut output = format!(
        "{}\n\n{}\n\n{}",
        ui::style_text("XIRR Analysis", ui::StyleType::Title),
        flows,
        totals
    );
    if analysis.xirr_percentage.is_none() {
        output.push('\n');
        output.push_str(&ui::style_text(
            "XIRR did not converge for these flows; totals are still shown.",
            ui::StyleType::Subtle,
        ));
    }
    output
}
