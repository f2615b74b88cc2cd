//! XIRR: annualized internal rate of return for irregularly dated cash flows.
//!
//! The solver runs in two explicit phases. Newton-Raphson starts from a guess
//! and is abandoned (not retried) as soon as its derivative vanishes or the
//! iterate leaves the domain `r > -1`. Bisection then brackets a sign change of
//! NPV, growing the upper bound until one is found.
//!
//! Day count: `(date - earliest) / 365`, continuous exponent.

use crate::core::chart::ChartSpec;
use crate::core::error::{CalcError, ensure_finite};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: f64,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XirrSolverConfig {
    pub guess: f64,
    /// Converged once `|NPV(r)|` drops below this, in cash-flow units.
    pub npv_tolerance: f64,
    /// Converged once successive rates differ by less than this.
    pub rate_tolerance: f64,
    /// Iteration budget, applied to each phase separately.
    pub max_iterations: u32,
    /// Newton gives up once an iterate is at or below this.
    pub domain_floor: f64,
    pub derivative_floor: f64,
    /// Lower bracket end used when NPV overflows at `domain_floor`, which
    /// happens for long spans.
    pub bracket_lower: f64,
    pub bracket_upper: f64,
    pub bracket_upper_limit: f64,
}

impl Default for XirrSolverConfig {
    fn default() -> Self {
        Self {
            guess: 0.1,
            npv_tolerance: 1e-6,
            rate_tolerance: 1e-7,
            max_iterations: 100,
            domain_floor: -0.999_999,
            derivative_floor: 1e-12,
            bracket_lower: -0.999,
            bracket_upper: 10.0,
            bracket_upper_limit: 1e6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    NewtonRaphson,
    Bisection,
}

/// Why the Newton phase handed over to bisection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NewtonAbandoned {
    FlatDerivative { rate: f64 },
    LeftDomain { rate: f64 },
    NotFinite,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NewtonOutcome {
    Converged { rate: f64, iterations: u32 },
    Abandoned(NewtonAbandoned),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub rate: f64,
    pub method: SolveMethod,
    pub iterations: u32,
    /// Set when bisection had to take over.
    pub newton_abandoned: Option<NewtonAbandoned>,
}

#[derive(Debug, Clone, Default)]
pub struct XirrSolver {
    config: XirrSolverConfig,
}

impl XirrSolver {
    pub fn new(config: XirrSolverConfig) -> Self {
        Self { config }
    }

    pub fn solve(&self, flows: &[CashFlow]) -> Result<f64, CalcError> {
        self.solve_with_report(flows).map(|report| report.rate)
    }

    pub fn solve_with_report(&self, flows: &[CashFlow]) -> Result<SolveReport, CalcError> {
        validate(flows)?;
        let timed = to_year_fractions(flows);

        match self.newton(&timed) {
            NewtonOutcome::Converged { rate, iterations } => {
                debug!(rate, iterations, "XIRR converged with Newton-Raphson");
                Ok(SolveReport {
                    rate,
                    method: SolveMethod::NewtonRaphson,
                    iterations,
                    newton_abandoned: None,
                })
            }
            NewtonOutcome::Abandoned(reason) => {
                debug!(?reason, "Newton-Raphson abandoned, bisecting");
                let (rate, iterations) = self.bisect(&timed)?;
                Ok(SolveReport {
                    rate,
                    method: SolveMethod::Bisection,
                    iterations,
                    newton_abandoned: Some(reason),
                })
            }
        }
    }

    /// First phase. Never errors: every way out that is not convergence is a
    /// typed reason for the caller to switch strategy.
    pub fn newton(&self, timed: &[(f64, f64)]) -> NewtonOutcome {
        let cfg = &self.config;
        let mut rate = cfg.guess;

        for i in 1..=cfg.max_iterations {
            let (value, slope) = npv_and_derivative(timed, rate);
            if !value.is_finite() || !slope.is_finite() {
                return NewtonOutcome::Abandoned(NewtonAbandoned::NotFinite);
            }
            if value.abs() < cfg.npv_tolerance {
                return NewtonOutcome::Converged {
                    rate,
                    iterations: i,
                };
            }
            if slope.abs() < cfg.derivative_floor {
                return NewtonOutcome::Abandoned(NewtonAbandoned::FlatDerivative { rate });
            }

            let next = rate - value / slope;
            if !next.is_finite() {
                return NewtonOutcome::Abandoned(NewtonAbandoned::NotFinite);
            }
            if next <= cfg.domain_floor {
                return NewtonOutcome::Abandoned(NewtonAbandoned::LeftDomain { rate: next });
            }
            if (next - rate).abs() < cfg.rate_tolerance {
                return NewtonOutcome::Converged {
                    rate: next,
                    iterations: i,
                };
            }
            rate = next;
        }

        NewtonOutcome::Abandoned(NewtonAbandoned::Exhausted)
    }

    /// Second phase. Fails with `NoConvergence` when no sign change exists
    /// below the upper-bound limit, or the budget runs out.
    pub fn bisect(&self, timed: &[(f64, f64)]) -> Result<(f64, u32), CalcError> {
        let cfg = &self.config;
        let (mut low, npv_low) = match npv_at(timed, cfg.domain_floor) {
            value if value.is_finite() => (cfg.domain_floor, value),
            _ => (cfg.bracket_lower, npv_at(timed, cfg.bracket_lower)),
        };
        let mut high = cfg.bracket_upper;
        let mut npv_high = npv_at(timed, high);

        while npv_low.signum() == npv_high.signum() || !npv_high.is_finite() {
            high *= 2.0;
            if high > cfg.bracket_upper_limit {
                warn!(limit = cfg.bracket_upper_limit, "No sign change found for XIRR bracket");
                return Err(CalcError::NoConvergence { iterations: 0 });
            }
            npv_high = npv_at(timed, high);
        }
        if !npv_low.is_finite() {
            return Err(CalcError::NoConvergence { iterations: 0 });
        }
        debug!(low, high, "XIRR bracket found");

        let mut npv_low = npv_low;
        for i in 1..=cfg.max_iterations {
            let mid = (low + high) / 2.0;
            let npv_mid = npv_at(timed, mid);

            if npv_mid.abs() < cfg.npv_tolerance || (high - low) / 2.0 < cfg.rate_tolerance {
                return Ok((mid, i));
            }
            if npv_mid.signum() == npv_low.signum() {
                low = mid;
                npv_low = npv_mid;
            } else {
                high = mid;
            }
        }

        Err(CalcError::NoConvergence {
            iterations: cfg.max_iterations,
        })
    }
}

/// Solves with the default configuration.
pub fn xirr(flows: &[CashFlow]) -> Result<f64, CalcError> {
    XirrSolver::default().solve(flows)
}

/// NPV of dated flows at `rate`, discounted to the earliest date.
pub fn npv(rate: f64, flows: &[CashFlow]) -> f64 {
    npv_at(&to_year_fractions(flows), rate)
}

pub fn validate(flows: &[CashFlow]) -> Result<(), CalcError> {
    if flows.len() < 2 {
        return Err(CalcError::validation(
            "At least 2 cash flows are required to calculate XIRR",
        ));
    }
    for flow in flows {
        ensure_finite("amount", flow.amount)?;
    }
    let has_positive = flows.iter().any(|cf| cf.amount > 0.0);
    let has_negative = flows.iter().any(|cf| cf.amount < 0.0);
    if !has_positive || !has_negative {
        return Err(CalcError::validation(
            "Cash flows need at least one investment (negative) and one withdrawal (positive)",
        ));
    }
    let first = flows.iter().map(|cf| cf.date).min();
    let last = flows.iter().map(|cf| cf.date).max();
    if first == last {
        return Err(CalcError::validation(
            "Cash flows must span at least one day",
        ));
    }
    Ok(())
}

fn to_year_fractions(flows: &[CashFlow]) -> Vec<(f64, f64)> {
    let Some(base) = flows.iter().map(|cf| cf.date).min() else {
        return Vec::new();
    };
    flows
        .iter()
        .map(|cf| {
            let days = (cf.date - base).num_days() as f64;
            (days / DAYS_PER_YEAR, cf.amount)
        })
        .collect()
}

fn npv_at(timed: &[(f64, f64)], rate: f64) -> f64 {
    let base = 1.0 + rate;
    timed.iter().map(|(t, amount)| amount / base.powf(*t)).sum()
}

fn npv_and_derivative(timed: &[(f64, f64)], rate: f64) -> (f64, f64) {
    let base = 1.0 + rate;
    timed.iter().fold((0.0, 0.0), |(value, slope), (t, amount)| {
        let discount = base.powf(*t);
        (
            value + amount / discount,
            slope - t * amount / (discount * base),
        )
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XirrRequest {
    #[serde(rename = "cashFlows", alias = "cash_flows")]
    pub cash_flows: Vec<CashFlow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeFlow {
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XirrResponse {
    pub total_invested: f64,
    pub total_withdrawn: f64,
    pub net_gain_loss: f64,
    /// `None` when the solver could not find a rate.
    pub xirr_percentage: Option<f64>,
    pub cumulative_flows: Vec<CumulativeFlow>,
    pub cash_flow_count: usize,
}

impl XirrResponse {
    pub fn chart(&self) -> ChartSpec {
        ChartSpec::series(
            "Cumulative cash flow",
            self.cumulative_flows
                .iter()
                .map(|flow| (flow.label.clone(), flow.amount)),
        )
    }
}

/// Totals, running balance and XIRR for a set of dated flows.
///
/// Zero amounts are dropped first. Non-convergence is not an error here: the
/// rate is reported as `None` so the totals remain usable.
pub fn analyze(req: &XirrRequest) -> Result<XirrResponse, CalcError> {
    let mut flows: Vec<CashFlow> = req
        .cash_flows
        .iter()
        .copied()
        .filter(|cf| cf.amount != 0.0)
        .collect();
    flows.sort_by_key(|cf| cf.date);
    validate(&flows)?;

    let total_invested: f64 = flows
        .iter()
        .filter(|cf| cf.amount < 0.0)
        .map(|cf| -cf.amount)
        .sum();
    let total_withdrawn: f64 = flows
        .iter()
        .filter(|cf| cf.amount > 0.0)
        .map(|cf| cf.amount)
        .sum();

    let xirr_percentage = match xirr(&flows) {
        Ok(rate) => Some(rate * 100.0),
        Err(CalcError::NoConvergence { iterations }) => {
            warn!(iterations, "XIRR did not converge, reporting totals only");
            None
        }
        Err(e) => return Err(e),
    };

    let mut running = 0.0;
    let cumulative_flows = flows
        .iter()
        .map(|cf| {
            running += cf.amount;
            CumulativeFlow {
                label: cf.date.format("%Y-%m-%d").to_string(),
                amount: running,
            }
        })
        .collect();

    Ok(XirrResponse {
        total_invested,
        total_withdrawn,
        net_gain_loss: total_withdrawn - total_invested,
        xirr_percentage,
        cumulative_flows,
        cash_flow_count: flows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(offset: i64) -> NaiveDate {
        date(2024, 1, 1) + chrono::Duration::days(offset)
    }

    #[test]
    fn recovers_known_rate_over_one_year() {
        for r in [0.05, 0.145, 0.8, -0.3] {
            let flows = [
                CashFlow::new(day(0), -1000.0),
                CashFlow::new(day(365), 1000.0 * (1.0 + r)),
            ];
            let solved = xirr(&flows).unwrap();
            assert!(
                ((solved - r) / r).abs() < 1e-4,
                "expected {r}, got {solved}"
            );
        }
    }

    #[test]
    fn doubling_in_a_calendar_year_is_one_hundred_percent() {
        let flows = [
            CashFlow::new(date(2023, 1, 1), -100_000.0),
            CashFlow::new(date(2024, 1, 1), 200_000.0),
        ];
        let rate = xirr(&flows).unwrap();
        assert!((rate - 1.0).abs() < 1e-6, "rate was {rate}");
    }

    #[test]
    fn npv_at_solution_is_zero() {
        let flows = [
            CashFlow::new(day(0), -10_000.0),
            CashFlow::new(day(30), -5_000.0),
            CashFlow::new(day(60), 16_000.0),
        ];
        let rate = xirr(&flows).unwrap();
        assert!(rate.is_finite());
        assert!(npv(rate, &flows).abs() < 1e-4);
    }

    #[test]
    fn one_sided_flows_are_rejected() {
        let inflows = [
            CashFlow::new(day(0), 100.0),
            CashFlow::new(day(10), 200.0),
        ];
        let outflows = [
            CashFlow::new(day(0), -100.0),
            CashFlow::new(day(10), -200.0),
        ];
        assert!(matches!(xirr(&inflows), Err(CalcError::Validation(_))));
        assert!(matches!(xirr(&outflows), Err(CalcError::Validation(_))));
    }

    #[test]
    fn fewer_than_two_flows_are_rejected() {
        assert!(matches!(
            xirr(&[CashFlow::new(day(0), -100.0)]),
            Err(CalcError::Validation(_))
        ));
        assert!(matches!(xirr(&[]), Err(CalcError::Validation(_))));
    }

    #[test]
    fn same_day_flows_are_rejected() {
        let flows = [
            CashFlow::new(day(5), -100.0),
            CashFlow::new(day(5), 110.0),
        ];
        let err = xirr(&flows).unwrap_err();
        assert_eq!(
            err,
            CalcError::Validation("Cash flows must span at least one day".into())
        );
    }

    #[test]
    fn solving_is_deterministic() {
        let flows = [
            CashFlow::new(date(2021, 3, 15), -25_000.0),
            CashFlow::new(date(2021, 9, 1), -10_000.0),
            CashFlow::new(date(2022, 2, 10), 4_000.0),
            CashFlow::new(date(2023, 7, 30), 41_000.0),
        ];
        let first = xirr(&flows).unwrap();
        let second = xirr(&flows).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn unordered_input_gives_same_rate() {
        let sorted = [
            CashFlow::new(day(0), -1000.0),
            CashFlow::new(day(200), -500.0),
            CashFlow::new(day(500), 1800.0),
        ];
        let shuffled = [sorted[2], sorted[0], sorted[1]];
        let a = xirr(&sorted).unwrap();
        let b = xirr(&shuffled).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn flat_derivative_hands_over_to_bisection() {
        let solver = XirrSolver::new(XirrSolverConfig {
            derivative_floor: f64::INFINITY,
            ..Default::default()
        });
        let flows = [
            CashFlow::new(day(0), -1000.0),
            CashFlow::new(day(365), 1200.0),
        ];
        let report = solver.solve_with_report(&flows).unwrap();
        assert_eq!(report.method, SolveMethod::Bisection);
        assert!(matches!(
            report.newton_abandoned,
            Some(NewtonAbandoned::FlatDerivative { .. })
        ));
        assert!((report.rate - 0.2).abs() < 1e-6, "rate was {}", report.rate);
    }

    #[test]
    fn bisection_reaches_down_to_the_domain_floor() {
        // A 99.95% loss: the root sits below -0.999.
        let flows = [
            CashFlow::new(day(0), -1000.0),
            CashFlow::new(day(365), 0.5),
        ];
        let rate = xirr(&flows).unwrap();
        assert!((rate + 0.9995).abs() < 1e-6, "rate was {rate}");
    }

    #[test]
    fn long_spans_bracket_from_the_fallback_lower_bound() {
        let flows = [
            CashFlow::new(day(0), -1000.0),
            CashFlow::new(day(365 * 60), 0.001),
        ];
        let timed = to_year_fractions(&flows);
        assert!(!npv_at(&timed, XirrSolverConfig::default().domain_floor).is_finite());
        let (rate, _) = XirrSolver::default().bisect(&timed).unwrap();
        assert!(rate > -0.999 && rate < 0.0, "rate was {rate}");
    }

    #[test]
    fn newton_leaving_domain_falls_back() {
        // A 90% loss: the first Newton step from 10% overshoots below -100%.
        let flows = [
            CashFlow::new(day(0), -1000.0),
            CashFlow::new(day(365), 100.0),
        ];
        let report = XirrSolver::default().solve_with_report(&flows).unwrap();
        assert_eq!(report.method, SolveMethod::Bisection);
        assert!(matches!(
            report.newton_abandoned,
            Some(NewtonAbandoned::LeftDomain { .. })
        ));
        assert!((report.rate + 0.9).abs() < 1e-6, "rate was {}", report.rate);
    }

    #[test]
    fn bisection_widens_bracket_for_extreme_returns() {
        let solver = XirrSolver::new(XirrSolverConfig {
            max_iterations: 0,
            ..Default::default()
        });
        // 50x in one year: above the initial bracket ceiling of 1000%.
        let flows = [
            CashFlow::new(day(0), -100.0),
            CashFlow::new(day(365), 5000.0),
        ];
        let timed = to_year_fractions(&flows);
        assert_eq!(
            solver.newton(&timed),
            NewtonOutcome::Abandoned(NewtonAbandoned::Exhausted)
        );
        let bisecting = XirrSolver::default();
        let (rate, _) = bisecting.bisect(&timed).unwrap();
        assert!((rate - 49.0).abs() < 1e-4, "rate was {rate}");
    }

    #[test]
    fn exhausted_budget_is_no_convergence() {
        let solver = XirrSolver::new(XirrSolverConfig {
            max_iterations: 2,
            rate_tolerance: 0.0,
            npv_tolerance: 0.0,
            ..Default::default()
        });
        let flows = [
            CashFlow::new(day(0), -1000.0),
            CashFlow::new(day(400), 1234.0),
        ];
        assert_eq!(
            solver.solve(&flows),
            Err(CalcError::NoConvergence { iterations: 2 })
        );
    }

    #[test]
    fn analysis_reports_totals_and_running_balance() {
        let req = XirrRequest {
            cash_flows: vec![
                CashFlow::new(day(60), 16_000.0),
                CashFlow::new(day(0), -10_000.0),
                CashFlow::new(day(45), 0.0),
                CashFlow::new(day(30), -5_000.0),
            ],
        };
        let res = analyze(&req).unwrap();
        assert_eq!(res.total_invested, 15_000.0);
        assert_eq!(res.total_withdrawn, 16_000.0);
        assert_eq!(res.net_gain_loss, 1_000.0);
        assert_eq!(res.cash_flow_count, 3);
        assert!(res.xirr_percentage.is_some_and(f64::is_finite));
        let running: Vec<f64> = res.cumulative_flows.iter().map(|c| c.amount).collect();
        assert_eq!(running, vec![-10_000.0, -15_000.0, 1_000.0]);
        assert_eq!(res.cumulative_flows[0].label, "2024-01-01");
    }

    #[test]
    fn analysis_request_uses_camel_case_key() {
        let req: XirrRequest = serde_json::from_str(
            r#"{"cashFlows":[{"date":"2023-01-01","amount":-100000},{"date":"2024-01-01","amount":200000}]}"#,
        )
        .unwrap();
        let res = analyze(&req).unwrap();
        let pct = res.xirr_percentage.unwrap();
        assert!((pct - 100.0).abs() < 1e-4);
    }

    #[test]
    fn analysis_still_rejects_invalid_sets() {
        let req = XirrRequest {
            cash_flows: vec![CashFlow::new(day(0), -1.0), CashFlow::new(day(3), 0.0)],
        };
        assert!(matches!(analyze(&req), Err(CalcError::Validation(_))));
    }
}
