//! Calculator abstractions and the request/response types naming every calculator

use crate::calc::{
    compounding, goal_sip, gratuity, growth, gst, hra, inflation, loan, lumpsum, recurring,
    schemes, sip, small_savings, step_up_sip, withdrawal, xirr,
};
use crate::core::chart::ChartSpec;
use crate::core::error::CalcError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

/// Anything that can turn a request into a result: the pure local
/// implementation, an HTTP backend, or a composition of both.
#[async_trait]
pub trait Calculator: Send + Sync {
    async fn calculate(&self, req: &CalcRequest) -> Result<CalcResponse, CalcError>;
}

macro_rules! calculators {
    ($($variant:ident => $name:literal, $req:ty, $res:ty, $func:path;)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CalculatorKind {
            $($variant,)+
        }

        impl CalculatorKind {
            pub const ALL: &'static [CalculatorKind] = &[$(CalculatorKind::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(CalculatorKind::$variant => $name,)+
                }
            }
        }

        /// A validated-shape request for one calculator.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum CalcRequest {
            $($variant($req),)+
        }

        impl CalcRequest {
            pub fn kind(&self) -> CalculatorKind {
                match self {
                    $(CalcRequest::$variant(_) => CalculatorKind::$variant,)+
                }
            }

            /// Reads the flat JSON object a form or client would send.
            pub fn from_value(kind: CalculatorKind, value: serde_json::Value) -> Result<Self, CalcError> {
                Ok(match kind {
                    $(CalculatorKind::$variant => CalcRequest::$variant(serde_json::from_value(value)?),)+
                })
            }

            pub(crate) fn dispatch(&self) -> Result<CalcResponse, CalcError> {
                match self {
                    $(CalcRequest::$variant(req) => $func(req).map(CalcResponse::$variant),)+
                }
            }
        }

        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(untagged)]
        pub enum CalcResponse {
            $($variant($res),)+
        }

        impl CalcResponse {
            pub fn kind(&self) -> CalculatorKind {
                match self {
                    $(CalcResponse::$variant(_) => CalculatorKind::$variant,)+
                }
            }

            /// Parses a backend payload; the caller knows which calculator it asked.
            pub fn from_value(kind: CalculatorKind, value: serde_json::Value) -> Result<Self, CalcError> {
                match kind {
                    $(CalculatorKind::$variant => serde_json::from_value(value)
                        .map(CalcResponse::$variant)
                        .map_err(|e| CalcError::Backend(e.to_string())),)+
                }
            }

            pub fn chart(&self) -> ChartSpec {
                match self {
                    $(CalcResponse::$variant(res) => res.chart(),)+
                }
            }
        }
    };
}

calculators! {
    Sip => "sip", sip::SipRequest, sip::SipResponse, sip::calculate;
    StepUpSip => "step-up-sip", step_up_sip::StepUpSipRequest, step_up_sip::StepUpSipResponse, step_up_sip::calculate;
    LumpSum => "lump-sum-sip", lumpsum::LumpSumRequest, lumpsum::LumpSumResponse, lumpsum::calculate;
    GoalSip => "goal-sip", goal_sip::GoalSipRequest, goal_sip::GoalSipResponse, goal_sip::goal_sip;
    ReverseSip => "reverse-sip", goal_sip::ReverseSipRequest, goal_sip::ReverseSipResponse, goal_sip::reverse_sip;
    Swp => "swp", withdrawal::SwpRequest, withdrawal::SwpResponse, withdrawal::calculate;
    CompoundInterest => "compound-interest", compounding::CompoundInterestRequest, compounding::CompoundInterestResponse, compounding::compound_interest;
    FutureValue => "future-value", compounding::FutureValueRequest, compounding::FutureValueResponse, compounding::future_value;
    DailyCompoundInterest => "daily-compound-interest", compounding::DailyCompoundRequest, compounding::DailyCompoundResponse, compounding::daily_compound_interest;
    Fd => "fd", compounding::FdRequest, compounding::FdResponse, compounding::fixed_deposit;
    Rd => "rd", recurring::RdRequest, recurring::RdResponse, recurring::calculate;
    Ppf => "ppf", small_savings::PpfRequest, small_savings::PpfResponse, small_savings::ppf;
    Nsc => "nsc", small_savings::CertificateRequest, small_savings::NscResponse, small_savings::nsc;
    Kvp => "kvp", small_savings::CertificateRequest, small_savings::KvpResponse, small_savings::kvp;
    Epf => "epf", schemes::EpfRequest, schemes::EpfResponse, schemes::epf;
    Ssy => "ssy", schemes::SsyRequest, schemes::SsyResponse, schemes::ssy;
    Scss => "scss", schemes::ScssRequest, schemes::ScssResponse, schemes::scss;
    Pomis => "post-office-monthly-income-scheme", schemes::PomisRequest, schemes::PomisResponse, schemes::pomis;
    Gratuity => "gratuity", gratuity::GratuityRequest, gratuity::GratuityResponse, gratuity::calculate;
    LoanAmount => "loan-amount", loan::LoanAmountRequest, loan::LoanAmountResponse, loan::loan_amount;
    LoanTenure => "loan-tenure", loan::LoanTenureRequest, loan::LoanTenureResponse, loan::loan_tenure;
    InterestRate => "interest-rate", loan::InterestRateRequest, loan::InterestRateResponse, loan::interest_rate;
    Gst => "gst", gst::GstRequest, gst::GstResponse, gst::calculate;
    Hra => "hra", hra::HraRequest, hra::HraResponse, hra::calculate;
    Inflation => "inflation", inflation::InflationRequest, inflation::InflationResponse, inflation::calculate;
    Cagr => "cagr", growth::CagrRequest, growth::CagrResponse, growth::calculate_cagr;
    ReverseCagr => "reverse-cagr", growth::ReverseCagrRequest, growth::ReverseCagrResponse, growth::reverse_cagr;
    RuleOf72 => "rule-of-72", growth::RuleOf72Request, growth::RuleOf72Response, growth::rule_of_72;
    XirrAnalysis => "xirr-analysis", xirr::XirrRequest, xirr::XirrResponse, xirr::analyze;
}

impl CalculatorKind {
    /// HTTP path the calculator has always been served at.
    pub fn endpoint(self) -> String {
        format!("/calculate-{}", self.name())
    }
}

impl Display for CalculatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CalculatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        let wanted = match wanted.as_str() {
            "xirr" => "xirr-analysis",
            "rule72" => "rule-of-72",
            "compound" => "compound-interest",
            "lumpsum" | "lump-sum" => "lump-sum-sip",
            "pomis" => "post-office-monthly-income-scheme",
            other => other,
        };
        CalculatorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown calculator: {}", s))
    }
}
