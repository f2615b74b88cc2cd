//! Core abstractions shared by the calculators, transports and front ends

pub mod calculator;
pub mod chart;
pub mod config;
pub mod error;
pub mod log;

// Re-export main types for cleaner imports
pub use calculator::{CalcRequest, CalcResponse, Calculator, CalculatorKind};
pub use chart::ChartSpec;
pub use error::CalcError;
