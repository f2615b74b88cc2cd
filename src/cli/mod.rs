pub mod batch;
pub mod calc;
pub mod chart;
pub mod input;
pub mod render;
pub mod setup;
pub mod ui;
pub mod xirr;

pub use calc::OutputOptions;
