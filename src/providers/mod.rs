pub mod fallback;
pub mod local;
pub mod remote;
pub mod util;

pub use fallback::FallbackCalculator;
pub use local::LocalCalculator;
pub use remote::RemoteCalculator;
