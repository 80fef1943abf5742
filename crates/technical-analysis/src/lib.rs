pub mod indicators;
pub mod momentum;
pub mod structure;
pub mod volatility;


pub use indicators::*;
pub use momentum::MomentumAnalyzer;
pub use structure::StructureAnalyzer;
pub use volatility::VolatilityAnalyzer;
