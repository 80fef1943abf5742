pub mod error;
pub mod session;
pub mod signals;
pub mod stats;
pub mod traits;
pub mod types;

pub use error::*;
pub use signals::*;
pub use traits::*;
pub use types::*;
