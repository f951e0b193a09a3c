pub mod config;
pub mod errors;
pub mod metrics;
pub mod tracing;

pub use config::*;
pub use errors::*;
pub use metrics::*;
pub use self::tracing::*;
