pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod replay;
pub mod translate;
pub mod util;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
