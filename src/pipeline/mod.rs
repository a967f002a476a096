pub mod config;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod types;

pub use config::*;
pub use pipeline::*;
pub use types::*;
