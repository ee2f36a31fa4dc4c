pub mod analysis;
pub mod config;
pub mod filter;
pub mod task;

pub use analysis::*;
pub use config::*;
pub use filter::*;
pub use task::*;
