pub mod config;
pub mod config_loader;
pub mod error;
pub mod state_machine;

pub use config::*;
pub use config_loader::*;
pub use error::*;
pub use state_machine::*;
