pub mod config;
pub mod probe;
pub mod run;

// Re-export command functions for convenience
pub use config::show_config;
pub use probe::probe_url;
pub use run::{run, RunParams};
