//! CLI command implementations.

mod config;
mod doctor;
mod run;
mod serve;
mod templates;

pub use config::run_config;
pub use doctor::run_doctor;
pub use run::run_distill;
pub use serve::run_serve;
pub use templates::run_templates;
