pub mod config;
pub mod directive;

pub use config::{Config, HarnessConfig, SurrealConfig};
pub use directive::{Directive, DIRECTIVE_STATUS_ACTIVE};
