//! CLI command implementations

pub mod config;
pub mod create;
pub mod delete;
pub mod inspect;
pub mod stress;

pub use config::execute as config;
pub use create::execute as create;
pub use delete::execute as delete;
pub use inspect::execute as inspect;
pub use stress::execute as stress;
