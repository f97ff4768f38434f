pub mod auth;
pub mod commands;
pub mod runner;

pub use auth::AuthorizationPolicy;
pub use commands::Command;
pub use runner::BotRunner;
