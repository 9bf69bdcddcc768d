pub mod cli;
pub mod commands;
pub mod render;

pub use cli::Cli;
pub use commands::run;
