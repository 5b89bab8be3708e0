//! Binary crate for `tab`: loads a TOML config describing two or more agent
//! adapters and a policy, then drives one conversation between them to
//! completion. Every other crate in this workspace stays free of
//! filesystem, environment, and process-wide logging concerns; those all
//! live here.

mod args;
mod commands;
mod config;
mod tracing_sink;

pub use args::Cli;
pub use commands::run;
pub use tracing_sink::TracingSink;
