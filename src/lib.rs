pub mod ashby;
pub mod cli;
pub mod config;
pub mod contract;
pub mod drive;
pub mod load_config;
pub mod runlog;
pub mod transfer;

pub use cli::{run, Cli, Commands};
