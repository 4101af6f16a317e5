pub mod cli;
pub mod firestore;
pub mod jsonl;
pub mod load_config;

pub use cli::{run, Cli, Commands};
