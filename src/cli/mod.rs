pub mod commands;
pub mod menu;

pub use commands::{Cli, Commands, run};
pub use menu::{Menu, MenuChoice, run_interactive};
