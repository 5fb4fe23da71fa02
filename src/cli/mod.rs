pub mod args;
pub mod commands;

pub use args::{Cli, Commands, InteractiveArgs};
pub use commands::{
    handle_apply_command, handle_hotkeys_command, handle_list_command, run_interactive,
};
