//! Command handlers for the kbchat CLI.

pub mod ask;
pub mod bases;

pub use ask::AskCommand;
pub use bases::BasesCommand;
