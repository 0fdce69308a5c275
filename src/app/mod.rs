//! Interactive reading session.

mod input;
mod session;

pub use input::{UserCommand, spawn_input_reader};
pub use session::Session;
