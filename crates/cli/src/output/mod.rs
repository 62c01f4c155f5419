//! Event output back-ends: a human-readable terminal logger and a
//! machine-readable JSON frame writer.

pub mod json;
pub mod terminal;

pub use json::JsonSink;
pub use terminal::TerminalSink;
