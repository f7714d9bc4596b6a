//! IO modules - external interfaces
//!
//! - `console` - line-oriented command console over async reader/writer pairs

pub mod console;

pub use console::run_console;
