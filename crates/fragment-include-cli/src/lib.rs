//! Fragment Include CLI — expand `data-include` placeholders in HTML documents.

pub mod input;
pub mod run;

pub use input::Input;
pub use run::{execute, RunOptions};
