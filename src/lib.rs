pub mod config;
pub mod core;
pub mod error;
pub mod js;
pub mod lint;
pub mod log;
pub mod runner;
pub mod source;
pub mod tasks;
pub mod transpile;
pub mod util;

pub use error::{Error, Result};
pub use runner::{Pipeline, RunReport, TaskAction};
