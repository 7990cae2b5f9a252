pub mod config;
pub mod error;
pub mod http;
pub mod index;
pub mod logging;
pub mod pathsafety;
pub mod reader;
pub mod scanner;
pub mod signal;
pub mod supervisor;
pub mod types;
pub mod worker;

pub use error::Error;
