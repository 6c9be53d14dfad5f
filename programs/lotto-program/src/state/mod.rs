pub use config::*;
pub use entry::*;
pub use treasury::*;

pub mod config;
pub mod entry;
pub mod treasury;
