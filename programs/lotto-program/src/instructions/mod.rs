pub use enter_lottery::*;
pub use init_config::*;
pub use reset_lottery::*;

pub mod enter_lottery;
pub mod init_config;
pub mod reset_lottery;
