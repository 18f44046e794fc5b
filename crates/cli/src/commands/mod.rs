pub mod config_cmd;
pub mod prompt;
pub mod review;
