pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod config;
pub mod list;
pub mod share;
pub mod status;
