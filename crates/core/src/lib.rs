pub mod config;
pub mod models;
pub mod paging;
pub mod platform;
