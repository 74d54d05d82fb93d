pub mod api;
pub mod config;
pub mod dom;
pub mod notify;
pub mod page;
