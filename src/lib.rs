pub mod analytics;
pub mod config;
pub mod links;
pub mod models;
pub mod shortener;
pub mod storage;

pub mod api;
pub mod redirect;
