// src/lib.rs

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod errors;
pub mod extractor;
pub mod handlers;
pub mod htmx_handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod session;
pub mod state;
