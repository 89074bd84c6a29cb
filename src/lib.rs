pub mod auth;
pub mod core;
pub mod db;
pub mod handlers;
pub mod models;
pub mod proxy_tools;
pub mod remote;
pub mod security;
pub mod utils;
