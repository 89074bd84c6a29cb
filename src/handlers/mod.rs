pub mod auth;
pub mod fallback;
pub mod health;
pub mod info;
pub mod profiles;
pub mod proxies;
pub mod tags;
