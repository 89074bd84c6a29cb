pub mod profile;
pub mod proxy;
pub mod response;
pub mod tag;
pub mod user;
