pub mod profiles;
pub mod proxies;
pub mod store;
pub mod tags;
pub mod users;

pub use store::Store;
