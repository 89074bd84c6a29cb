pub mod login_limiter;

pub use login_limiter::LoginLimiter;
