pub mod authenticator;
pub mod password;
pub mod session;
pub mod token;
