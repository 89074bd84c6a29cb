pub mod parser;
pub mod tester;

pub use tester::ProxyTester;
