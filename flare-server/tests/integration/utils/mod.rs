
pub use test_connection::*;
