//! Data models

pub mod rule;
pub mod user;
pub mod validation_test;

pub use rule::*;
pub use user::*;
pub use validation_test::*;
