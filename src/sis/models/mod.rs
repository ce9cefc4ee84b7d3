//! Wire models for the SIS endpoints.

pub mod classes;
pub mod common;
pub mod meetings;

pub use classes::*;
pub use common::*;
pub use meetings::*;
