//! Concrete factor validators.

pub mod one_time_code;
pub mod password;
pub mod security_key;

pub use one_time_code::*;
pub use password::*;
pub use security_key::*;
