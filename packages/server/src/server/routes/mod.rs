// HTTP routes
pub mod admin;
pub mod health;
pub mod registrants;
pub mod stats;

pub use admin::*;
pub use health::*;
pub use registrants::*;
pub use stats::*;
