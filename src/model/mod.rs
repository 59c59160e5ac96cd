pub mod common;
pub mod dashboard;
pub mod query;
pub mod user_context;
pub mod version;

pub use common::*;
pub use dashboard::*;
pub use query::*;
pub use user_context::*;
pub use version::*;
