pub mod access;
pub mod dashboard_manager;
pub mod dashboard_service;
pub mod query_filter;
pub mod transaction;
pub mod version_manager;
pub mod version_policy;

pub use access::*;
pub use dashboard_manager::*;
pub use dashboard_service::*;
pub use query_filter::*;
pub use transaction::*;
pub use version_manager::*;
pub use version_policy::*;
