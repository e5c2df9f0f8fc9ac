pub mod health;
pub mod packages;
pub mod query;
pub mod sync;

pub use health::{health, live, ready};
pub use packages::{get_package, get_package_layers, list_packages};
pub use query::{query, query_package};
pub use sync::trigger_sync;
