pub mod api;

pub use api::{create_all_api_routes, create_api_v1_routes, create_did_routes, create_monitor_routes};
