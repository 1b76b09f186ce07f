pub mod core;
pub mod crypto;
pub mod did;
pub mod domain;
pub mod error;
pub mod network;
pub mod node;
pub mod service;
pub mod store;
pub mod web;

mod config;
pub use config::{BOOTSTRAP_PEER, Config, GLOBAL_CONFIG};
pub use error::{BtcError, Result};

#[cfg(test)]
mod test_utils {
    use std::sync::Once;
    use tracing::info;

    static INIT: Once = Once::new();

    /// Global test setup - runs once before any tests
    pub fn setup_test_environment() {
        INIT.call_once(|| {
            unsafe {
                std::env::set_var("RUST_TEST_THREADS", "1");
            }
            cleanup_existing_test_directories();
        });
        cleanup_existing_test_directories();
    }

    /// Global test teardown - runs after tests complete
    pub fn teardown_test_environment() {
        cleanup_existing_test_directories();
    }

    fn cleanup_existing_test_directories() {
        use std::path::Path;

        let current_dir = std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());

        if let Ok(entries) = std::fs::read_dir(current_dir) {
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if let Some(name) = path.file_name() {
                    let name_str = name.to_string_lossy();
                    if name_str.starts_with("test_") {
                        info!("Cleaning up test directory: {}", name_str);
                        let _ = std::fs::remove_dir_all(&path);
                        let _ = std::fs::remove_file(&path);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(unused_imports)]
use test_utils::{setup_test_environment, teardown_test_environment};
