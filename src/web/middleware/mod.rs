// Web middleware for request processing
pub mod logging;

pub use logging::create_logging_layer;
