pub mod blockchain_service;

pub use blockchain_service::BlockchainService;
