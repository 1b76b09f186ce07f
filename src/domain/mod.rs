pub mod transaction;
pub mod wallet;
pub mod wallets;

pub use transaction::{TXInput, TXOutput, Transaction};
pub use wallet::{KemWallet, Wallet};
pub use wallets::{KemWallets, Wallets};
