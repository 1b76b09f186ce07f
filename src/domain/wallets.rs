//! Wallet collections persisted to disk with `bincode`.
//!
//! [`Wallets`] is per-node (its file is namespaced by `NODE_ID`, see
//! `config::Config::wallet_file`). [`KemWallets`] is process-global: the same
//! `kem_wallet.dat` backs the DID HTTP service regardless of which node
//! created the KEM wallet.

use std::collections::HashMap;
use std::env::current_dir;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

use super::wallet::{KemWallet, Wallet};
use crate::error::{BtcError, Result};

pub struct Wallets {
    wallets: HashMap<String, Wallet>,
    file_name: String,
}

impl Wallets {
    pub fn new(file_name: String) -> Result<Wallets> {
        let mut wallets = Wallets {
            wallets: HashMap::new(),
            file_name,
        };
        wallets.load_from_file()?;
        Ok(wallets)
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = Wallet::new()?;
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        self.save_to_file()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get_wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    fn file_path(&self) -> Result<PathBuf> {
        Ok(current_dir()
            .map_err(|e| BtcError::WalletsFilePathError(e.to_string()))?
            .join(&self.file_name))
    }

    fn load_from_file(&mut self) -> Result<()> {
        let path = self.file_path()?;
        if !path.exists() {
            return Ok(());
        }
        let mut file =
            File::open(path).map_err(|e| BtcError::WalletsFileOpenError(e.to_string()))?;
        let metadata = file
            .metadata()
            .map_err(|e| BtcError::WalletsFileMetadataError(e.to_string()))?;
        let mut buf = vec![0; metadata.len() as usize];
        file.read_exact(&mut buf)
            .map_err(|e| BtcError::WalletsFileReadError(e.to_string()))?;
        let wallets = bincode::serde::decode_from_slice(&buf[..], bincode::config::standard())
            .map_err(|e| BtcError::WalletsDeserializationError(e.to_string()))?
            .0;
        self.wallets = wallets;
        Ok(())
    }

    fn save_to_file(&self) -> Result<()> {
        let path = self.file_path()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        let wallets_bytes =
            bincode::serde::encode_to_vec(&self.wallets, bincode::config::standard())
                .map_err(|e| BtcError::WalletsSerializationError(e.to_string()))?;
        writer
            .write_all(wallets_bytes.as_slice())
            .map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        Ok(())
    }
}

pub struct KemWallets {
    wallets: HashMap<String, KemWallet>,
    file_name: String,
}

impl KemWallets {
    pub fn new(file_name: String) -> Result<KemWallets> {
        let mut wallets = KemWallets {
            wallets: HashMap::new(),
            file_name,
        };
        wallets.load_from_file()?;
        Ok(wallets)
    }

    pub fn create_wallet(&mut self) -> Result<String> {
        let wallet = KemWallet::new();
        let address = wallet.get_address();
        self.wallets.insert(address.clone(), wallet);
        self.save_to_file()?;
        Ok(address)
    }

    pub fn get_addresses(&self) -> Vec<String> {
        self.wallets.keys().cloned().collect()
    }

    pub fn get_wallet(&self, address: &str) -> Option<&KemWallet> {
        self.wallets.get(address)
    }

    fn file_path(&self) -> Result<PathBuf> {
        Ok(current_dir()
            .map_err(|e| BtcError::WalletsFilePathError(e.to_string()))?
            .join(&self.file_name))
    }

    fn load_from_file(&mut self) -> Result<()> {
        let path = self.file_path()?;
        if !path.exists() {
            return Ok(());
        }
        let mut file =
            File::open(path).map_err(|e| BtcError::WalletsFileOpenError(e.to_string()))?;
        let metadata = file
            .metadata()
            .map_err(|e| BtcError::WalletsFileMetadataError(e.to_string()))?;
        let mut buf = vec![0; metadata.len() as usize];
        file.read_exact(&mut buf)
            .map_err(|e| BtcError::WalletsFileReadError(e.to_string()))?;
        let wallets = bincode::serde::decode_from_slice(&buf[..], bincode::config::standard())
            .map_err(|e| BtcError::WalletsDeserializationError(e.to_string()))?
            .0;
        self.wallets = wallets;
        Ok(())
    }

    fn save_to_file(&self) -> Result<()> {
        let path = self.file_path()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&path)
            .map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        let wallets_bytes =
            bincode::serde::encode_to_vec(&self.wallets, bincode::config::standard())
                .map_err(|e| BtcError::WalletsSerializationError(e.to_string()))?;
        writer
            .write_all(wallets_bytes.as_slice())
            .map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| BtcError::SavingWalletsError(e.to_string()))?;
        Ok(())
    }
}
