use thiserror::Error;

#[derive(Clone, Error, Debug)]
pub enum BtcError {
    // Recoverable errors
    #[error("Blockchain not found error: {0}")]
    BlockchainNotFoundError(String),

    #[error("Invalid value for miner. Must be yes or no.")]
    InvalidValueForMiner(String),

    // Unrecoverable errors
    #[error("Invalid transaction")]
    InvalidTransaction,
    #[error("Invalid block")]
    InvalidBlock,
    #[error("Invalid block header")]
    InvalidBlockHeader,
    #[error("Invalid transaction input")]
    InvalidTransactionInput,
    #[error("Invalid transaction output")]
    InvalidTransactionOutput,
    #[error("Invalid merkle root")]
    InvalidMerkleRoot,
    #[error("Invalid hash")]
    InvalidHash,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Block deserialization error: {0}")]
    BlockDeserializationError(String),
    #[error("Block serialization error: {0}")]
    BlockSerializationError(String),

    #[error("Not enough funds")]
    NotEnoughFunds,

    #[error("Blockchain tip hash error: {0}")]
    BlockChainTipHashError(String),

    #[error("Transaction deserialization error: {0}")]
    TransactionDeserializationError(String),
    #[error("Transaction serialization error: {0}")]
    TransactionSerializationError(String),
    #[error("TransactionSignatureError lock error: {0}")]
    TransactionSignatureError(String),
    #[error("Transaction Id Hex encoding error: {0}")]
    TransactionIdHexEncodingError(String),
    #[error("Transaction Id Hex  decoding  error: {0}")]
    TransactionIdHexDecodingError(String),
    #[error("Transaction not found error: {0}")]
    TransactionNotFoundError(String),

    #[error("Address encoding error: {0}")]
    AddressEncodingError(String),
    #[error("Address decoding  error: {0}")]
    AddressDecodingError(String),
    #[error("Blockchain tip hash poisoned lock error: {0}")]
    BlockchainTipHashPoisonedLockError(String),
    #[error("Nodes inner poisoned lock error: {0}")]
    NodesInnerPoisonedLockError(String),
    #[error("Memory pool inner poisoned lock error: {0}")]
    MemoryPoolInnerPoisonedLockError(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // IO errors
    #[error("Saving wallets error: {0}")]
    SavingWalletsError(String),
    #[error("Wallets file path error: {0}")]
    WalletsFilePathError(String),
    #[error("Wallets file open error: {0}")]
    WalletsFileOpenError(String),
    #[error("Wallets file read error: {0}")]
    WalletsFileReadError(String),
    #[error("Wallets file metadata error: {0}")]
    WalletsFileMetadataError(String),

    #[error("Wallet key error: {0}")]
    WalletKeyError(String),
    #[error("Wallet key pair error: {0}")]
    WalletKeyPairError(String),

    #[error("Wallets serialization error: {0}")]
    WalletsSerializationError(String),
    #[error("Wallets deserialization error: {0}")]
    WalletsDeserializationError(String),

    // Sled errors
    #[error("UTXO DB connection error: {0}")]
    UTXODBconnection(String),
    #[error("Saving UTXO error: {0}")]
    SavingUTXOError(String),
    #[error("Getting UTXO error: {0}")]
    GettingUTXOError(String),
    #[error("UTXO not found error: {0}")]
    UTXONotFoundError(String),
    #[error("Removing UTXO error: {0}")]
    RemovingUTXOError(String),

    #[error("Blockchain DB connection error: {0}")]
    BlockchainDBconnection(String),
    #[error("Saving Blockchain error: {0}")]
    SavingBlockchainError(String),
    #[error("Getting Blockchain error: {0}")]
    GetBlockchainError(String),
    #[error("Open Blockchain tree error: {0}")]
    OpenBlockchainTreeError(String),

    // Validation errors (see DESIGN.md error taxonomy)
    #[error("Invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),
    #[error("Invalid public key length: expected 64 bytes, got {0}")]
    InvalidPublicKeyLength(usize),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Transaction already exists in memory pool: {0}")]
    TransactionAlreadyExistsInMemoryPool(String),

    // Consistency errors - fatal, the process that hits these exits.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // Cryptographic errors
    #[error("KEM encapsulation error: {0}")]
    KemEncapError(String),
    #[error("KEM decapsulation error: {0}")]
    KemDecapError(String),
    #[error("KEM key generation error: {0}")]
    KemKeyGenError(String),
    #[error("ECDSA signing error: {0}")]
    EcdsaSignError(String),
    #[error("ECDSA key generation error: {0}")]
    EcdsaKeyGenError(String),

    // DID overlay errors
    #[error("DID not found: {0}")]
    DidNotFoundError(String),
    #[error("DID document encoding error: {0}")]
    DidEncodingError(String),
    #[error("DID document decoding error: {0}")]
    DidDecodingError(String),
    #[error("Challenge not found or expired for DID: {0}")]
    ChallengeExpiredError(String),
    #[error("Challenge verification failed for DID: {0}")]
    ChallengeVerificationFailedError(String),
    #[error("KEM verification method not found for DID: {0}")]
    KemKeyNotFoundError(String),

    // Config / bootstrap errors
    #[error("NODE_ID environment variable is not set")]
    MissingNodeId,
    #[error("Invalid NODE_ID: {0}")]
    InvalidNodeId(String),
    #[error("Mining address not configured")]
    MissingMiningAddress,

    // Gossip framing errors
    #[error("Malformed frame: {0}")]
    MalformedFrameError(String),
    #[error("Message encoding error: {0}")]
    MessageEncodingError(String),
    #[error("Message decoding error: {0}")]
    MessageDecodingError(String),
}

pub type Result<T> = std::result::Result<T, BtcError>;
