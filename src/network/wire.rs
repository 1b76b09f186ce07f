//! Gossip wire framing.
//!
//! Every message is a 12-byte zero-padded ASCII command tag followed by a
//! bincode-encoded body, and a connection carries exactly one message — the
//! sender writes it and drops the socket, the receiver reads it and shuts
//! the socket down. Grounded on the teacher's own wire enum
//! (`src/server.rs`'s `Package`/`OpType`), split one struct per command and
//! re-framed onto the fixed 12-byte tag instead of the teacher's
//! `serde_json::Deserializer` streaming decode.

use std::io::{Read, Write};
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{BtcError, Result};

const COMMAND_LEN: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OpType {
    Tx,
    Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionBody {
    pub addr_from: SocketAddr,
    pub version: usize,
    pub best_height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddrBody {
    pub addr_from: SocketAddr,
    pub addresses: Vec<SocketAddr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvBody {
    pub addr_from: SocketAddr,
    pub op_type: OpType,
    pub items: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBlocksBody {
    pub addr_from: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDataBody {
    pub addr_from: SocketAddr,
    pub op_type: OpType,
    pub id: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockBody {
    pub addr_from: SocketAddr,
    pub block: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxBody {
    pub addr_from: SocketAddr,
    pub transaction: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Version(VersionBody),
    Addr(AddrBody),
    Inv(InvBody),
    GetBlocks(GetBlocksBody),
    GetData(GetDataBody),
    Block(BlockBody),
    Tx(TxBody),
}

impl Message {
    pub fn command(&self) -> &'static str {
        match self {
            Message::Version(_) => "version",
            Message::Addr(_) => "addr",
            Message::Inv(_) => "inv",
            Message::GetBlocks(_) => "getblocks",
            Message::GetData(_) => "getdata",
            Message::Block(_) => "block",
            Message::Tx(_) => "tx",
        }
    }

    fn encode_body(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard();
        let encoded = match self {
            Message::Version(b) => bincode::serde::encode_to_vec(b, config),
            Message::Addr(b) => bincode::serde::encode_to_vec(b, config),
            Message::Inv(b) => bincode::serde::encode_to_vec(b, config),
            Message::GetBlocks(b) => bincode::serde::encode_to_vec(b, config),
            Message::GetData(b) => bincode::serde::encode_to_vec(b, config),
            Message::Block(b) => bincode::serde::encode_to_vec(b, config),
            Message::Tx(b) => bincode::serde::encode_to_vec(b, config),
        };
        encoded.map_err(|e| BtcError::MessageEncodingError(e.to_string()))
    }

    /// Writes the 12-byte command tag followed by the encoded body.
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        let mut command = [0u8; COMMAND_LEN];
        let tag = self.command().as_bytes();
        command[..tag.len()].copy_from_slice(tag);
        writer
            .write_all(&command)
            .map_err(|e| BtcError::MessageEncodingError(e.to_string()))?;
        writer
            .write_all(&self.encode_body()?)
            .map_err(|e| BtcError::MessageEncodingError(e.to_string()))
    }

    /// Reads the single message a connection carries: the 12-byte command
    /// tag, then the rest of the stream as its body.
    pub fn read_from(mut reader: impl Read) -> Result<Message> {
        let mut command = [0u8; COMMAND_LEN];
        reader
            .read_exact(&mut command)
            .map_err(|e| BtcError::MalformedFrameError(e.to_string()))?;
        let end = command.iter().position(|&b| b == 0).unwrap_or(COMMAND_LEN);
        let command_str = std::str::from_utf8(&command[..end])
            .map_err(|e| BtcError::MalformedFrameError(e.to_string()))?;

        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| BtcError::MalformedFrameError(e.to_string()))?;
        let config = bincode::config::standard();

        macro_rules! decode {
            ($variant:ident) => {{
                let (decoded, _) = bincode::serde::decode_from_slice(&body, config)
                    .map_err(|e| BtcError::MessageDecodingError(e.to_string()))?;
                Message::$variant(decoded)
            }};
        }

        Ok(match command_str {
            "version" => decode!(Version),
            "addr" => decode!(Addr),
            "inv" => decode!(Inv),
            "getblocks" => decode!(GetBlocks),
            "getdata" => decode!(GetData),
            "block" => decode!(Block),
            "tx" => decode!(Tx),
            other => return Err(BtcError::UnknownCommand(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:3000".parse().unwrap()
    }

    #[test]
    fn version_round_trips_through_the_wire() {
        let message = Message::Version(VersionBody {
            addr_from: addr(),
            version: 1,
            best_height: 42,
        });
        let mut buf = Vec::new();
        message.write_to(&mut buf).unwrap();
        assert_eq!(&buf[..12], b"version\0\0\0\0\0");

        let decoded = Message::read_from(buf.as_slice()).unwrap();
        match decoded {
            Message::Version(body) => assert_eq!(body.best_height, 42),
            _ => panic!("expected version"),
        }
    }

    #[test]
    fn inv_round_trips_items() {
        let message = Message::Inv(InvBody {
            addr_from: addr(),
            op_type: OpType::Block,
            items: vec![vec![1, 2, 3]],
        });
        let mut buf = Vec::new();
        message.write_to(&mut buf).unwrap();
        let decoded = Message::read_from(buf.as_slice()).unwrap();
        match decoded {
            Message::Inv(body) => assert_eq!(body.items, vec![vec![1, 2, 3]]),
            _ => panic!("expected inv"),
        }
    }

    #[test]
    fn unknown_command_tag_is_rejected() {
        let mut buf = vec![0u8; 12];
        buf[..7].copy_from_slice(b"bogus12");
        assert!(Message::read_from(buf.as_slice()).is_err());
    }

    #[test]
    fn truncated_frame_is_rejected() {
        assert!(Message::read_from([0u8; 4].as_slice()).is_err());
    }
}
