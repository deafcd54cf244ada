//! Wire message kinds and the length-prefixed JSON framing (§4.8, §6 "P2P
//! wire format"). Grounded on `core/network.py`'s message dispatch.

use argh_consensus::Block;
use argh_core::{Transaction, MAX_P2P_PAYLOAD_BYTES};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::NetworkError;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Handshake { node_id: String },
    Status { latest_index: u64, latest_hash: String },
    GetBlocks { from: u64 },
    Blocks { data: Vec<Block> },
    Block { data: Block },
    GetBlock { index: u64 },
    SingleBlock { data: Block },
    Tx { data: Transaction },
    Ping,
    Pong,
}

/// Writes `[4-byte big-endian length][JSON body]`.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &Message,
) -> Result<(), NetworkError> {
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_P2P_PAYLOAD_BYTES {
        return Err(NetworkError::PayloadTooLarge(body.len()));
    }
    let len = body.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one `[4-byte big-endian length][JSON body]` frame.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Message, NetworkError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_P2P_PAYLOAD_BYTES {
        return Err(NetworkError::PayloadTooLarge(len));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_ping_through_an_in_memory_duplex() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        write_message(&mut client, &Message::Ping).await.unwrap();
        let received = read_message(&mut server).await.unwrap();
        assert!(matches!(received, Message::Ping));
    }

    #[tokio::test]
    async fn rejects_a_frame_claiming_an_oversized_payload() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let len = (MAX_P2P_PAYLOAD_BYTES as u32) + 1;
        client.write_all(&len.to_be_bytes()).await.unwrap();
        let err = read_message(&mut server).await.unwrap_err();
        assert!(matches!(err, NetworkError::PayloadTooLarge(_)));
    }
}
