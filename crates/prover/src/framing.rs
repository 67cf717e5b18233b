use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::ProverError;

const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

/// Writes a 4-byte big-endian length prefix followed by the payload.
pub async fn write_frame(stream: &mut TcpStream, payload: &[u8]) -> Result<(), ProverError> {
    let len = payload.len() as u32;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(payload).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads a length-prefixed frame written by `write_frame`.
pub async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>, ProverError> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(ProverError::FrameTooLarge);
    }
    let mut buf = vec![0u8; len as usize];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}
