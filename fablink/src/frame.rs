//! Length-prefixed framing: 4-byte big-endian payload length, then the
//! payload bytes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FabLinkError;

/// Largest payload a peer may declare. Anything bigger is treated as a
/// protocol violation rather than an allocation request.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Write one frame.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FabLinkError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len())
        .map_err(|_| FabLinkError::FrameTooLarge(u32::MAX))?;
    if len > MAX_FRAME_LEN {
        return Err(FabLinkError::FrameTooLarge(len));
    }

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame, enforcing [MAX_FRAME_LEN].
pub async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, FabLinkError>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_LEN {
        return Err(FabLinkError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}
