//! Content digests for deduplication and integrity checks.
//!
//! The digest is SHA-256 over the exact bytes, hex encoded. Filenames and
//! metadata play no part.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Length of a hex-encoded digest
pub const DIGEST_HEX_LEN: usize = 64;

const READ_BUFFER_SIZE: usize = 64 * 1024;

pub struct ContentHasher;

impl ContentHasher {
    pub fn hash_bytes(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Hash everything `reader` yields. Read errors are returned unchanged.
    pub async fn hash_reader<R>(mut reader: R) -> std::io::Result<String>
    where
        R: AsyncRead + Unpin,
    {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Hash a chunked stream, stopping at the first chunk error.
    pub async fn hash_stream<S, E>(mut stream: S) -> Result<String, E>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
    {
        let mut hasher = Sha256::new();
        while let Some(chunk) = stream.next().await {
            hasher.update(&chunk?);
        }
        Ok(hex::encode(hasher.finalize()))
    }

    /// Whether `value` looks like a digest produced by this hasher.
    pub fn is_valid_digest(value: &str) -> bool {
        value.len() == DIGEST_HEX_LEN && value.chars().all(|c| c.is_ascii_hexdigit())
    }
}
