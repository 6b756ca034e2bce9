use std::io::{self, Write};

use axum::body::Bytes;
use flate2::{Compression, write::GzEncoder};
use http::{HeaderMap, header::ACCEPT_ENCODING};
use tracing::{debug, warn};

use crate::config::CompressionConfig;

/// Response body after negotiation
#[derive(Debug, Clone)]
pub struct Encoded {
    pub body: Bytes,
    /// Body is gzip encoded, send `Content-Encoding: gzip`
    pub gzip: bool,
}

impl Encoded {
    fn identity(body: Bytes) -> Self {
        Self { body, gzip: false }
    }
}

/// Whether an `Accept-Encoding` value allows gzip
///
/// `gzip` and `x-gzip` count unless their q-value is zero.
pub fn accepts_gzip(accept_encoding: &str) -> bool {
    accept_encoding.split(',').any(|coding| {
        let mut parts = coding.split(';');
        let name = parts.next().unwrap_or_default().trim();
        if !name.eq_ignore_ascii_case("gzip") && !name.eq_ignore_ascii_case("x-gzip") {
            return false;
        }
        let quality = parts
            .filter_map(|param| param.trim().strip_prefix("q="))
            .filter_map(|q| q.trim().parse::<f32>().ok())
            .next()
            .unwrap_or(1.0);
        quality > 0.0
    })
}

pub fn gzip(content: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let buffer = Vec::with_capacity(content.len() / 2);
    let mut encoder = GzEncoder::new(buffer, Compression::new(level));
    encoder.write_all(content)?;
    encoder.finish()
}

/// Gzip the body when enabled and accepted by the client
///
/// Compression runs on the blocking pool. Any failure falls back to the
/// original body, it never fails the request.
pub async fn negotiate(
    config: &CompressionConfig,
    headers: &HeaderMap,
    content: Bytes,
) -> Encoded {
    if !config.enabled {
        return Encoded::identity(content);
    }
    let accepted = headers
        .get(ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(accepts_gzip);
    if !accepted {
        return Encoded::identity(content);
    }

    let level = config.level;
    let input = content.clone();
    match tokio::task::spawn_blocking(move || gzip(&input, level)).await {
        Ok(Ok(compressed)) => {
            debug!("gzip {} -> {} bytes", content.len(), compressed.len());
            Encoded {
                body: Bytes::from(compressed),
                gzip: true,
            }
        }
        Ok(Err(err)) => {
            warn!("gzip failed, sending uncompressed: {err}");
            Encoded::identity(content)
        }
        Err(err) => {
            warn!("gzip task failed, sending uncompressed: {err}");
            Encoded::identity(content)
        }
    }
}
