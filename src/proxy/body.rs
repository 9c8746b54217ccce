//! Body materialization.
//!
//! # Responsibilities
//! - Pass the upstream stream through untouched when not decompressing
//! - Otherwise buffer it, undo `content-encoding`, and fix up the headers
//!
//! # Design Decisions
//! - Decoding happens only on a fully buffered body; there is no streaming decode
//! - Unknown encodings leave bytes and headers exactly as upstream sent them,
//!   so the label always describes the bytes
//! - `content-length` is rewritten to the buffered size

use std::io;

use async_compression::tokio::bufread::{
    BrotliDecoder, DeflateDecoder, GzipDecoder, ZlibDecoder, ZstdDecoder,
};
use axum::http::{header, HeaderValue};
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ProxyError;
use crate::proxy::header_set::HeaderSet;
use crate::upstream::BodyStream;

/// Body handed to the response emitter.
pub enum ResponseBody {
    /// Upstream bytes, unread and unmodified.
    Stream(BodyStream),
    /// Fully read and decoded bytes.
    Buffered(Bytes),
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Stream(_) => f.write_str("ResponseBody::Stream"),
            ResponseBody::Buffered(b) => write!(f, "ResponseBody::Buffered({} bytes)", b.len()),
        }
    }
}

/// Content codings that can be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coding {
    Identity,
    Gzip,
    Deflate,
    Brotli,
    Zstd,
}

impl Coding {
    fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "identity" => Some(Coding::Identity),
            "gzip" | "x-gzip" => Some(Coding::Gzip),
            "deflate" => Some(Coding::Deflate),
            "br" => Some(Coding::Brotli),
            "zstd" => Some(Coding::Zstd),
            _ => None,
        }
    }
}

/// Pick streaming or buffered delivery for the upstream body.
pub async fn materialize(
    body: BodyStream,
    headers: &mut HeaderSet,
    decompress: bool,
) -> Result<ResponseBody, ProxyError> {
    if !decompress {
        return Ok(ResponseBody::Stream(body));
    }

    let raw = read_all(body).await.map_err(ProxyError::UpstreamBody)?;

    // Nothing to decode; a label on an empty body describes no bytes.
    if raw.is_empty() {
        headers.delete(&header::CONTENT_ENCODING);
        set_content_length(headers, 0);
        return Ok(ResponseBody::Buffered(raw));
    }

    let Some(codings) = content_codings(headers) else {
        tracing::debug!(
            encoding = ?headers.get(&header::CONTENT_ENCODING),
            "Unsupported content-encoding, passing body through"
        );
        set_content_length(headers, raw.len());
        return Ok(ResponseBody::Buffered(raw));
    };

    let mut decoded = raw;
    // Codings are listed in the order they were applied.
    for coding in codings.into_iter().rev() {
        decoded = decode(coding, decoded).await.map_err(ProxyError::UpstreamBody)?;
    }

    headers.delete(&header::CONTENT_ENCODING);
    set_content_length(headers, decoded.len());
    crate::observability::metrics::record_decompressed(decoded.len());

    Ok(ResponseBody::Buffered(decoded))
}

/// Every coding named by `content-encoding`, or `None` if any is unknown.
fn content_codings(headers: &HeaderSet) -> Option<Vec<Coding>> {
    let mut codings = Vec::new();
    for value in headers.get_all(&header::CONTENT_ENCODING) {
        let value = value.to_str().ok()?;
        for token in value.split(',').filter(|t| !t.trim().is_empty()) {
            codings.push(Coding::parse(token)?);
        }
    }
    Some(codings)
}

fn set_content_length(headers: &mut HeaderSet, len: usize) {
    headers.set(header::CONTENT_LENGTH, HeaderValue::from(len));
}

async fn read_all(mut body: BodyStream) -> io::Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.try_next().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

async fn decode(coding: Coding, input: Bytes) -> io::Result<Bytes> {
    let src: &[u8] = &input;
    match coding {
        Coding::Identity => Ok(input.clone()),
        Coding::Gzip => drain(GzipDecoder::new(src)).await,
        Coding::Deflate if is_zlib(src) => drain(ZlibDecoder::new(src)).await,
        // Some servers send raw deflate without the zlib wrapper.
        Coding::Deflate => drain(DeflateDecoder::new(src)).await,
        Coding::Brotli => drain(BrotliDecoder::new(src)).await,
        Coding::Zstd => drain(ZstdDecoder::new(src)).await,
    }
}

/// RFC 1950 header check: deflate method and a valid FCHECK.
fn is_zlib(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => cmf & 0x0f == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Bytes> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await?;
    Ok(Bytes::from(out))
}
