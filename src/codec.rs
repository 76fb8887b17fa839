// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Payload framing shared by every sketch type.
//!
//! ```text
//! +-----------+-----------+----------------------+
//! | tag (u8)  | ver (u8)  | bincode body         |
//! +-----------+-----------+----------------------+
//! ```
//!
//! The body carries the sketch parameters followed by its raw
//! register / bit / counter data. It must fill the rest of the payload exactly;
//! trailing bytes are rejected.

use crate::enums::SketchKind;
use crate::traits::SketchError;
use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

/// Payload layout version written by this build.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the `[tag][version]` header.
pub const HEADER_LEN: usize = 2;

/// Reads the header of a payload without decoding the body.
pub fn split_header(bytes: &[u8]) -> Result<(SketchKind, u8, &[u8]), SketchError> {
    if bytes.len() < HEADER_LEN {
        return Err(SketchError::Deserialization(format!(
            "payload too short: {} bytes",
            bytes.len()
        )));
    }
    let kind = SketchKind::from_tag(bytes[0])?;
    Ok((kind, bytes[1], &bytes[HEADER_LEN..]))
}

/// Fixed-width little-endian integers, the same layout as `bincode::serialize`.
fn body_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub(crate) fn encode<T: Serialize>(kind: SketchKind, body: &T) -> Result<Vec<u8>, SketchError> {
    let mut buf = vec![kind.tag(), FORMAT_VERSION];
    body_options()
        .serialize_into(&mut buf, body)
        .map_err(|e| SketchError::Serialization(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn decode<T: DeserializeOwned>(kind: SketchKind, bytes: &[u8]) -> Result<T, SketchError> {
    let (found, version, body) = split_header(bytes)?;
    if found != kind {
        return Err(SketchError::Deserialization(format!(
            "expected {} payload, found {}",
            kind, found
        )));
    }
    if version != FORMAT_VERSION {
        return Err(SketchError::Deserialization(format!(
            "unsupported {} payload version {}",
            kind, version
        )));
    }
    body_options().deserialize(body).map_err(|e| {
        tracing::debug!(%kind, error = %e, "payload body failed to decode");
        SketchError::Deserialization(e.to_string())
    })
}
