// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::convert::TryInto;

/// A unique byte sequence to identify Arbor scene files. ("ARBORSCN").
pub const HEADER_MAGIC_BYTES: [u8; 8] = *b"ARBORSCN";
const STRATEGY_ID_LEN: usize = 32;
const CURRENT_FORMAT_VERSION: u8 = 1;

/// The fixed-size header at the beginning of every scene file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneHeader {
    /// Magic bytes to identify the file type, must be `HEADER_MAGIC_BYTES`.
    pub magic_bytes: [u8; 8],
    /// The version of the header format itself.
    pub format_version: u8,
    /// A null-padded UTF-8 string identifying the strategy that wrote the payload.
    pub strategy_id: [u8; STRATEGY_ID_LEN],
    /// The length of the payload data that follows this header, in bytes.
    pub payload_length: u64,
}

// The header is a fixed little-endian layout written by hand, independent of
// whatever encoding the payload uses.
impl SceneHeader {
    /// The total size of the header in bytes.
    pub const SIZE: usize = 8 + 1 + STRATEGY_ID_LEN + 8;

    /// Creates a header for a payload of `payload_length` bytes.
    ///
    /// Returns an error if `strategy_id` does not fit in the fixed-size field.
    pub fn new(strategy_id: &str, payload_length: u64) -> Result<Self, &'static str> {
        let raw = strategy_id.as_bytes();
        if raw.len() > STRATEGY_ID_LEN {
            return Err("Strategy id is longer than 32 bytes");
        }
        let mut field = [0u8; STRATEGY_ID_LEN];
        field[..raw.len()].copy_from_slice(raw);

        Ok(Self {
            magic_bytes: HEADER_MAGIC_BYTES,
            format_version: CURRENT_FORMAT_VERSION,
            strategy_id: field,
            payload_length,
        })
    }

    /// Returns the strategy id with its null padding stripped.
    pub fn strategy(&self) -> &str {
        let end = self
            .strategy_id
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(STRATEGY_ID_LEN);
        std::str::from_utf8(&self.strategy_id[..end]).unwrap_or("")
    }

    /// Writes the header into its fixed byte layout.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..8].copy_from_slice(&self.magic_bytes);
        out[8] = self.format_version;
        out[9..9 + STRATEGY_ID_LEN].copy_from_slice(&self.strategy_id);
        out[9 + STRATEGY_ID_LEN..].copy_from_slice(&self.payload_length.to_le_bytes());
        out
    }

    /// Attempts to parse a `SceneHeader` from the beginning of a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() < Self::SIZE {
            return Err("Not enough bytes to form a valid header");
        }

        let magic_bytes: [u8; 8] = bytes[0..8]
            .try_into()
            .map_err(|_| "Invalid magic bytes slice")?;
        if magic_bytes != HEADER_MAGIC_BYTES {
            return Err("Invalid magic bytes; not an Arbor scene file");
        }

        let format_version = bytes[8];
        if format_version != CURRENT_FORMAT_VERSION {
            return Err("Unsupported scene format version");
        }

        let strategy_id: [u8; STRATEGY_ID_LEN] = bytes[9..9 + STRATEGY_ID_LEN]
            .try_into()
            .map_err(|_| "Invalid strategy id slice")?;

        let payload_length = u64::from_le_bytes(
            bytes[9 + STRATEGY_ID_LEN..Self::SIZE]
                .try_into()
                .map_err(|_| "Invalid payload length slice")?,
        );

        Ok(Self {
            magic_bytes,
            format_version,
            strategy_id,
            payload_length,
        })
    }
}

/// A logical representation of a full scene file in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneFile {
    /// The parsed header data.
    pub header: SceneHeader,
    /// The raw, variable-length payload data.
    pub payload: Vec<u8>,
}

impl SceneFile {
    /// Wraps a payload produced by `strategy_id` into a scene file.
    pub fn new(strategy_id: &str, payload: Vec<u8>) -> Result<Self, &'static str> {
        let header = SceneHeader::new(strategy_id, payload.len() as u64)?;
        Ok(Self { header, payload })
    }

    /// Serializes the header followed by the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SceneHeader::SIZE + self.payload.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parses a header and copies out exactly `payload_length` bytes of payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        let header = SceneHeader::from_bytes(bytes)?;
        let rest = &bytes[SceneHeader::SIZE..];
        let len = usize::try_from(header.payload_length)
            .map_err(|_| "Payload length does not fit in memory")?;
        if rest.len() < len {
            return Err("Payload is shorter than the header announces");
        }
        Ok(Self {
            header,
            payload: rest[..len].to_vec(),
        })
    }
}
