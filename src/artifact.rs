//! On-disk container for fare models.
//!
//! ```text
//! offset  size  field
//!      0     4  magic "FARE"
//!      4     2  format version, u16 little-endian
//!      6     8  payload length, u64 little-endian
//!     14    32  SHA-256 of the payload
//!     46     n  payload: bincode-encoded FareModel
//! ```

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bincode::Options;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{DecodeError, LoadError};
use crate::models::FareModel;

pub const MAGIC: [u8; 4] = *b"FARE";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_LEN: usize = 4 + 2 + 8 + 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHeader {
    pub version: u16,
    pub payload_len: u64,
    pub digest: [u8; 32],
}

impl ArtifactHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        // Anything that doesn't start like an artifact is foreign, however short.
        let mut magic = [0u8; 4];
        let seen = bytes.len().min(MAGIC.len());
        magic[..seen].copy_from_slice(&bytes[..seen]);
        if magic[..seen] != MAGIC[..seen] {
            return Err(DecodeError::BadMagic { found: magic });
        }
        if bytes.len() < HEADER_LEN {
            return Err(DecodeError::TruncatedHeader {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }

        let mut version = [0u8; 2];
        version.copy_from_slice(&bytes[4..6]);
        let version = u16::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        let mut payload_len = [0u8; 8];
        payload_len.copy_from_slice(&bytes[6..14]);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes[14..HEADER_LEN]);

        Ok(Self {
            version,
            payload_len: u64::from_le_bytes(payload_len),
            digest,
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.payload_len.to_le_bytes());
        out.extend_from_slice(&self.digest);
    }
}

/// Payload codec: fixed-width integers, and the payload must be exactly one
/// model with nothing after it.
fn codec() -> impl bincode::Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub fn encode(model: &FareModel) -> Result<Vec<u8>, bincode::Error> {
    let payload = codec().serialize(model)?;
    let header = ArtifactHeader {
        version: FORMAT_VERSION,
        payload_len: payload.len() as u64,
        digest: Sha256::digest(&payload).into(),
    };

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    header.write_to(&mut out);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode and validate a whole artifact.
pub fn decode(bytes: &[u8]) -> Result<FareModel, DecodeError> {
    let header = ArtifactHeader::parse(bytes)?;
    let payload = &bytes[HEADER_LEN..];

    if payload.len() as u64 != header.payload_len {
        return Err(DecodeError::LengthMismatch {
            expected: header.payload_len,
            actual: payload.len() as u64,
        });
    }

    let digest: [u8; 32] = Sha256::digest(payload).into();
    if digest != header.digest {
        return Err(DecodeError::ChecksumMismatch {
            expected: hex::encode(header.digest),
            actual: hex::encode(digest),
        });
    }

    let model: FareModel = codec().deserialize(payload)?;
    model.validate()?;
    Ok(model)
}

/// Write `model` to `path`, replacing any existing file only once the new
/// content is fully on disk.
pub fn write_artifact(path: impl AsRef<Path>, model: &FareModel) -> Result<()> {
    let path = path.as_ref();
    model.validate().context("Refusing to write an invalid model")?;
    let bytes = encode(model).context("Failed to encode model")?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp_file
        .write_all(&bytes)
        .context("Failed to write artifact")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to flush artifact")?;
    temp_file
        .persist(path)
        .with_context(|| format!("Failed to move artifact into {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), kind = model.kind(), "wrote fare model");
    Ok(())
}

/// What `fare_app --describe` prints.
#[derive(Debug, Clone)]
pub struct ArtifactSummary {
    pub path: PathBuf,
    pub version: u16,
    pub payload_len: u64,
    pub digest: String,
    pub kind: &'static str,
    pub feature_count: usize,
}

impl fmt::Display for ArtifactSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "path:      {}", self.path.display())?;
        writeln!(f, "version:   {}", self.version)?;
        writeln!(f, "payload:   {} bytes", self.payload_len)?;
        writeln!(f, "sha256:    {}", self.digest)?;
        writeln!(f, "model:     {}", self.kind)?;
        write!(f, "features:  {}", self.feature_count)
    }
}

pub fn describe(path: impl AsRef<Path>) -> Result<ArtifactSummary, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| LoadError::from_io(path, e))?;
    let header = ArtifactHeader::parse(&bytes).map_err(|reason| LoadError::decode(path, reason))?;
    let model = decode(&bytes).map_err(|reason| LoadError::decode(path, reason))?;

    Ok(ArtifactSummary {
        path: path.to_path_buf(),
        version: header.version,
        payload_len: header.payload_len,
        digest: hex::encode(header.digest),
        kind: model.kind(),
        feature_count: model.feature_names().len(),
    })
}
