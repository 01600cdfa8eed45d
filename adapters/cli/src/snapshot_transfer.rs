//! Single-line snapshot strings for resuming a session elsewhere.
//!
//! A string reads `fogline:v1:<columns>x<rows>:<payload>`, where the payload
//! is base64 JSON holding tile size, terrain, occupancy and fog.

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use fogline_core::{MapConfig, OccupancySnapshot, TerrainConfig};
use fogline_system_fog_of_war::FogSnapshot;
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "fogline";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
const SNAPSHOT_HEADER: &str = "fogline:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Map layout, occupancy and exploration captured from a running session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SessionSnapshot {
    /// Parameters the map was generated from.
    pub(crate) map: MapConfig,
    /// Units and buildings blocking cells.
    pub(crate) occupancy: OccupancySnapshot,
    /// Explored and visible cells.
    pub(crate) fog: FogSnapshot,
}

impl SessionSnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, SnapshotTransferError> {
        let payload = SerializableSnapshot {
            tile_width: self.map.tile_width,
            tile_height: self.map.tile_height,
            terrain: self.map.terrain,
            occupancy: self.occupancy.clone(),
            fog: self.fog.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(SnapshotTransferError::Serialization)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.map.columns, self.map.rows
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SnapshotTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SnapshotTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let mut segment =
            |name: &'static str| parts.next().ok_or(SnapshotTransferError::MissingSegment(name));
        let domain = segment("prefix")?;
        let version = segment("version")?;
        let dimensions = segment("grid dimensions")?;
        let payload = segment("payload")?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(SnapshotTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(SnapshotTransferError::UnsupportedVersion(
                version.to_owned(),
            ));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SnapshotTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(SnapshotTransferError::InvalidPayload)?;

        if (decoded.fog.columns, decoded.fog.rows) != (columns, rows) {
            return Err(SnapshotTransferError::DimensionMismatch {
                header: (columns, rows),
                fog: (decoded.fog.columns, decoded.fog.rows),
            });
        }

        Ok(Self {
            map: MapConfig::new(columns, rows)
                .with_tile_size(decoded.tile_width, decoded.tile_height)
                .with_terrain(decoded.terrain),
            occupancy: decoded.occupancy,
            fog: decoded.fog,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SerializableSnapshot {
    tile_width: u32,
    tile_height: u32,
    terrain: TerrainConfig,
    occupancy: OccupancySnapshot,
    fog: FogSnapshot,
}

/// Errors that can occur while encoding or decoding snapshot strings.
#[derive(Debug)]
pub(crate) enum SnapshotTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The named segment was absent from the encoded snapshot.
    MissingSegment(&'static str),
    /// The encoded snapshot used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    InvalidDimensions(String),
    /// The fog payload describes a grid of a different size than the header.
    DimensionMismatch {
        /// Dimensions announced by the header.
        header: (u32, u32),
        /// Dimensions recorded by the fog payload.
        fog: (u32, u32),
    },
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The snapshot could not be serialised.
    Serialization(serde_json::Error),
}

impl fmt::Display for SnapshotTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "snapshot string was empty"),
            Self::MissingSegment(segment) => {
                write!(f, "snapshot string is missing the {segment}")
            }
            Self::InvalidPrefix(prefix) => {
                write!(f, "snapshot prefix '{prefix}' is not supported")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "snapshot version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::DimensionMismatch { header, fog } => write!(
                f,
                "header announces a {}x{} grid but the fog covers {}x{}",
                header.0, header.1, fog.0, fog.1
            ),
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode snapshot payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse snapshot payload: {error}")
            }
            Self::Serialization(error) => {
                write!(f, "could not serialise snapshot: {error}")
            }
        }
    }
}

impl Error for SnapshotTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) | Self::Serialization(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), SnapshotTransferError> {
    let invalid = || SnapshotTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}
