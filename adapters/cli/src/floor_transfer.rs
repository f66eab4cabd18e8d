#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use warren_core::{FloorLayout, Gate, PassableSet};

const TRANSFER_DOMAIN: &str = "warren";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded floor payload.
pub(crate) const TRANSFER_HEADER: &str = "warren:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of a floor's cells, passable states, spawn point and gates.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FloorSnapshot {
    /// Number of cell columns contained in the grid.
    pub columns: u32,
    /// Number of cell rows contained in the grid.
    pub rows: u32,
    /// Edge length of a single cell expressed in pixels.
    pub cell_size: i32,
    /// Row-major terrain states backing the grid.
    pub cells: Vec<i32>,
    /// Terrain states actors may stand on.
    pub passable: Vec<i32>,
    /// Pixel position actors spawn at when the floor loads.
    pub spawn_px: (i32, i32),
    /// Named gate cells declared by the floor.
    pub gates: Vec<Gate>,
}

impl FloorSnapshot {
    /// Captures a snapshot of the provided layout.
    #[must_use]
    pub(crate) fn of(layout: &FloorLayout) -> Self {
        Self {
            columns: layout.columns(),
            rows: layout.rows(),
            cell_size: layout.cell_size(),
            cells: layout.cells().to_vec(),
            passable: layout.passable().values().to_vec(),
            spawn_px: layout.spawn_px(),
            gates: layout.gates().to_vec(),
        }
    }

    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableFloor {
            cell_size: self.cell_size,
            cells: self.cells.clone(),
            passable: self.passable.clone(),
            spawn_px: self.spawn_px,
            gates: self.gates.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("floor snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{TRANSFER_HEADER}:{}x{}:{encoded}", self.columns, self.rows)
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, FloorTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FloorTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(FloorTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(FloorTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(FloorTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(FloorTransferError::MissingPayload)?;

        if domain != TRANSFER_DOMAIN {
            return Err(FloorTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != TRANSFER_VERSION {
            return Err(FloorTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(FloorTransferError::InvalidEncoding)?;
        let decoded: SerializableFloor =
            serde_json::from_slice(&bytes).map_err(FloorTransferError::InvalidPayload)?;

        let expected = u64::from(columns) * u64::from(rows);
        let actual = u64::try_from(decoded.cells.len()).unwrap_or(u64::MAX);
        if actual != expected {
            return Err(FloorTransferError::GeometryMismatch {
                columns,
                rows,
                cells: decoded.cells.len(),
            });
        }
        if decoded.cell_size <= 0 {
            return Err(FloorTransferError::InvalidCellSize(decoded.cell_size));
        }

        Ok(Self {
            columns,
            rows,
            cell_size: decoded.cell_size,
            cells: decoded.cells,
            passable: decoded.passable,
            spawn_px: decoded.spawn_px,
            gates: decoded.gates,
        })
    }

    /// Rebuilds the floor layout captured by the snapshot.
    ///
    /// # Panics
    ///
    /// Panics when the cell buffer does not cover `columns * rows` cells or
    /// the cell size is not positive; [`FloorSnapshot::decode`] rejects such
    /// payloads before they reach this conversion.
    #[must_use]
    pub(crate) fn into_layout(self) -> FloorLayout {
        FloorLayout::new(
            self.columns,
            self.rows,
            self.cell_size,
            self.cells,
            PassableSet::from_values(self.passable),
            self.spawn_px,
            self.gates,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableFloor {
    cell_size: i32,
    cells: Vec<i32>,
    passable: Vec<i32>,
    spawn_px: (i32, i32),
    gates: Vec<Gate>,
}

/// Errors that can occur while decoding floor transfer strings.
#[derive(Debug)]
pub(crate) enum FloorTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded floor.
    MissingPrefix,
    /// The encoded floor did not contain a version segment.
    MissingVersion,
    /// The encoded floor did not include grid dimensions.
    MissingDimensions,
    /// The encoded floor did not include the payload segment.
    MissingPayload,
    /// The encoded floor used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded floor used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded floor.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The payload's cell buffer disagrees with the header dimensions.
    GeometryMismatch {
        /// Number of columns declared by the header.
        columns: u32,
        /// Number of rows declared by the header.
        rows: u32,
        /// Number of cells carried by the payload.
        cells: usize,
    },
    /// The payload declared a cell size that is not positive.
    InvalidCellSize(i32),
}

impl fmt::Display for FloorTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "floor payload was empty"),
            Self::MissingPrefix => write!(f, "floor string is missing the prefix"),
            Self::MissingVersion => write!(f, "floor string is missing the version"),
            Self::MissingDimensions => write!(f, "floor string is missing the grid dimensions"),
            Self::MissingPayload => write!(f, "floor string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "floor prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "floor version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse grid dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode floor payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse floor payload: {error}")
            }
            Self::GeometryMismatch {
                columns,
                rows,
                cells,
            } => {
                write!(
                    f,
                    "payload carries {cells} cells but the header declares {columns}x{rows}"
                )
            }
            Self::InvalidCellSize(cell_size) => {
                write!(f, "cell size {cell_size} must be positive")
            }
        }
    }
}

impl Error for FloorTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), FloorTransferError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| FloorTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| FloorTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| FloorTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(FloorTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((columns, rows))
}
