use std::str::FromStr;

use thiserror::Error;
use tower_defence_core::{CellCoord, ParseKindError, TowerKind};

/// Delimiter between the tower kind and the cell.
const KIND_DELIMITER: char = '@';
/// Delimiter between the column and the row.
const CELL_DELIMITER: char = ',';

/// Tower to build before the first wave, parsed from `kind@column,row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TowerPlacement {
    /// Kind of tower to build.
    pub(crate) kind: TowerKind,
    /// Cell the tower occupies.
    pub(crate) cell: CellCoord,
}

impl FromStr for TowerPlacement {
    type Err = PlacementArgError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PlacementArgError::Empty);
        }

        let (kind, cell) = trimmed
            .split_once(KIND_DELIMITER)
            .ok_or_else(|| PlacementArgError::MissingCell(trimmed.to_owned()))?;

        Ok(Self {
            kind: kind.parse()?,
            cell: parse_cell(cell)?,
        })
    }
}

/// Errors that can occur while parsing a placement argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum PlacementArgError {
    /// The argument was empty or contained only whitespace.
    #[error("tower placement is empty")]
    Empty,
    /// The argument has no `@` separating kind and cell.
    #[error("tower placement '{0}' is missing '@column,row'")]
    MissingCell(String),
    /// The kind segment names no tower.
    #[error(transparent)]
    Kind(#[from] ParseKindError),
    /// The cell segment is not two unsigned integers.
    #[error("could not parse cell '{0}', expected column,row")]
    InvalidCell(String),
}

fn parse_cell(cell: &str) -> Result<CellCoord, PlacementArgError> {
    let invalid = || PlacementArgError::InvalidCell(cell.to_owned());
    let (column, row) = cell.split_once(CELL_DELIMITER).ok_or_else(invalid)?;

    let column = column.trim().parse::<u32>().map_err(|_| invalid())?;
    let row = row.trim().parse::<u32>().map_err(|_| invalid())?;

    Ok(CellCoord::new(column, row))
}
