use serde::{Deserialize, Serialize};

use drumyard_core::{DomainError, DrumId, Entity, GridId};

/// Occupancy state of a grid slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridStatus {
    Available,
    Occupied,
}

impl GridStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridStatus::Available => "Available",
            GridStatus::Occupied => "Occupied",
        }
    }
}

impl core::fmt::Display for GridStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for GridStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(GridStatus::Available),
            "Occupied" => Ok(GridStatus::Occupied),
            other => Err(DomainError::validation(format!("unknown grid status '{other}'"))),
        }
    }
}

/// A fixed storage slot.
///
/// `occupant` is `Some` exactly when `status` is `Occupied`. The only way to
/// change a grid is through [`Grid::occupy`] and [`Grid::vacate`], which keep
/// the two fields in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    id: GridId,
    status: GridStatus,
    occupant: Option<DrumId>,
}

impl Grid {
    /// A freshly seeded, empty slot.
    pub fn available(id: GridId) -> Self {
        Self {
            id,
            status: GridStatus::Available,
            occupant: None,
        }
    }

    /// Rebuild a grid from stored columns, checking the status/occupant pairing.
    pub fn from_parts(
        id: GridId,
        status: GridStatus,
        occupant: Option<DrumId>,
    ) -> Result<Self, DomainError> {
        match (status, &occupant) {
            (GridStatus::Available, None) | (GridStatus::Occupied, Some(_)) => Ok(Self {
                id,
                status,
                occupant,
            }),
            (GridStatus::Available, Some(d)) => Err(DomainError::invariant(format!(
                "grid {id} is Available but lists occupant {d}"
            ))),
            (GridStatus::Occupied, None) => Err(DomainError::invariant(format!(
                "grid {id} is Occupied without an occupant"
            ))),
        }
    }

    pub fn id_typed(&self) -> &GridId {
        &self.id
    }

    pub fn status(&self) -> GridStatus {
        self.status
    }

    pub fn occupant(&self) -> Option<&DrumId> {
        self.occupant.as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.status == GridStatus::Available
    }

    /// Mark the slot as holding `drum`.
    pub fn occupy(&self, drum: &DrumId) -> Result<Grid, DomainError> {
        if !self.is_available() {
            return Err(DomainError::GridUnavailable(self.id.clone()));
        }
        Ok(Grid {
            id: self.id.clone(),
            status: GridStatus::Occupied,
            occupant: Some(drum.clone()),
        })
    }

    /// Free the slot currently holding `drum`.
    pub fn vacate(&self, drum: &DrumId) -> Result<Grid, DomainError> {
        if self.occupant.as_ref() != Some(drum) {
            return Err(DomainError::invariant(format!(
                "grid {} is not held by drum {drum}",
                self.id
            )));
        }
        Ok(Grid::available(self.id.clone()))
    }
}

impl Entity for Grid {
    type Id = GridId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Fixed set of grid labels: every row label combined with columns `1..=columns`.
///
/// Only built through [`GridLayout::new`] or `Default`, so rows are unique
/// upper-case letters and there is at least one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    rows: Vec<char>,
    columns: u16,
}

impl GridLayout {
    pub fn new(rows: impl IntoIterator<Item = char>, columns: u16) -> Result<Self, DomainError> {
        let mut seen = Vec::new();
        for row in rows {
            if !row.is_ascii_alphabetic() {
                return Err(DomainError::validation(format!(
                    "grid row label {row:?} must be an ASCII letter"
                )));
            }
            let row = row.to_ascii_uppercase();
            if seen.contains(&row) {
                return Err(DomainError::validation(format!("duplicate grid row {row}")));
            }
            seen.push(row);
        }
        if seen.is_empty() {
            return Err(DomainError::validation("grid layout needs at least one row"));
        }
        if columns == 0 {
            return Err(DomainError::validation("grid layout needs at least one column"));
        }
        Ok(Self {
            rows: seen,
            columns,
        })
    }

    pub fn rows(&self) -> &[char] {
        &self.rows
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len() * self.columns as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot labels in row-major order (`A1, A2, .., B1, ..`).
    pub fn labels(&self) -> Vec<GridId> {
        self.rows
            .iter()
            .flat_map(|row| {
                (1..=self.columns).map(move |col| GridId::new(format!("{row}{col}")))
            })
            .filter_map(Result::ok)
            .collect()
    }

    /// All slots in their initial, empty state.
    pub fn seed(&self) -> Vec<Grid> {
        self.labels().into_iter().map(Grid::available).collect()
    }
}

impl Default for GridLayout {
    /// The 3×3 warehouse: `A1..C3`.
    fn default() -> Self {
        Self {
            rows: vec!['A', 'B', 'C'],
            columns: 3,
        }
    }
}
