use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drumyard_core::{DomainError, DrumId, Entity, GridId};

use crate::grid::Grid;
use crate::ledger::{Direction, PendingHistory, PendingTransaction};

/// Placement state of a drum.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrumStatus {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl DrumStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrumStatus::In => "IN",
            DrumStatus::Out => "OUT",
        }
    }
}

impl core::fmt::Display for DrumStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for DrumStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(DrumStatus::In),
            "OUT" => Ok(DrumStatus::Out),
            other => Err(DomainError::validation(format!("unknown drum status '{other}'"))),
        }
    }
}

/// A tracked drum.
///
/// `current_grid` is `Some` exactly when `status` is `In`. Transitions never
/// mutate a drum in place: [`register`], [`Drum::place`] and
/// [`Drum::retrieve`] return the next state for the store to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drum {
    id: DrumId,
    order_ref: String,
    material_ref: String,
    status: DrumStatus,
    current_grid: Option<GridId>,
    last_updated: DateTime<Utc>,
}

impl Drum {
    /// Rebuild a drum from stored columns, checking the status/grid pairing.
    pub fn from_parts(
        id: DrumId,
        order_ref: String,
        material_ref: String,
        status: DrumStatus,
        current_grid: Option<GridId>,
        last_updated: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        match (status, &current_grid) {
            (DrumStatus::In, Some(_)) | (DrumStatus::Out, None) => Ok(Self {
                id,
                order_ref,
                material_ref,
                status,
                current_grid,
                last_updated,
            }),
            (DrumStatus::In, None) => Err(DomainError::invariant(format!(
                "drum {id} is IN without a grid"
            ))),
            (DrumStatus::Out, Some(g)) => Err(DomainError::invariant(format!(
                "drum {id} is OUT but still references grid {g}"
            ))),
        }
    }

    pub fn id_typed(&self) -> &DrumId {
        &self.id
    }

    pub fn order_ref(&self) -> &str {
        &self.order_ref
    }

    pub fn material_ref(&self) -> &str {
        &self.material_ref
    }

    pub fn status(&self) -> DrumStatus {
        self.status
    }

    pub fn current_grid(&self) -> Option<&GridId> {
        self.current_grid.as_ref()
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn is_placed(&self) -> bool {
        self.status == DrumStatus::In
    }

    /// IN transition: put this drum into `grid`.
    pub fn place(&self, grid: &Grid, now: DateTime<Utc>) -> Result<Placement, DomainError> {
        if self.is_placed() {
            return Err(DomainError::DrumAlreadyPlaced(self.id.clone()));
        }
        let grid = grid.occupy(&self.id)?;

        let drum = Drum {
            status: DrumStatus::In,
            current_grid: Some(grid.id_typed().clone()),
            last_updated: now,
            ..self.clone()
        };

        let transaction = PendingTransaction {
            drum_id: self.id.clone(),
            grid_id: grid.id_typed().clone(),
            direction: Direction::In,
            timestamp: now,
        };

        Ok(Placement {
            drum,
            grid,
            transaction,
        })
    }

    /// OUT transition: vacate `grid` and clear the order context.
    ///
    /// The returned history entry holds the context as it was before clearing.
    pub fn retrieve(&self, grid: &Grid, now: DateTime<Utc>) -> Result<Retrieval, DomainError> {
        let Some(current) = self.current_grid.as_ref() else {
            return Err(DomainError::DrumNotPlaced(self.id.clone()));
        };
        if current != grid.id_typed() {
            return Err(DomainError::invariant(format!(
                "drum {} is in grid {current}, not {}",
                self.id,
                grid.id_typed()
            )));
        }
        let freed = grid.vacate(&self.id)?;

        let history = PendingHistory {
            drum_id: self.id.clone(),
            order_ref: self.order_ref.clone(),
            material_ref: self.material_ref.clone(),
            grid_id: current.clone(),
            timestamp: now,
        };

        let drum = Drum {
            id: self.id.clone(),
            order_ref: String::new(),
            material_ref: String::new(),
            status: DrumStatus::Out,
            current_grid: None,
            last_updated: now,
        };

        let transaction = PendingTransaction {
            drum_id: self.id.clone(),
            grid_id: current.clone(),
            direction: Direction::Out,
            timestamp: now,
        };

        Ok(Retrieval {
            history,
            drum,
            grid: freed,
            transaction,
        })
    }
}

impl Entity for Drum {
    type Id = DrumId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Result of looking a drum up by id before registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrumLookup {
    Found(Drum),
    NotFound(DrumId),
}

impl DrumLookup {
    pub fn from_option(id: &DrumId, drum: Option<Drum>) -> Self {
        match drum {
            Some(d) => DrumLookup::Found(d),
            None => DrumLookup::NotFound(id.clone()),
        }
    }
}

/// Outcome of [`register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// First sighting of this drum id.
    Created(Drum),
    /// Existing OUT drum re-staged with new order/material context.
    Restaged(Drum),
}

impl Registration {
    pub fn drum(&self) -> &Drum {
        match self {
            Registration::Created(d) | Registration::Restaged(d) => d,
        }
    }

    pub fn into_drum(self) -> Drum {
        match self {
            Registration::Created(d) | Registration::Restaged(d) => d,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Registration::Created(_))
    }
}

/// Register a new drum or re-stage an OUT one ahead of placement.
///
/// A drum that is currently IN is rejected: overwriting it would drop its grid
/// link while the grid still lists it as occupant.
pub fn register(
    lookup: DrumLookup,
    order_ref: &str,
    material_ref: &str,
    now: DateTime<Utc>,
) -> Result<Registration, DomainError> {
    match lookup {
        DrumLookup::NotFound(id) => Ok(Registration::Created(Drum {
            id,
            order_ref: order_ref.to_string(),
            material_ref: material_ref.to_string(),
            status: DrumStatus::Out,
            current_grid: None,
            last_updated: now,
        })),
        DrumLookup::Found(drum) if drum.is_placed() => Err(DomainError::DrumAlreadyPlaced(drum.id)),
        DrumLookup::Found(drum) => Ok(Registration::Restaged(Drum {
            order_ref: order_ref.to_string(),
            material_ref: material_ref.to_string(),
            last_updated: now,
            ..drum
        })),
    }
}

/// Next state produced by [`Drum::place`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub drum: Drum,
    pub grid: Grid,
    pub transaction: PendingTransaction,
}

/// Next state produced by [`Drum::retrieve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieval {
    /// Written first, before the drum is cleared.
    pub history: PendingHistory,
    pub drum: Drum,
    pub grid: Grid,
    pub transaction: PendingTransaction,
}
