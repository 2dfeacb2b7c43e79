//! Point-in-time view of all drums and grids, plus the invariant audit.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use drumyard_core::{DrumId, Entity, GridId};

use crate::drum::{Drum, DrumStatus};
use crate::grid::{Grid, GridStatus};

/// Drums and grids read together from one committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Store revision the snapshot was taken at.
    pub revision: u64,
    pub drums: Vec<Drum>,
    pub grids: Vec<Grid>,
}

/// One way the drum/grid cross references disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantBreach {
    /// Drum is IN but references a grid that does not exist.
    UnknownGrid { drum_id: DrumId, grid_id: GridId },
    /// Drum is IN but its grid lists a different (or no) occupant.
    OccupantMismatch {
        drum_id: DrumId,
        grid_id: GridId,
        occupant: Option<DrumId>,
    },
    /// Grid is Occupied but no drum references it back.
    OrphanedGrid {
        grid_id: GridId,
        occupant: Option<DrumId>,
    },
    /// More than one drum references the same grid.
    SharedGrid {
        grid_id: GridId,
        drum_ids: Vec<DrumId>,
    },
    /// Drum's status and grid link disagree.
    StatusMismatch { drum_id: DrumId, status: DrumStatus },
}

impl InventorySnapshot {
    /// Check both directions of the drum/grid link.
    ///
    /// An empty result means every Occupied grid has exactly one IN drum
    /// pointing at it, and every IN drum points at a grid that names it.
    pub fn verify(&self) -> Vec<InvariantBreach> {
        let mut breaches = Vec::new();

        let grids: HashMap<&GridId, &Grid> = self.grids.iter().map(|g| (g.id(), g)).collect();

        let mut referencing: HashMap<&GridId, Vec<DrumId>> = HashMap::new();
        for drum in &self.drums {
            match (drum.status(), drum.current_grid()) {
                (DrumStatus::In, Some(grid_id)) => {
                    referencing
                        .entry(grid_id)
                        .or_default()
                        .push(drum.id_typed().clone());
                }
                (DrumStatus::Out, None) => {}
                (status, _) => breaches.push(InvariantBreach::StatusMismatch {
                    drum_id: drum.id_typed().clone(),
                    status,
                }),
            }
        }

        for (grid_id, drum_ids) in &referencing {
            let Some(grid) = grids.get(grid_id) else {
                for drum_id in drum_ids {
                    breaches.push(InvariantBreach::UnknownGrid {
                        drum_id: drum_id.clone(),
                        grid_id: (*grid_id).clone(),
                    });
                }
                continue;
            };
            if drum_ids.len() > 1 {
                let mut ids = drum_ids.clone();
                ids.sort();
                breaches.push(InvariantBreach::SharedGrid {
                    grid_id: (*grid_id).clone(),
                    drum_ids: ids,
                });
            }
            for drum_id in drum_ids {
                if grid.occupant() != Some(drum_id) {
                    breaches.push(InvariantBreach::OccupantMismatch {
                        drum_id: drum_id.clone(),
                        grid_id: (*grid_id).clone(),
                        occupant: grid.occupant().cloned(),
                    });
                }
            }
        }

        let referenced: HashSet<&GridId> = referencing.keys().copied().collect();
        for grid in &self.grids {
            if grid.status() == GridStatus::Occupied && !referenced.contains(grid.id_typed()) {
                breaches.push(InvariantBreach::OrphanedGrid {
                    grid_id: grid.id_typed().clone(),
                    occupant: grid.occupant().cloned(),
                });
            }
        }

        breaches
    }

    pub fn is_consistent(&self) -> bool {
        self.verify().is_empty()
    }

    pub fn drum(&self, id: &DrumId) -> Option<&Drum> {
        find(&self.drums, id)
    }

    pub fn grid(&self, id: &GridId) -> Option<&Grid> {
        find(&self.grids, id)
    }

    pub fn occupied_count(&self) -> usize {
        self.grids.iter().filter(|g| !g.is_available()).count()
    }
}

fn find<'a, E: Entity>(items: &'a [E], id: &E::Id) -> Option<&'a E> {
    items.iter().find(|item| item.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drum::{DrumLookup, register};
    use crate::grid::GridLayout;
    use chrono::{DateTime, TimeZone, Utc};
    use drumyard_core::DomainError;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn drum_id(label: &str) -> DrumId {
        DrumId::new(label).unwrap()
    }

    fn grid_id(label: &str) -> GridId {
        GridId::new(label).unwrap()
    }

    /// Minimal in-process model that applies decisions the way a store would.
    #[derive(Default)]
    struct Model {
        drums: HashMap<DrumId, Drum>,
        grids: HashMap<GridId, Grid>,
    }

    impl Model {
        fn seeded() -> Self {
            let grids = GridLayout::default()
                .seed()
                .into_iter()
                .map(|g| (g.id_typed().clone(), g))
                .collect();
            Self {
                drums: HashMap::new(),
                grids,
            }
        }

        fn register(&mut self, id: &DrumId, order: &str) -> Result<(), DomainError> {
            let lookup = DrumLookup::from_option(id, self.drums.get(id).cloned());
            let drum = register(lookup, order, "M", test_time())?.into_drum();
            self.drums.insert(id.clone(), drum);
            Ok(())
        }

        fn place(&mut self, id: &DrumId, grid: &GridId) -> Result<(), DomainError> {
            let drum = self
                .drums
                .get(id)
                .ok_or_else(|| DomainError::DrumNotFound(id.clone()))?;
            let target = self
                .grids
                .get(grid)
                .ok_or_else(|| DomainError::GridUnavailable(grid.clone()))?;
            let p = drum.place(target, test_time())?;
            self.drums.insert(id.clone(), p.drum);
            self.grids.insert(grid.clone(), p.grid);
            Ok(())
        }

        fn retrieve(&mut self, id: &DrumId) -> Result<(), DomainError> {
            let drum = self
                .drums
                .get(id)
                .filter(|d| d.is_placed())
                .ok_or_else(|| DomainError::DrumNotPlaced(id.clone()))?;
            let grid_id = drum.current_grid().cloned().unwrap();
            let r = drum.retrieve(&self.grids[&grid_id], test_time())?;
            self.drums.insert(id.clone(), r.drum);
            self.grids.insert(grid_id, r.grid);
            Ok(())
        }

        fn snapshot(&self) -> InventorySnapshot {
            InventorySnapshot {
                revision: 0,
                drums: self.drums.values().cloned().collect(),
                grids: self.grids.values().cloned().collect(),
            }
        }
    }

    #[test]
    fn seeded_state_is_consistent() {
        assert!(Model::seeded().snapshot().is_consistent());
    }

    #[test]
    fn orphaned_grid_is_reported() {
        let grid = Grid::available(grid_id("A1")).occupy(&drum_id("D1")).unwrap();
        let snap = InventorySnapshot {
            revision: 1,
            drums: vec![],
            grids: vec![grid],
        };
        assert_eq!(
            snap.verify(),
            vec![InvariantBreach::OrphanedGrid {
                grid_id: grid_id("A1"),
                occupant: Some(drum_id("D1")),
            }]
        );
    }

    #[test]
    fn shared_grid_is_reported() {
        let mut model = Model::seeded();
        model.register(&drum_id("D1"), "O").unwrap();
        model.register(&drum_id("D2"), "O").unwrap();
        model.place(&drum_id("D1"), &grid_id("A1")).unwrap();

        // Forge a second drum pointing at the same slot.
        let d1 = model.drums[&drum_id("D1")].clone();
        let forged = Drum::from_parts(
            drum_id("D2"),
            "O".into(),
            "M".into(),
            DrumStatus::In,
            Some(grid_id("A1")),
            test_time(),
        )
        .unwrap();
        let snap = InventorySnapshot {
            revision: 0,
            drums: vec![d1, forged],
            grids: model.grids.values().cloned().collect(),
        };
        let breaches = snap.verify();
        assert!(breaches.iter().any(|b| matches!(b, InvariantBreach::SharedGrid { .. })));
        assert!(breaches.iter().any(|b| matches!(
            b,
            InvariantBreach::OccupantMismatch { drum_id: d, .. } if d.as_str() == "D2"
        )));
    }

    #[test]
    fn unknown_grid_is_reported() {
        let drum = Drum::from_parts(
            drum_id("D1"),
            String::new(),
            String::new(),
            DrumStatus::In,
            Some(grid_id("Z9")),
            test_time(),
        )
        .unwrap();
        let snap = InventorySnapshot {
            revision: 0,
            drums: vec![drum],
            grids: GridLayout::default().seed(),
        };
        assert!(matches!(
            snap.verify().as_slice(),
            [InvariantBreach::UnknownGrid { .. }]
        ));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Register(u8),
            Place(u8, u8),
            Retrieve(u8),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..5).prop_map(Op::Register),
                (0u8..5, 0u8..9).prop_map(|(d, g)| Op::Place(d, g)),
                (0u8..5).prop_map(Op::Retrieve),
            ]
        }

        fn nth_drum(n: u8) -> DrumId {
            drum_id(&format!("D{n:03}"))
        }

        fn nth_grid(n: u8) -> GridId {
            GridLayout::default().labels()[n as usize].clone()
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: no sequence of transitions (successful or rejected)
            /// breaks the drum/grid cross references.
            #[test]
            fn transitions_preserve_invariants(ops in proptest::collection::vec(op(), 0..60)) {
                let mut model = Model::seeded();
                for op in ops {
                    let _ = match op {
                        Op::Register(d) => model.register(&nth_drum(d), "O"),
                        Op::Place(d, g) => model.place(&nth_drum(d), &nth_grid(g)),
                        Op::Retrieve(d) => model.retrieve(&nth_drum(d)),
                    };
                    let snap = model.snapshot();
                    prop_assert!(snap.verify().is_empty(), "breaches: {:?}", snap.verify());
                }
            }

            /// Property: a rejected transition leaves the state untouched.
            #[test]
            fn rejected_transitions_change_nothing(ops in proptest::collection::vec(op(), 0..40)) {
                let mut model = Model::seeded();
                for op in ops {
                    let before = model.snapshot();
                    let result = match op {
                        Op::Register(d) => model.register(&nth_drum(d), "O"),
                        Op::Place(d, g) => model.place(&nth_drum(d), &nth_grid(g)),
                        Op::Retrieve(d) => model.retrieve(&nth_drum(d)),
                    };
                    if result.is_err() {
                        let after = model.snapshot();
                        let mut b = before.drums.clone();
                        let mut a = after.drums.clone();
                        b.sort_by(|x, y| x.id_typed().cmp(y.id_typed()));
                        a.sort_by(|x, y| x.id_typed().cmp(y.id_typed()));
                        prop_assert_eq!(b, a);
                        prop_assert_eq!(before.occupied_count(), after.occupied_count());
                    }
                }
            }
        }
    }
}
