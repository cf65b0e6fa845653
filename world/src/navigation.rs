//! Distance-to-exit field maintained by the world.

use std::collections::VecDeque;

use tower_defence_core::{CellCoord, GridSize, NavigationFieldView, UNREACHABLE};

/// Dense hop-count grid seeded from the map exit.
///
/// Distances are produced by a reverse breadth-first search over the four
/// axis-aligned neighbours. Walls, towers and cells cut off from the exit keep
/// the [`UNREACHABLE`] sentinel so callers can tell them apart from open
/// tiles.
#[derive(Clone, Debug)]
pub(crate) struct PathField {
    grid: GridSize,
    exit: CellCoord,
    distances: Vec<u32>,
}

impl PathField {
    /// Creates a field for the grid with every cell unreachable.
    pub(crate) fn new(grid: GridSize, exit: CellCoord) -> Self {
        Self {
            grid,
            exit,
            distances: vec![UNREACHABLE; grid.cell_count()],
        }
    }

    /// Recomputes every distance from scratch.
    pub(crate) fn recompute<F>(&mut self, mut is_blocked: F)
    where
        F: FnMut(CellCoord) -> bool,
    {
        self.distances.fill(UNREACHABLE);

        let Some(exit_index) = self.grid.index(self.exit) else {
            return;
        };
        if is_blocked(self.exit) {
            return;
        }

        self.distances[exit_index] = 0;
        let mut queue = VecDeque::from([self.exit]);

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = self.grid.index(cell) else {
                continue;
            };
            let next_distance = self.distances[current_index].saturating_add(1);

            for neighbor in self.grid.neighbors(cell) {
                if is_blocked(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = self.grid.index(neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Hop count from the cell to the exit.
    #[must_use]
    pub(crate) fn distance(&self, cell: CellCoord) -> u32 {
        self.grid
            .index(cell)
            .and_then(|index| self.distances.get(index).copied())
            .unwrap_or(UNREACHABLE)
    }

    /// Reports whether the cell has a route to the exit.
    #[must_use]
    pub(crate) fn is_reachable(&self, cell: CellCoord) -> bool {
        self.distance(cell) != UNREACHABLE
    }

    /// Borrowed view handed to systems.
    #[must_use]
    pub(crate) fn view(&self) -> NavigationFieldView<'_> {
        NavigationFieldView::new(self.grid, self.exit, &self.distances)
    }
}
