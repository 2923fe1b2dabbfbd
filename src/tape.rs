use crate::config::{EdgePolicy, MachineConfig};
use crate::error::Fault;

/// Largest tape, in cells, that [`EdgePolicy::Grow`] will extend to.
pub const GROW_LIMIT: usize = 1 << 24;

/// The machine's data memory and data pointer.
///
/// Cells are stored as `i64` and kept inside the configured range: a value
/// written out of range either wraps modulo `2^cell_width` or faults,
/// depending on `wrap_cell`. Pointer moves follow the configured
/// [`EdgePolicy`].
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<i64>,
    ptr: usize,
    min: i64,
    max: i64,
    wrap_cell: bool,
    edge: EdgePolicy,
}

impl Tape {
    /// A zero-filled tape for `config`. The config must be valid.
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            cells: vec![0; config.tape_size],
            ptr: 0,
            min: config.cell_min(),
            max: config.cell_max(),
            wrap_cell: config.wrap_cell,
            edge: config.edge,
        }
    }

    /// Zero every cell, shrink back to `size` cells and home the pointer.
    pub fn reset(&mut self, size: usize) {
        self.cells.clear();
        self.cells.resize(size, 0);
        self.ptr = 0;
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The data pointer.
    pub fn ptr(&self) -> usize {
        self.ptr
    }

    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    /// Value under the pointer.
    pub fn get(&self) -> i64 {
        self.cells[self.ptr]
    }

    /// Value at an absolute index, `None` past the end.
    pub fn get_at(&self, index: usize) -> Option<i64> {
        self.cells.get(index).copied()
    }

    /// Store `value` under the pointer, applying the cell policy.
    pub fn set(&mut self, value: i64) -> Result<(), Fault> {
        let value = self.fit(value)?;
        self.cells[self.ptr] = value;
        Ok(())
    }

    /// Store `value` at an absolute index, growing the tape if the edge
    /// policy allows it.
    pub fn set_at(&mut self, index: usize, value: i64) -> Result<(), Fault> {
        let value = self.fit(value)?;
        if index >= self.cells.len() {
            if self.edge != EdgePolicy::Grow {
                return Err(Fault::PointerOutOfRange {
                    target: index as i64,
                    len: self.cells.len(),
                });
            }
            self.grow_to(index)?;
        }
        self.cells[index] = value;
        Ok(())
    }

    /// Add `delta` to the value under the pointer.
    pub fn add(&mut self, delta: i64) -> Result<(), Fault> {
        self.set(self.get() + delta)
    }

    /// Move the pointer by `delta` cells.
    pub fn shift(&mut self, delta: i64) -> Result<(), Fault> {
        self.seek(self.ptr as i64 + delta)
    }

    /// Move the pointer to `target`, applying the edge policy.
    pub fn seek(&mut self, target: i64) -> Result<(), Fault> {
        let len = self.cells.len();
        if (0..len as i64).contains(&target) {
            self.ptr = target as usize;
            return Ok(());
        }
        match self.edge {
            EdgePolicy::Error => Err(Fault::PointerOutOfRange { target, len }),
            EdgePolicy::Wrap => {
                self.ptr = target.rem_euclid(len as i64) as usize;
                Ok(())
            }
            EdgePolicy::Grow if target >= 0 => {
                self.grow_to(target as usize)?;
                self.ptr = target as usize;
                Ok(())
            }
            EdgePolicy::Grow => Err(Fault::PointerOutOfRange { target, len }),
        }
    }

    /// Extend the tape so `index` is in range, up to [`GROW_LIMIT`] cells.
    fn grow_to(&mut self, index: usize) -> Result<(), Fault> {
        let len = self.cells.len();
        if index >= GROW_LIMIT.max(len) {
            return Err(Fault::PointerOutOfRange {
                target: index as i64,
                len,
            });
        }
        self.cells.resize(index + 1, 0);
        Ok(())
    }

    /// Bring `value` into the cell range or fault.
    pub fn fit(&self, value: i64) -> Result<i64, Fault> {
        if (self.min..=self.max).contains(&value) {
            return Ok(value);
        }
        if self.wrap_cell {
            let span = self.max - self.min + 1;
            return Ok((value - self.min).rem_euclid(span) + self.min);
        }
        Err(Fault::CellOverflow {
            value,
            min: self.min,
            max: self.max,
        })
    }

    /// Mask of the cell width, for bitwise operations.
    pub fn mask(&self) -> i64 {
        self.max - self.min
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn wrapped_pointer_stays_in_range(moves in prop::collection::vec(-100i64..100, 0..64)) {
            let mut t = Tape::new(&MachineConfig {
                tape_size: 7,
                edge: EdgePolicy::Wrap,
                ..Default::default()
            });
            for delta in moves {
                t.shift(delta).unwrap();
                prop_assert!(t.ptr() < 7);
            }
        }

        #[test]
        fn wrapped_cells_stay_in_range(
            width in 1u32..=32,
            signed in any::<bool>(),
            deltas in prop::collection::vec(-1000i64..1000, 0..64),
        ) {
            let config = MachineConfig {
                cell_width: width,
                signed_cell: signed,
                wrap_cell: true,
                ..Default::default()
            };
            let mut t = Tape::new(&config);
            for delta in deltas {
                t.add(delta).unwrap();
                prop_assert!(t.get() >= config.cell_min() && t.get() <= config.cell_max());
            }
        }
    }
}
