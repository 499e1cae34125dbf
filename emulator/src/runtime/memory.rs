use thiserror::Error;

use crate::constants::{Word, DEFAULT_MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The address does not designate a cell of the memory
    #[error("address {address} is out of bounds (memory size is {size})")]
    OutOfBounds { address: Word, size: usize },

    /// The initial contents do not fit in the memory
    #[error("{len} initial values do not fit in a memory of {size} cells")]
    Overflow { len: usize, size: usize },
}

/// Holds the memory cells of the machine.
///
/// The number of cells is fixed when the memory is created.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: Box<[Word]>,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory {{ size: {} }}", self.inner.len())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl Memory {
    /// Create a zero-filled memory of `size` cells
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            inner: vec![0; size].into_boxed_slice(),
        }
    }

    /// Create a memory of `size` cells, with the first cells set to `contents`
    ///
    /// # Errors
    ///
    /// It fails if `contents` has more values than the memory has cells.
    pub fn with_contents(size: usize, contents: &[Word]) -> Result<Self, MemoryError> {
        if contents.len() > size {
            return Err(MemoryError::Overflow {
                len: contents.len(),
                size,
            });
        }

        let mut memory = Self::new(size);
        memory.inner[..contents.len()].copy_from_slice(contents);
        Ok(memory)
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Check an address and turn it into a cell index
    ///
    /// # Errors
    ///
    /// It fails if the address is negative or past the last cell.
    pub fn index(&self, address: Word) -> Result<usize, MemoryError> {
        usize::try_from(address)
            .ok()
            .filter(|&index| index < self.inner.len())
            .ok_or(MemoryError::OutOfBounds {
                address,
                size: self.inner.len(),
            })
    }

    /// Read a cell from an index previously checked by [`Memory::index`]
    pub(crate) fn cell(&self, index: usize) -> Word {
        self.inner[index]
    }

    /// Get the value of the cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get(&self, address: Word) -> Result<Word, MemoryError> {
        let index = self.index(address)?;
        Ok(self.inner[index])
    }

    /// Get a mutable reference to a cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get_mut(&mut self, address: Word) -> Result<&mut Word, MemoryError> {
        let index = self.index(address)?;
        Ok(&mut self.inner[index])
    }

    /// Get a mutable reference to a cell from an index previously checked by [`Memory::index`]
    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut Word {
        &mut self.inner[index]
    }

    /// View of all the cells
    #[must_use]
    pub fn cells(&self) -> &[Word] {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_contents_test() {
        let memory = Memory::with_contents(5, &[1, 2, 3]).unwrap();
        assert_eq!(memory.cells(), &[1, 2, 3, 0, 0]);
        assert_eq!(memory.len(), 5);

        assert_eq!(
            Memory::with_contents(2, &[1, 2, 3]),
            Err(MemoryError::Overflow { len: 3, size: 2 })
        );
    }

    #[test]
    fn bounds_test() {
        let mut memory = Memory::new(3);
        assert_eq!(memory.get(2), Ok(0));
        assert_eq!(
            memory.get(3),
            Err(MemoryError::OutOfBounds {
                address: 3,
                size: 3
            })
        );
        assert_eq!(
            memory.get(-1),
            Err(MemoryError::OutOfBounds {
                address: -1,
                size: 3
            })
        );

        *memory.get_mut(1).unwrap() = 42;
        assert_eq!(memory.cells(), &[0, 42, 0]);
        assert!(memory.get_mut(10).is_err());
    }
}
