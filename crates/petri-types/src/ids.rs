//! Cell identifiers and the generator that hands them out.
//!
//! Ids are plain monotonic integers: the first cell created by a generator
//! is `#1`, and no id is ever handed out twice. The generator is an explicit
//! value owned by the arena, never a process-wide static.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier for a cell in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CellId(pub u64);

impl CellId {
    /// Return the inner integer value.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for CellId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CellId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The id space has been used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cell id space exhausted after #{last}")]
pub struct IdExhausted {
    /// The last id that was handed out.
    pub last: u64,
}

/// Hands out [`CellId`]s in strictly increasing order, starting at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Create a generator whose first id is `#1`.
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next id.
    ///
    /// # Errors
    ///
    /// Returns [`IdExhausted`] once `u64::MAX` has been issued; ids are never
    /// recycled.
    pub fn next_id(&mut self) -> Result<CellId, IdExhausted> {
        let id = self.next;
        self.next = id.checked_add(1).ok_or(IdExhausted { last: id })?;
        Ok(CellId(id))
    }

    /// Peek at the id the next call to [`next_id`](Self::next_id) returns.
    pub const fn peek(&self) -> CellId {
        CellId(self.next)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_id_is_one() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id().unwrap(), CellId(1));
        assert_eq!(ids.next_id().unwrap(), CellId(2));
        assert_eq!(ids.peek(), CellId(3));
    }

    #[test]
    fn exhausted_generator_refuses_to_wrap() {
        let mut ids = IdGenerator { next: u64::MAX };
        assert!(ids.next_id().is_err());
        // Still refuses; nothing was reused.
        assert!(ids.next_id().is_err());
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(CellId(42).to_string(), "42");
    }
}
