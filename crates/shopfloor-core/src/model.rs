//! Data models for machine identity, position and live status
//!
//! This module provides:
//! - The canonical per-machine record schema (one versioned schema; earlier
//!   revisions of the fleet format lacked the address field or the roster
//!   flag — the superset here is canonical and absent fields default)
//! - 3-axis position tracking in millimeters
//! - The jog axis set

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of machine slots in the state table. Machine ids are `1..=MACHINE_SLOTS`.
pub const MACHINE_SLOTS: usize = 10;

/// A jog axis on the controlled machines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// The single-letter designator used on the wire
    pub fn letter(&self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl std::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Axis::X),
            "Y" | "y" => Ok(Axis::Y),
            "Z" | "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis: {other}")),
        }
    }
}

/// Position in 3D machine space, millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Y:{:.3} Z:{:.3}", self.x, self.y, self.z)
    }
}

/// Live record for one machine slot
///
/// Owned exclusively by the [`StateStore`](crate::store::StateStore); mutated
/// only through its update operations. Command effects reach this record only
/// by round-tripping through the machine's own status reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineRecord {
    /// Stable machine identity, `1..=MACHINE_SLOTS`
    pub id: usize,
    /// Short state text as reported by the machine, e.g. "IDLE", "WORKING", "ERROR"
    pub state_label: String,
    /// Network address of the machine's control endpoint, set once discovered
    pub network_address: Option<String>,
    /// Last reported machine position
    pub position: Position,
    /// Whether this id has ever been observed on the bus. Transitions
    /// false -> true exactly once and never reverts.
    pub active: bool,
}

impl MachineRecord {
    /// Create an empty, never-observed record for the given slot
    pub fn empty(id: usize) -> Self {
        Self {
            id,
            state_label: String::new(),
            network_address: None,
            position: Position::default(),
            active: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_letter_and_parse() {
        assert_eq!(Axis::X.letter(), 'X');
        assert_eq!("z".parse::<Axis>().unwrap(), Axis::Z);
        assert!("w".parse::<Axis>().is_err());
    }

    #[test]
    fn test_empty_record() {
        let rec = MachineRecord::empty(3);
        assert_eq!(rec.id, 3);
        assert!(!rec.active);
        assert!(rec.network_address.is_none());
        assert_eq!(rec.position, Position::default());
    }
}
