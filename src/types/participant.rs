//! Participant-related types for the Rust Settlement Engine

use std::fmt;

/// Participant identifier
///
/// Dense, allocated in registration order starting at 0.
pub type ParticipantId = u32;

/// A person sharing the expenses
///
/// Created once per distinct name and never deleted. The name is immutable
/// once assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// The participant ID
    pub id: ParticipantId,

    /// The name used in the operation log
    pub name: String,
}

impl Participant {
    /// Create a new participant
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Participant {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
