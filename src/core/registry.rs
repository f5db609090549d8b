//! Identity registry
//!
//! Bijection between participant names and dense integer ids. Ids are
//! allocated in registration order starting at 0 and never reused.

use crate::types::{Participant, ParticipantId, SettlementError};
use std::collections::HashMap;

/// Name to id registry
pub struct IdentityRegistry {
    /// Map of names to ids
    ids: HashMap<String, ParticipantId>,

    /// Participants indexed by id
    participants: Vec<Participant>,
}

impl IdentityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        IdentityRegistry {
            ids: HashMap::new(),
            participants: Vec::new(),
        }
    }

    /// Register a new name
    ///
    /// # Arguments
    ///
    /// * `name` - The participant name, as written in the log
    ///
    /// # Returns
    ///
    /// * `Ok(ParticipantId)` - The newly allocated id
    /// * `Err(SettlementError)` - If the name is already registered or the id space is exhausted
    pub fn insert(&mut self, name: &str) -> Result<ParticipantId, SettlementError> {
        if self.ids.contains_key(name) {
            return Err(SettlementError::duplicate_participant(name));
        }

        let id = ParticipantId::try_from(self.participants.len())
            .map_err(|_| SettlementError::overflow("participant id allocation"))?;

        self.ids.insert(name.to_string(), id);
        self.participants.push(Participant::new(id, name));
        tracing::debug!(name, id, "registered participant");

        Ok(id)
    }

    /// Look up the id registered for a name
    pub fn find(&self, name: &str) -> Option<ParticipantId> {
        self.ids.get(name).copied()
    }

    /// Look up a name, registering it if unseen
    pub fn find_or_insert(&mut self, name: &str) -> Result<ParticipantId, SettlementError> {
        match self.find(name) {
            Some(id) => Ok(id),
            None => self.insert(name),
        }
    }

    /// Name registered for an id
    ///
    /// # Returns
    ///
    /// * `Ok(&str)` - The participant's name
    /// * `Err(SettlementError::UnknownParticipantId)` - If the id was never allocated
    pub fn resolve(&self, id: ParticipantId) -> Result<&str, SettlementError> {
        self.participants
            .get(id as usize)
            .map(|participant| participant.name.as_str())
            .ok_or(SettlementError::UnknownParticipantId { id })
    }

    /// Resolve a reference that may be a name or a numeric id
    ///
    /// The name lookup wins; a numeric token is only treated as an id when no
    /// participant has that literal name.
    pub fn lookup(&self, reference: &str) -> Result<ParticipantId, SettlementError> {
        if let Some(id) = self.find(reference) {
            return Ok(id);
        }

        match reference.parse::<ParticipantId>() {
            Ok(id) if (id as usize) < self.participants.len() => Ok(id),
            Ok(id) => Err(SettlementError::UnknownParticipantId { id }),
            Err(_) => Err(SettlementError::unknown_participant(reference)),
        }
    }

    /// All registered participants in id order
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Number of registered participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether nobody has been registered yet
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
