//! The persistence seam between the SOS controller and a storage backend.

use std::sync::Mutex;

use speakup_shared::EmergencyContact;

use crate::error::{Result, StoreError};

/// Whole-list storage for emergency contacts.
///
/// The list is only ever loaded and saved in full (read-modify-write) with
/// a single writer per device, so implementations need no merge logic.
pub trait ContactRepository: Send + Sync {
    /// The persisted list in insertion order; empty if nothing was saved yet.
    fn load(&self) -> Result<Vec<EmergencyContact>>;

    /// Replace the persisted list.
    fn save(&self, contacts: &[EmergencyContact]) -> Result<()>;
}

/// Process-local repository, used in tests and by front ends that opt out
/// of persistence.
#[derive(Debug, Default)]
pub struct MemoryContactStore {
    contacts: Mutex<Vec<EmergencyContact>>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contacts(contacts: Vec<EmergencyContact>) -> Self {
        Self {
            contacts: Mutex::new(contacts),
        }
    }
}

impl ContactRepository for MemoryContactStore {
    fn load(&self) -> Result<Vec<EmergencyContact>> {
        let guard = self.contacts.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, contacts: &[EmergencyContact]) -> Result<()> {
        let mut guard = self.contacts.lock().map_err(|_| StoreError::LockPoisoned)?;
        *guard = contacts.to_vec();
        Ok(())
    }
}
