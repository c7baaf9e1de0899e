//! Emergency contact persistence and list management.

use std::path::Path;
use std::sync::{Arc, Mutex};

use speakup_shared::constants::CONTACTS_STORE_KEY;
use speakup_shared::{ContactError, EmergencyContact};
use tracing::{debug, info};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::repository::ContactRepository;

// ---------------------------------------------------------------------------
// SQLite-backed repository
// ---------------------------------------------------------------------------

/// Stores the contact list as a JSON array under [`CONTACTS_STORE_KEY`].
pub struct SqliteContactStore {
    db: Mutex<Database>,
}

impl SqliteContactStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open the platform default database.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Database::new()?))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }
}

impl ContactRepository for SqliteContactStore {
    fn load(&self) -> Result<Vec<EmergencyContact>> {
        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        match db.get_value(CONTACTS_STORE_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, contacts: &[EmergencyContact]) -> Result<()> {
        let json = serde_json::to_string(contacts)?;
        let db = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        db.put_value(CONTACTS_STORE_KEY, &json)?;
        debug!(count = contacts.len(), "contacts saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Contact book
// ---------------------------------------------------------------------------

/// Add/remove/list operations over a [`ContactRepository`].
///
/// Every mutation loads the full list, edits it and saves it back.
#[derive(Clone)]
pub struct ContactBook {
    repo: Arc<dyn ContactRepository>,
}

impl ContactBook {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> Result<Vec<EmergencyContact>> {
        self.repo.load()
    }

    /// Validate and append a contact. A second contact with the same email
    /// (case-insensitive) is rejected so nobody receives the alert twice.
    pub fn add(&self, name: &str, email: &str) -> Result<EmergencyContact> {
        let contact = EmergencyContact::new(name, email)?;

        let mut contacts = self.repo.load()?;
        let key = contact.normalized_email();
        if contacts.iter().any(|c| c.normalized_email() == key) {
            return Err(ContactError::Duplicate(contact.email).into());
        }

        contacts.push(contact.clone());
        self.repo.save(&contacts)?;

        info!(count = contacts.len(), "emergency contact added");
        Ok(contact)
    }

    /// Remove the contact at `index` (zero-based display position).
    pub fn remove(&self, index: usize) -> Result<EmergencyContact> {
        let mut contacts = self.repo.load()?;
        if index >= contacts.len() {
            return Err(ContactError::OutOfRange {
                index,
                len: contacts.len(),
            }
            .into());
        }

        let removed = contacts.remove(index);
        self.repo.save(&contacts)?;

        info!(count = contacts.len(), "emergency contact removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryContactStore;

    fn contact(name: &str, email: &str) -> EmergencyContact {
        EmergencyContact::new(name, email).unwrap()
    }

    fn sqlite_book() -> (ContactBook, Arc<SqliteContactStore>) {
        let store = Arc::new(SqliteContactStore::new(Database::open_in_memory().unwrap()));
        (ContactBook::new(store.clone()), store)
    }

    #[test]
    fn empty_store_loads_empty_list() {
        let (book, _) = sqlite_book();
        assert!(book.list().unwrap().is_empty());
    }

    #[test]
    fn add_preserves_insertion_order() {
        let (book, _) = sqlite_book();
        book.add("Alex", "alex@example.com").unwrap();
        book.add("Sam", "sam@example.com").unwrap();
        book.add("Jo", "jo@example.com").unwrap();

        let names: Vec<_> = book.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Alex", "Sam", "Jo"]);
    }

    #[test]
    fn add_then_remove_restores_prior_list() {
        let (book, store) = sqlite_book();
        book.add("Alex", "alex@example.com").unwrap();
        book.add("Sam", "sam@example.com").unwrap();
        let before = store.load().unwrap();

        book.add("Jo", "jo@example.com").unwrap();
        let removed = book.remove(2).unwrap();

        assert_eq!(removed, contact("Jo", "jo@example.com"));
        assert_eq!(store.load().unwrap(), before);
    }

    #[test]
    fn remove_from_the_middle() {
        let (book, _) = sqlite_book();
        book.add("Alex", "alex@example.com").unwrap();
        book.add("Sam", "sam@example.com").unwrap();
        book.add("Jo", "jo@example.com").unwrap();

        book.remove(1).unwrap();
        assert_eq!(
            book.list().unwrap(),
            vec![contact("Alex", "alex@example.com"), contact("Jo", "jo@example.com")]
        );
    }

    #[test]
    fn remove_out_of_range() {
        let (book, _) = sqlite_book();
        book.add("Alex", "alex@example.com").unwrap();

        let err = book.remove(3).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Contact(ContactError::OutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (book, _) = sqlite_book();
        book.add("Alex", "alex@example.com").unwrap();

        let err = book.add("Alex again", "ALEX@example.com").unwrap_err();
        assert!(matches!(err, StoreError::Contact(ContactError::Duplicate(_))));
        assert_eq!(book.list().unwrap().len(), 1);
    }

    #[test]
    fn invalid_contact_is_not_saved() {
        let book = ContactBook::new(Arc::new(MemoryContactStore::new()));
        assert!(book.add("Alex", "not-an-email").is_err());
        assert!(book.list().unwrap().is_empty());
    }

    #[test]
    fn contacts_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.db");

        {
            let book = ContactBook::new(Arc::new(SqliteContactStore::open_at(&path).unwrap()));
            book.add("Alex", "alex@example.com").unwrap();
        }

        let store = SqliteContactStore::open_at(&path).unwrap();
        assert_eq!(store.load().unwrap(), vec![contact("Alex", "alex@example.com")]);
    }

    #[test]
    fn corrupt_blob_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.put_value(CONTACTS_STORE_KEY, "{not json").unwrap();
        let store = SqliteContactStore::new(db);

        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }
}
