//! Shipment storage.
//!
//! [`ShipmentRepository`] is the only seam lifecycle code writes through.
//! Two implementations ship with the crate: an in-memory table and a
//! JSON-file-backed table that persists after every mutation.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::request::PrincipalId;
use crate::shipment::{NewShipment, Shipment, ShipmentId, ShipmentStatus};

/// Persistence for shipment records.
///
/// Ids are assigned by the repository, start at 1 and are never reused.
/// Listings are ordered by ascending id.
pub trait ShipmentRepository: Send + Sync {
    /// Stores a new shipment and returns it with its assigned id.
    fn insert(&self, new: NewShipment) -> Result<Shipment, StorageError>;

    /// Looks up one shipment.
    fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>, StorageError>;

    /// Lists shipments owned by `owner`.
    fn find_by_owner(&self, owner: PrincipalId) -> Result<Vec<Shipment>, StorageError>;

    /// Lists every shipment.
    fn find_all(&self) -> Result<Vec<Shipment>, StorageError>;

    /// Sets the status of `id` and refreshes its `updated_at`, reading the
    /// previous status in the same step.
    ///
    /// Returns `Ok(None)` if no such shipment exists.
    fn update_status(
        &self,
        id: ShipmentId,
        status: ShipmentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, StorageError>;
}

/// Outcome of a status write.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    /// Status the record held right before the write
    pub previous: ShipmentStatus,
    /// The record after the write
    pub shipment: Shipment,
}

/// Table contents shared by both implementations; also the on-disk format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ShipmentTable {
    last_id: u64,
    shipments: Vec<Shipment>,
}

impl ShipmentTable {
    fn insert(&mut self, new: NewShipment) -> Shipment {
        self.last_id += 1;
        let shipment = new.into_shipment(ShipmentId::new(self.last_id));
        self.shipments.push(shipment.clone());
        shipment
    }

    fn find(&self, id: ShipmentId) -> Option<&Shipment> {
        // Kept sorted: ids are appended in increasing order.
        self.shipments
            .binary_search_by_key(&id, Shipment::id)
            .ok()
            .map(|i| &self.shipments[i])
    }

    fn owned_by(&self, owner: PrincipalId) -> Vec<Shipment> {
        self.shipments
            .iter()
            .filter(|s| s.is_owned_by(owner))
            .cloned()
            .collect()
    }

    fn set_status(
        &mut self,
        id: ShipmentId,
        status: ShipmentStatus,
        at: DateTime<Utc>,
    ) -> Option<StatusChange> {
        let index = self
            .shipments
            .binary_search_by_key(&id, Shipment::id)
            .ok()?;
        let shipment = &mut self.shipments[index];
        let previous = shipment.status();
        shipment.set_status(status, at);
        Some(StatusChange {
            previous,
            shipment: shipment.clone(),
        })
    }

    /// Checks a loaded table: ids strictly increasing, and `last_id` moved
    /// past every stored id so none is handed out twice.
    fn reconcile(&mut self) -> Result<(), String> {
        if let Some(pair) = self
            .shipments
            .windows(2)
            .find(|pair| pair[0].id() >= pair[1].id())
        {
            return Err(format!(
                "shipment ids out of order: {} before {}",
                pair[0].id(),
                pair[1].id()
            ));
        }

        if let Some(max) = self.shipments.last().map(|s| s.id().get()) {
            if self.last_id < max {
                tracing::warn!(last_id = self.last_id, max_id = max, "raising stale last_id");
                self.last_id = max;
            }
        }
        Ok(())
    }
}

/// Shipments held in process memory.
///
/// # Examples
///
/// ```
/// use shipment_core::{InMemoryShipmentRepository, ShipmentRepository};
///
/// let repo = InMemoryShipmentRepository::new();
/// assert!(repo.find_all().unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryShipmentRepository {
    table: RwLock<ShipmentTable>,
}

impl InMemoryShipmentRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShipmentRepository for InMemoryShipmentRepository {
    fn insert(&self, new: NewShipment) -> Result<Shipment, StorageError> {
        Ok(self.table.write().insert(new))
    }

    fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>, StorageError> {
        Ok(self.table.read().find(id).cloned())
    }

    fn find_by_owner(&self, owner: PrincipalId) -> Result<Vec<Shipment>, StorageError> {
        Ok(self.table.read().owned_by(owner))
    }

    fn find_all(&self) -> Result<Vec<Shipment>, StorageError> {
        Ok(self.table.read().shipments.clone())
    }

    fn update_status(
        &self,
        id: ShipmentId,
        status: ShipmentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, StorageError> {
        Ok(self.table.write().set_status(id, status, at))
    }
}

/// Shipments persisted to a single JSON file.
///
/// Every mutation rewrites the file through a synced sibling temporary file
/// and a rename, under one lock, so a failed write leaves both the file and
/// the in-memory table unchanged.
#[derive(Debug)]
pub struct JsonFileShipmentRepository {
    path: PathBuf,
    table: Mutex<ShipmentTable>,
}

impl JsonFileShipmentRepository {
    /// Opens the repository at `path`, loading existing records if the file
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the file exists but cannot be read or
    /// parsed, or holds duplicate or unordered shipment ids.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let table = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| {
                StorageError::with_source(format!("reading {}", path.display()), e)
            })?;
            let mut table: ShipmentTable = serde_json::from_str(&raw).map_err(|e| {
                StorageError::with_source(format!("parsing {}", path.display()), e)
            })?;
            table.reconcile().map_err(|reason| {
                StorageError::new(format!("loading {}: {}", path.display(), reason))
            })?;
            table
        } else {
            ShipmentTable::default()
        };

        tracing::debug!(path = %path.display(), "opened shipment store");
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, table: &ShipmentTable) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::with_source(format!("creating {}", parent.display()), e)
            })?;
        }

        let json = serde_json::to_string_pretty(table)
            .map_err(|e| StorageError::with_source("encoding shipments", e))?;

        let tmp = self.path.with_extension("json.tmp");
        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        written.map_err(|e| StorageError::with_source(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StorageError::with_source(format!("replacing {}", self.path.display()), e)
        })
    }

    /// Applies `f` to a copy of the table and commits it only if the copy
    /// was saved.
    fn mutate<T>(&self, f: impl FnOnce(&mut ShipmentTable) -> T) -> Result<T, StorageError> {
        let mut guard = self.table.lock();
        let mut next = guard.clone();
        let out = f(&mut next);
        self.save(&next)?;
        *guard = next;
        Ok(out)
    }
}

impl ShipmentRepository for JsonFileShipmentRepository {
    fn insert(&self, new: NewShipment) -> Result<Shipment, StorageError> {
        self.mutate(|table| table.insert(new))
    }

    fn find_by_id(&self, id: ShipmentId) -> Result<Option<Shipment>, StorageError> {
        Ok(self.table.lock().find(id).cloned())
    }

    fn find_by_owner(&self, owner: PrincipalId) -> Result<Vec<Shipment>, StorageError> {
        Ok(self.table.lock().owned_by(owner))
    }

    fn find_all(&self) -> Result<Vec<Shipment>, StorageError> {
        Ok(self.table.lock().shipments.clone())
    }

    fn update_status(
        &self,
        id: ShipmentId,
        status: ShipmentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<StatusChange>, StorageError> {
        // An unknown id leaves the file untouched.
        let mut guard = self.table.lock();
        if guard.find(id).is_none() {
            return Ok(None);
        }
        let mut next = guard.clone();
        let updated = next.set_status(id, status, at);
        self.save(&next)?;
        *guard = next;
        Ok(updated)
    }
}
