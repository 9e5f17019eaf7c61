//! Shipment records and their status lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InvalidStatus;
use crate::request::PrincipalId;

/// Repository-assigned shipment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(u64);

impl ShipmentId {
    /// Wraps a raw identifier.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShipmentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Lifecycle status of a shipment.
///
/// Admins may move a shipment between any two states; `delivered` is the
/// terminal state of the normal flow `pending -> in_progress -> delivered`
/// but is not locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Created, not yet picked up
    #[default]
    Pending,
    /// On the road
    InProgress,
    /// Handed over at the dropoff
    Delivered,
}

impl ShipmentStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ShipmentStatus; 3] = [
        ShipmentStatus::Pending,
        ShipmentStatus::InProgress,
        ShipmentStatus::Delivered,
    ];

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InProgress => "in_progress",
            ShipmentStatus::Delivered => "delivered",
        }
    }

    /// Returns `true` for the end of the normal flow.
    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Delivered)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = InvalidStatus;

    /// Exact, case-sensitive match on the wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus::new(s))
    }
}

/// An address with its coordinates in decimal degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Street address as entered
    pub address: String,
    /// Degrees north, within [-90, 90]
    pub latitude: f64,
    /// Degrees east, within [-180, 180]
    pub longitude: f64,
}

/// Validated shipment attributes, ready to be inserted.
///
/// Built by [`ShipmentValidator::validate`](crate::ShipmentValidator::validate); the
/// owner is taken from the requesting principal, never from input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShipment {
    pub(crate) owner_id: PrincipalId,
    pub(crate) pickup: Location,
    pub(crate) dropoff: Location,
    pub(crate) cargo_type: String,
    pub(crate) weight: String,
    pub(crate) truck_type: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl NewShipment {
    /// Returns the owner that will be recorded.
    pub fn owner_id(&self) -> PrincipalId {
        self.owner_id
    }

    /// Assigns `id` and produces the stored record with status `pending`.
    pub fn into_shipment(self, id: ShipmentId) -> Shipment {
        Shipment {
            id,
            owner_id: self.owner_id,
            pickup: self.pickup,
            dropoff: self.dropoff,
            cargo_type: self.cargo_type,
            weight: self.weight,
            truck_type: self.truck_type,
            status: ShipmentStatus::Pending,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// A single pickup-to-dropoff cargo movement request.
///
/// `id`, `owner_id` and `created_at` are fixed at creation. The only
/// mutation is a status change, which also refreshes `updated_at`; fields
/// are private so no other write path exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,
    owner_id: PrincipalId,
    pickup: Location,
    dropoff: Location,
    cargo_type: String,
    weight: String,
    truck_type: String,
    status: ShipmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Shipment {
    /// Repository-assigned identifier.
    pub fn id(&self) -> ShipmentId {
        self.id
    }

    /// Principal that created the shipment.
    pub fn owner_id(&self) -> PrincipalId {
        self.owner_id
    }

    /// Where the cargo is collected.
    pub fn pickup(&self) -> &Location {
        &self.pickup
    }

    /// Where the cargo is delivered.
    pub fn dropoff(&self) -> &Location {
        &self.dropoff
    }

    /// Cargo classification.
    pub fn cargo_type(&self) -> &str {
        &self.cargo_type
    }

    /// Weight bucket, e.g. `"1000-5000 kg"`.
    pub fn weight(&self) -> &str {
        &self.weight
    }

    /// Requested truck classification.
    pub fn truck_type(&self) -> &str {
        &self.truck_type
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last status write.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` if `principal` created this shipment.
    pub fn is_owned_by(&self, principal: PrincipalId) -> bool {
        self.owner_id == principal
    }

    /// Sets the status and stamps `updated_at`.
    pub(crate) fn set_status(&mut self, status: ShipmentStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}

/// Owner information attached for administrative display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    /// Owner identifier
    pub id: PrincipalId,
    /// Owner display name
    pub name: String,
}

/// A shipment as returned to a caller, with owner info when the caller
/// is an admin.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentView {
    /// The record
    pub shipment: Shipment,
    /// Owner details, admin callers only
    pub owner: Option<OwnerSummary>,
}

impl ShipmentView {
    /// Wraps a shipment without owner info.
    pub fn bare(shipment: Shipment) -> Self {
        Self {
            shipment,
            owner: None,
        }
    }
}
