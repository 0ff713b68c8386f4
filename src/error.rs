use chrono::{DateTime, Utc};
use thiserror::Error;

/// Kinds of entity a request can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Business,
    Service,
    Staff,
    Customer,
    ResourceType,
    Booking,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Business => "business",
            EntityKind::Service => "service",
            EntityKind::Staff => "staff",
            EntityKind::Customer => "customer",
            EntityKind::ResourceType => "resource type",
            EntityKind::Booking => "booking",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by the availability engine and its store
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: EntityKind, id: String },

    #[error("staff {staff_id} cannot provide service {service_id}")]
    StaffCannotProvideService { staff_id: String, service_id: String },

    #[error("resource type {resource_type_id} cannot supply {requested} units (capacity {capacity})")]
    InsufficientCapacity {
        resource_type_id: String,
        requested: u32,
        capacity: u32,
    },

    #[error("slot starting at {start} is no longer available")]
    SlotNoLongerAvailable { start: DateTime<Utc> },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),
}

impl BookingError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        BookingError::EntityNotFound {
            kind,
            id: id.into(),
        }
    }

    /// Transient failures that may succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::StoreUnavailable(_))
    }

    /// Stable machine-readable name for API responses
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidTimeFormat(_) => "invalid_time_format",
            BookingError::InvalidRequest(_) => "invalid_request",
            BookingError::EntityNotFound { .. } => "entity_not_found",
            BookingError::StaffCannotProvideService { .. } => "staff_cannot_provide_service",
            BookingError::InsufficientCapacity { .. } => "insufficient_capacity",
            BookingError::SlotNoLongerAvailable { .. } => "slot_no_longer_available",
            BookingError::StoreUnavailable(_) => "store_unavailable",
            BookingError::Storage(_) => "storage_error",
        }
    }
}

impl From<rusqlite::Error> for BookingError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen) => {
                BookingError::StoreUnavailable(err.to_string())
            }
            _ => BookingError::Storage(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
