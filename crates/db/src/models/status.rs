//! Release status enum mapping to the `release_statuses` lookup table.
//!
//! Variant discriminants match the seed data order (1-based) in the
//! database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

/// Lifecycle status of a release.
///
/// RECEIVED is the only status set at creation; every later transition
/// is owned by the processing worker. PUBLISHED and DELETED are
/// terminal; FAILED stays eligible for another processing attempt.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    /// Received and pending processing.
    Received = 1,
    /// Currently being processed by a worker.
    Processing = 2,
    /// Successfully processed and published.
    Published = 3,
    /// Processing failed; eligible for retry.
    Failed = 4,
    /// Removed by administrative action.
    Deleted = 5,
}

impl ReleaseStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Resolve a database status ID back to the enum.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(ReleaseStatus::Received),
            2 => Some(ReleaseStatus::Processing),
            3 => Some(ReleaseStatus::Published),
            4 => Some(ReleaseStatus::Failed),
            5 => Some(ReleaseStatus::Deleted),
            _ => None,
        }
    }

    /// True for statuses no further transition leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, ReleaseStatus::Published | ReleaseStatus::Deleted)
    }

    /// True for statuses a worker may claim for processing.
    pub fn is_processable(self) -> bool {
        matches!(self, ReleaseStatus::Received | ReleaseStatus::Failed)
    }
}

impl From<ReleaseStatus> for StatusId {
    fn from(value: ReleaseStatus) -> Self {
        value as StatusId
    }
}
