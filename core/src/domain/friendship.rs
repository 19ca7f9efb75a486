//! Friend request lifecycle and friendship edge records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Stable friend request identifier stored as a UUID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a new random [`RequestId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Error returned when a stored status string is not a known state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStatusParseError {
    value: String,
}

impl RequestStatusParseError {
    /// The unrecognised status string.
    pub fn value(&self) -> &str {
        self.value.as_str()
    }
}

impl fmt::Display for RequestStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised friend request status: {}", self.value)
    }
}

impl std::error::Error for RequestStatusParseError {}

/// State of a friend request.
///
/// `Pending` is the only state that permits transitions; `Accepted` and
/// `Declined` are terminal for the request row. A new request between the
/// same pair may be created later regardless of how an earlier one resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Parse the storage representation.
    pub fn parse(value: &str) -> Result<Self, RequestStatusParseError> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(RequestStatusParseError {
                value: other.to_owned(),
            }),
        }
    }

    /// Whether the request still awaits a resolution.
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A friend request row.
///
/// ## Invariants
/// - `sender_id != receiver_id`.
/// - At most one `Pending` row exists per ordered (sender, receiver) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    /// Stable identifier.
    pub id: RequestId,
    /// User who initiated the request.
    pub sender_id: UserId,
    /// User the request was addressed to.
    pub receiver_id: UserId,
    /// Current lifecycle state.
    pub status: RequestStatus,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One directed row of a symmetric friendship edge.
///
/// An edge between A and B is materialized as the two rows A→B and B→A;
/// they are created and destroyed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    /// Owning side of this directed row.
    pub user_id: UserId,
    /// The befriended user.
    pub friend_id: UserId,
    /// Edge creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Outcome of accepting a friend request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipAccepted {
    /// The request as resolved, status `Accepted`.
    pub request: FriendRequest,
    /// Whether a new friendship edge was created by this accept.
    ///
    /// `false` means the pair was already friends; counters were left
    /// untouched in that case.
    pub edge_created: bool,
}
