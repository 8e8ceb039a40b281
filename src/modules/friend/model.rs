use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::auth::model::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FriendshipStatus::Pending => write!(f, "PENDING"),
            FriendshipStatus::Accepted => write!(f, "ACCEPTED"),
            FriendshipStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// The single record a user pair can hold. Direction matters while pending:
/// the requester sent it, the addressee decides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: Uuid,
    pub requester: UserProfile,
    pub addressee: UserProfile,
    pub status: FriendshipStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Friendship {
    pub fn involves(&self, user_a: Uuid, user_b: Uuid) -> bool {
        (self.requester.id == user_a && self.addressee.id == user_b)
            || (self.requester.id == user_b && self.addressee.id == user_a)
    }

    /// The other side of the record, from `viewer`'s perspective.
    pub fn counterpart(&self, viewer: Uuid) -> &UserProfile {
        if self.requester.id == viewer {
            &self.addressee
        } else {
            &self.requester
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub addressee_id: Uuid,
}

/// How a searched user relates to the viewer. Each relation admits exactly
/// one UI action, so a candidate is never offered "Add" while a record
/// already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationToViewer {
    None,
    PendingSent,
    PendingReceived,
    Accepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationAction {
    Add,
    Cancel,
    AcceptOrReject,
    Remove,
}

impl RelationToViewer {
    pub fn action(&self) -> RelationAction {
        match self {
            RelationToViewer::None => RelationAction::Add,
            RelationToViewer::PendingSent => RelationAction::Cancel,
            RelationToViewer::PendingReceived => RelationAction::AcceptOrReject,
            RelationToViewer::Accepted => RelationAction::Remove,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedUser {
    pub user: UserProfile,
    pub relation: RelationToViewer,
}
