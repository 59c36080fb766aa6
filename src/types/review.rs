use serde::{Deserialize, Serialize};

use crate::types::event::Account;

/// The relationship a reviewing account has to the repository or its
/// organization, as reported by GitHub on each review.
///
/// Values GitHub does not document yet are tolerated and deserialized to
/// [`Association::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Association {
    Owner,
    Member,
    Collaborator,
    Contributor,
    FirstTimeContributor,
    FirstTimer,
    None,
    #[serde(other)]
    Unknown,
}

/// The state of a submitted review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    #[serde(other)]
    Unknown,
}

/// A single pull request review, in the shape returned by the GitHub
/// list-reviews API. Reviews are read-only facts; the list order (oldest
/// submission first) is significant for candidacy replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "user")]
    pub author: Account,

    pub author_association: Association,

    pub state: ReviewState,
}
