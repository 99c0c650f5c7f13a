//! What an attempt pays for.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ArtistId, ItemId};

/// Kind of payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    ItemPurchase,
    SubscriptionCreate,
}

/// Kind of purchasable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Song,
    Album,
}

/// A purchasable song or album.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ItemId,
    pub kind: ItemKind,
}

impl ItemRef {
    pub fn song(id: ItemId) -> Self {
        Self { id, kind: ItemKind::Song }
    }

    pub fn album(id: ItemId) -> Self {
        Self { id, kind: ItemKind::Album }
    }
}

/// The subject of an attempt: an item to buy or an artist to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Subject {
    Item(ItemRef),
    Artist { artist_id: ArtistId },
}

impl Subject {
    pub fn artist(artist_id: ArtistId) -> Self {
        Subject::Artist { artist_id }
    }

    /// The attempt kind this subject implies.
    pub fn attempt_kind(&self) -> AttemptKind {
        match self {
            Subject::Item(_) => AttemptKind::ItemPurchase,
            Subject::Artist { .. } => AttemptKind::SubscriptionCreate,
        }
    }

    pub fn as_item(&self) -> Option<&ItemRef> {
        match self {
            Subject::Item(item) => Some(item),
            Subject::Artist { .. } => None,
        }
    }

    pub fn as_artist(&self) -> Option<&ArtistId> {
        match self {
            Subject::Item(_) => None,
            Subject::Artist { artist_id } => Some(artist_id),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Item(item) => write!(f, "{:?}:{}", item.kind, item.id),
            Subject::Artist { artist_id } => write!(f, "artist:{}", artist_id),
        }
    }
}

/// Admission key: at most one live attempt per subject and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdmissionKey {
    pub subject: Subject,
    pub kind: AttemptKind,
}
