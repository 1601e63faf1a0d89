use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user record held by the store.
///
/// Field order is part of the strong fingerprint: the record is hashed
/// in its serialised JSON form, so reordering fields changes every tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn new(id: u64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            updated_at: Utc::now(),
        }
    }

    /// Apply a patch and stamp the record with `now`.
    ///
    /// The identifier is never touched.
    pub fn apply(&mut self, patch: RecordPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        self.updated_at = now;
    }
}

/// Partial update body.
///
/// Unknown keys (`id`, `updatedAt`, anything else) are ignored on
/// deserialisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl RecordPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }
}
