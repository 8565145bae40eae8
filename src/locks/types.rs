//! Lock and lock table definitions.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identity of a lock holder, as supplied by the caller.
///
/// Never verified. Ownership is decided by `id` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: String,

    /// Informational only.
    #[serde(default)]
    pub display_name: String,
}

impl Owner {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Exclusive, time-bounded edit ownership of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lock {
    /// Minted on every acquisition, including re-acquisition by the holder.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub case_id: String,

    /// `None` only in malformed persisted entries, which count as absent.
    #[serde(default)]
    pub owner: Option<Owner>,

    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,

    /// Unix seconds. The lock is dead once `now >= expires_at`.
    #[serde(default)]
    pub expires_at: i64,
}

impl Lock {
    /// Mint a fresh lock for `owner` on `case_id`.
    pub fn new(case_id: impl Into<String>, owner: Owner, now: i64, ttl_seconds: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            case_id: case_id.into(),
            owner: Some(owner),
            created_at: now,
            expires_at: now + ttl_seconds,
        }
    }

    pub fn is_live(&self, now: i64) -> bool {
        now < self.expires_at
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner.as_ref().map(|o| o.id.as_str())
    }

    /// True when the lock has an owner and it is not `owner_id`.
    ///
    /// Ownerless entries never count as held by someone else.
    pub fn is_held_by_other(&self, owner_id: &str) -> bool {
        matches!(self.owner_id(), Some(id) if id != owner_id)
    }

    pub fn is_held_by(&self, owner_id: &str) -> bool {
        self.owner_id() == Some(owner_id)
    }

    /// Display name of the holder, falling back to the id.
    pub fn holder_name(&self) -> &str {
        match &self.owner {
            Some(owner) if !owner.display_name.is_empty() => &owner.display_name,
            Some(owner) => &owner.id,
            None => "nobody",
        }
    }

    /// Push the expiry to `now + ttl_seconds`, keeping the lock id.
    pub fn renew(&mut self, now: i64, ttl_seconds: i64) {
        self.expires_at = now + ttl_seconds;
    }

    pub fn expires_at_string(&self) -> String {
        DateTime::from_timestamp(self.expires_at, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| self.expires_at.to_string())
    }
}

impl std::fmt::Display for Lock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (owner: {} [{}], lock: {}, expires: {})",
            self.case_id,
            self.holder_name(),
            self.owner_id().unwrap_or("-"),
            self.id,
            self.expires_at_string()
        )
    }
}

/// Case id to lock. Absence means unlocked.
///
/// Persisted as a JSON object keyed by case id. Entries that are `null` or
/// do not parse as a lock load as empty slots and are dropped by the next
/// purge; they never fail the whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LockTable {
    entries: BTreeMap<String, Option<Lock>>,
}

impl<'de> Deserialize<'de> for LockTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let entries = raw
            .into_iter()
            .map(|(case_id, entry)| (case_id, serde_json::from_value::<Lock>(entry).ok()))
            .collect();
        Ok(Self { entries })
    }
}

impl LockTable {
    pub fn get(&self, case_id: &str) -> Option<&Lock> {
        self.entries.get(case_id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, case_id: &str) -> Option<&mut Lock> {
        self.entries.get_mut(case_id).and_then(Option::as_mut)
    }

    /// Store `lock` under its case id, replacing any previous entry.
    pub fn insert(&mut self, lock: Lock) {
        self.entries.insert(lock.case_id.clone(), Some(lock));
    }

    /// Remove the entry for `case_id`. Returns the removed lock, if any.
    pub fn remove(&mut self, case_id: &str) -> Option<Lock> {
        self.entries.remove(case_id).flatten()
    }

    pub fn contains(&self, case_id: &str) -> bool {
        self.entries.contains_key(case_id)
    }

    /// Drop `null` entries and locks with `expires_at <= now`.
    ///
    /// Returns the case ids that were removed.
    pub fn purge_expired(&mut self, now: i64) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|case_id, entry| {
            let keep = entry.as_ref().is_some_and(|lock| lock.is_live(now));
            if !keep {
                removed.push(case_id.clone());
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locks in case-id order, skipping `null` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Lock)> {
        self.entries
            .iter()
            .filter_map(|(case_id, entry)| entry.as_ref().map(|lock| (case_id.as_str(), lock)))
    }
}
