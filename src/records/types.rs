//! Case record definitions.

use crate::error::{CasebookError, Result};
use crate::locks::{LockTable, Owner};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Field carrying the caller's identity on record updates. Never persisted.
pub const USER_ID_FIELD: &str = "userId";

/// Fields computed from the lock table when listing. Never persisted.
const DERIVED_FIELDS: [&str; 2] = ["lockedBy", "lockExpiresAt"];

/// One patient case.
///
/// Apart from the id the record is an open JSON object; creation fills in
/// the known fields and updates merge whatever the client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "caseId")]
    pub case_id: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a new record from a client draft.
    ///
    /// `name` must be a non-blank string. Known fields the draft does not set
    /// get their defaults; unknown draft fields are ignored.
    pub fn from_draft(case_id: impl Into<String>, draft: &Map<String, Value>) -> Result<Self> {
        let name = draft
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CasebookError::ValidationError("name is required".to_string()))?;

        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(name.to_string()));
        for (key, default) in default_fields() {
            let value = draft
                .get(key)
                .filter(|v| is_set(v))
                .cloned()
                .unwrap_or(default);
            fields.insert(key.to_string(), value);
        }

        Ok(Self {
            case_id: case_id.into(),
            fields,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Merge `patch` over this record.
    ///
    /// `caseId`, the caller identity and the derived lock fields are skipped.
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            if key == "caseId" || key == USER_ID_FIELD || DERIVED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    /// The id as a number, when it is integer-like.
    pub fn numeric_id(&self) -> Option<u64> {
        self.case_id.trim().parse().ok()
    }
}

/// Known record fields and their defaults, `name` excluded.
fn default_fields() -> [(&'static str, Value); 10] {
    [
        ("birthDate", json!("")),
        ("age", json!(0)),
        ("diagnosis", json!("")),
        ("status", json!("Pending")),
        ("schoolCenter", json!("")),
        ("healthCenter", json!("")),
        ("referral", json!("")),
        ("schoolProtocol", json!("No")),
        ("tests", json!([])),
        ("notes", json!([])),
    ]
}

/// Whether a draft value counts as supplied. Blank strings, `null`, `0` and
/// `false` fall back to the default.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Id for the next record: one more than the largest integer-like id, `"1"`
/// when there is none.
pub fn next_case_id(records: &[Record]) -> String {
    let max = records.iter().filter_map(Record::numeric_id).max().unwrap_or(0);
    (max + 1).to_string()
}

/// A record annotated with its current lock state, as listed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseView {
    #[serde(flatten)]
    pub record: Record,
    pub locked_by: Option<Owner>,
    pub lock_expires_at: Option<i64>,
}

impl CaseView {
    pub fn annotate(record: Record, locks: &LockTable) -> Self {
        let lock = locks.get(&record.case_id);
        Self {
            locked_by: lock.and_then(|l| l.owner.clone()),
            lock_expires_at: lock.map(|l| l.expires_at),
            record,
        }
    }
}
