use serde::{Deserialize, Deserializer};

/// Server-side status of an ETL job.
///
/// The label set is owned by the server; anything this client does not
/// recognize is preserved verbatim in [`JobStatus::Other`] rather than
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JobStatus {
    /// Freshly created; data can still be staged onto the job.
    Editing,
    Queued,
    Running,
    Completed,
    /// Reported as `ERROR` by the ETL endpoints.
    Error,
    /// Reported as `FAILED` by the job endpoints.
    Failed,
    Cancelled,
    Other(String),
}

impl From<String> for JobStatus {
    fn from(label: String) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "EDITING" => JobStatus::Editing,
            "QUEUED" => JobStatus::Queued,
            "RUNNING" => JobStatus::Running,
            "COMPLETED" => JobStatus::Completed,
            "ERROR" => JobStatus::Error,
            "FAILED" => JobStatus::Failed,
            "CANCELLED" => JobStatus::Cancelled,
            _ => JobStatus::Other(label),
        }
    }
}

impl JobStatus {
    /// Terminal statuses are never left once entered; polling stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Error | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Editing => "EDITING",
            JobStatus::Queued => "QUEUED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Error => "ERROR",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelled => "CANCELLED",
            JobStatus::Other(label) => label,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a server-side job, as returned by the job endpoints.
///
/// The client only ever observes these; all transitions after submission
/// happen server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "modelId", deserialize_with = "opt_id_string")]
    pub model_id: Option<String>,
    #[serde(default, rename = "modelName")]
    pub model_name: Option<String>,
    #[serde(default, rename = "userName")]
    pub user_name: Option<String>,
    #[serde(default, rename = "createdDate")]
    pub created_date: Option<i64>,
    #[serde(default, rename = "updatedDate")]
    pub updated_date: Option<i64>,
    pub status: JobStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Acknowledgement returned when an import is accepted: the started job's
/// id plus the row count when the server reports one.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportReceipt {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, rename = "rowCount")]
    pub rows_accepted: Option<u64>,
}

/// Minimal `{"id": ...}` reply, used by job creation.
#[derive(Debug, Deserialize)]
pub(crate) struct IdReply {
    #[serde(deserialize_with = "id_string")]
    pub(crate) id: String,
}

// Vena ids show up both as JSON strings and as bare integers depending on
// the endpoint; accept either.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
        Null,
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Number(n)) => Some(n.to_string()),
        Some(Raw::Null) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_parse_case_insensitively() {
        assert_eq!(JobStatus::from("completed".to_string()), JobStatus::Completed);
        assert_eq!(JobStatus::from("RUNNING".to_string()), JobStatus::Running);
        assert_eq!(
            JobStatus::from("VALIDATING".to_string()),
            JobStatus::Other("VALIDATING".to_string())
        );
    }

    #[test]
    fn failed_label_is_terminal() {
        let status = JobStatus::from("FAILED".to_string());
        assert_eq!(status, JobStatus::Failed);
        assert!(status.is_terminal());
        assert_eq!(status.as_str(), "FAILED");
    }

    #[test]
    fn terminal_set_is_completed_error_failed_cancelled() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Editing.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Other("VALIDATING".into()).is_terminal());
    }

    #[test]
    fn job_deserializes_from_full_payload() {
        let job: Job = serde_json::from_str(
            r#"{
                "id": 802340001,
                "name": "Nightly load",
                "modelId": "55001",
                "modelName": "Finance",
                "userName": "svc-etl",
                "createdDate": 1714490000000,
                "updatedDate": 1714490600000,
                "status": "COMPLETED",
                "warnings": ["3 rows skipped"]
            }"#,
        )
        .unwrap();
        assert_eq!(job.id, "802340001");
        assert_eq!(job.model_id.as_deref(), Some("55001"));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.warnings, ["3 rows skipped"]);
        assert!(job.error.is_none());
    }

    #[test]
    fn job_deserializes_from_sparse_payload() {
        let job: Job = serde_json::from_str(r#"{"id":"j-1","status":"EDITING"}"#).unwrap();
        assert_eq!(job.id, "j-1");
        assert_eq!(job.status, JobStatus::Editing);
        assert!(job.warnings.is_empty());
    }

    #[test]
    fn import_receipt_accepts_numeric_id() {
        let receipt: ImportReceipt =
            serde_json::from_str(r#"{"id": 42, "rowCount": 128}"#).unwrap();
        assert_eq!(receipt.id, "42");
        assert_eq!(receipt.rows_accepted, Some(128));
    }
}
