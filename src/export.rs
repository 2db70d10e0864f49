use serde::Deserialize;
use serde_json::Value;

/// One page of the intersections export.
///
/// `data` is row-major; row 0 of every page repeats the header row and is
/// dropped. Column names come from `metadata.headers`, and
/// `metadata.nextPage` carries the follow-up URL while more pages remain.
#[derive(Debug, Deserialize)]
pub(crate) struct ExportPage {
    #[serde(default)]
    pub(crate) data: Vec<Vec<Value>>,
    #[serde(default)]
    pub(crate) metadata: ExportMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportMetadata {
    #[serde(default)]
    pub(crate) headers: Vec<String>,
    #[serde(default, rename = "nextPage")]
    pub(crate) next_page: Option<String>,
}

impl ExportPage {
    /// Data rows with the embedded header row dropped and every cell
    /// normalized to a string.
    pub(crate) fn records(self) -> Vec<Vec<String>> {
        self.data
            .into_iter()
            .skip(1)
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect()
    }
}

// Intersections mix strings and raw numbers; nulls become empty cells.
fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_parses_and_skips_header_row() {
        let page: ExportPage = serde_json::from_str(
            r#"{
                "data": [
                    ["Account", "Period", "Value"],
                    ["4000", "2024-01", 1250.5],
                    ["4100", "2024-01", null]
                ],
                "metadata": {
                    "headers": ["Account", "Period", "Value"],
                    "nextPage": "https://us1.vena.io/api/public/v1/models/1/intersections?page=2"
                }
            }"#,
        )
        .unwrap();

        assert!(page.metadata.next_page.is_some());
        assert_eq!(page.metadata.headers.len(), 3);

        let records = page.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ["4000", "2024-01", "1250.5"]);
        assert_eq!(records[1], ["4100", "2024-01", ""]);
    }

    #[test]
    fn last_page_has_no_next_link() {
        let page: ExportPage = serde_json::from_str(
            r#"{"data": [["h"]], "metadata": {"headers": ["h"]}}"#,
        )
        .unwrap();
        assert!(page.metadata.next_page.is_none());
        assert!(page.records().is_empty());
    }
}
