use std::io;
use std::path::{Path, PathBuf};

const COLUMNS: [&str; 10] = [
    "LAST SEEN",
    "FIRST SEEN",
    "COUNT",
    "NAME",
    "KIND",
    "SUBOBJECT",
    "TYPE",
    "REASON",
    "SOURCE",
    "MESSAGE",
];

/// One namespace event, flattened for the events dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
    pub last_seen: Option<String>,
    pub first_seen: Option<String>,
    pub count: Option<i32>,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub sub_object: Option<String>,
    pub event_type: Option<String>,
    pub reason: Option<String>,
    pub source: Option<String>,
    pub message: Option<String>,
}

impl EventRecord {
    fn row(&self) -> String {
        let count = self.count.map(|c| c.to_string());
        [
            &self.last_seen,
            &self.first_seen,
            &count,
            &self.name,
            &self.kind,
            &self.sub_object,
            &self.event_type,
            &self.reason,
            &self.source,
            &self.message,
        ]
        .iter()
        .map(|field| field.as_deref().map(clean).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\t")
    }
}

// Keep every event on one row.
fn clean(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

/// Tab-separated table, header first, one row per event.
pub fn format_events_table(records: &[EventRecord]) -> String {
    let mut out = COLUMNS.join("\t");
    out.push('\n');
    for record in records {
        out.push_str(&record.row());
        out.push('\n');
    }
    out
}

/// Write the table to `<folder>/<namespace>-events.log`, replacing any earlier dump.
pub async fn write_events_table(
    folder: &Path,
    namespace: &str,
    records: &[EventRecord],
) -> io::Result<PathBuf> {
    let path = folder.join(crate::utils::log_file_name(&format!("{}-events", namespace)));
    tokio::fs::write(&path, format_events_table(records)).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled() -> EventRecord {
        EventRecord {
            last_seen: Some("2019-06-01T10:00:05Z".to_string()),
            first_seen: Some("2019-06-01T10:00:00Z".to_string()),
            count: Some(3),
            name: Some("kie-server-1-abcde.15a".to_string()),
            kind: Some("Pod".to_string()),
            sub_object: Some("spec.containers{kie-server}".to_string()),
            event_type: Some("Normal".to_string()),
            reason: Some("Pulled".to_string()),
            source: Some("kubelet".to_string()),
            message: Some("Container image pulled".to_string()),
        }
    }

    #[test]
    fn test_empty_table_has_header() {
        assert_eq!(
            format_events_table(&[]),
            "LAST SEEN\tFIRST SEEN\tCOUNT\tNAME\tKIND\tSUBOBJECT\tTYPE\tREASON\tSOURCE\tMESSAGE\n"
        );
    }

    #[test]
    fn test_row_layout() {
        let table = format_events_table(&[scheduled()]);
        let row = table.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "2019-06-01T10:00:05Z\t2019-06-01T10:00:00Z\t3\tkie-server-1-abcde.15a\tPod\tspec.containers{kie-server}\tNormal\tPulled\tkubelet\tContainer image pulled"
        );
    }

    #[test]
    fn test_missing_fields_and_multiline_message() {
        let record = EventRecord {
            reason: Some("BackOff".to_string()),
            message: Some("line one\nline two".to_string()),
            ..Default::default()
        };
        let table = format_events_table(&[record]);
        let row = table.lines().nth(1).unwrap();
        assert_eq!(row.split('\t').count(), 10);
        assert!(row.ends_with("BackOff\t\tline one line two"));
    }

    #[tokio::test]
    async fn test_write_events_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_events_table(dir.path(), "ns-1", &[scheduled()])
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("ns-1-events.log"));
        assert_eq!(std::fs::read_to_string(path).unwrap().lines().count(), 2);
    }
}
