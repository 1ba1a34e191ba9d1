//! Output formatting for record views.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use medvault_core::{AttachmentKind, Record};

const NOTE_SUMMARY_MAX: usize = 40;

fn kind_label(kind: AttachmentKind) -> &'static str {
    match kind {
        AttachmentKind::Image => "image",
        AttachmentKind::Document => "document",
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Convert a record to JSON for output. Payloads are summarised, not dumped.
pub fn record_json(record: &Record) -> serde_json::Value {
    let attachments: Vec<_> = record
        .attachments
        .iter()
        .map(|a| {
            serde_json::json!({
                "id": a.id,
                "name": a.name,
                "kind": kind_label(a.kind),
                "mime_type": a.mime_type,
                "size": a.payload.len(),
            })
        })
        .collect();
    serde_json::json!({
        "patient_id": record.subject_id,
        "date": record.occurred_on.to_string(),
        "diagnosis": record.diagnosis,
        "prescription": record.prescription,
        "notes": record.notes,
        "attachments": attachments,
    })
}

pub fn records_json(records: &[Record]) -> serde_json::Value {
    serde_json::Value::Array(records.iter().map(record_json).collect())
}

pub fn records_table(records: &[Record]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Patient",
            "Date",
            "Diagnosis",
            "Prescription",
            "Notes",
            "Attachments",
        ]);
    for record in records {
        let attachments = record
            .attachments
            .iter()
            .map(|a| format!("{} {} ({})", a.id, a.name, kind_label(a.kind)))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            record.subject_id.clone(),
            record.occurred_on.to_string(),
            record.diagnosis.clone(),
            record.prescription.clone(),
            truncate(&record.notes, NOTE_SUMMARY_MAX),
            attachments,
        ]);
    }
    table
}
