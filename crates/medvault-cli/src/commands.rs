use std::path::Path;

use chrono::NaiveDate;

use medvault_core::{Attachment, NaturalKey, Record};

use crate::app::open_session;
use crate::cli::{
    AddArgs, AttachArgs, Cli, DetachArgs, EditArgs, InitConfigArgs, ListArgs, OutputFormat,
    RecordKeyArgs,
};
use crate::config::{
    default_store_path, resolve_config_path, write_config, MedvaultConfig, StoreBackend,
};
use crate::output::{records_json, records_table};

/// Parse a visit date (YYYY-MM-DD).
pub fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date (expected YYYY-MM-DD): {}", value))
}

fn natural_key(args: &RecordKeyArgs) -> anyhow::Result<NaturalKey> {
    let patient = args.patient.trim();
    if patient.is_empty() {
        return Err(anyhow::anyhow!("Patient id cannot be empty"));
    }
    Ok(NaturalKey::new(patient, parse_date(&args.date)?))
}

/// Guess a MIME type from a file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

pub fn handle_init_config(cli: &Cli, args: &InitConfigArgs) -> anyhow::Result<()> {
    let path = resolve_config_path(cli.config.as_deref())?;
    if path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}\nHint: Pass --force to overwrite it.",
            path.display()
        ));
    }

    let backend = StoreBackend::from(args.backend);
    let store_path = match &args.store_path {
        Some(value) => value.into(),
        None => default_store_path(backend)?,
    };
    write_config(&path, &MedvaultConfig::template(backend, store_path))?;

    if !cli.quiet {
        println!("Wrote {}", path.display());
        println!("Set access.privileged_secret (and any [[access.scoped]] entries) before use.");
    }
    Ok(())
}

pub fn handle_list(cli: &Cli, args: &ListArgs) -> anyhow::Result<()> {
    let session = open_session(cli)?;
    let records = session.records();

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&records_json(records))?);
        }
        OutputFormat::Text => {
            if records.is_empty() {
                if !cli.quiet {
                    println!("No records.");
                }
            } else {
                println!("{}", records_table(records));
            }
        }
    }
    Ok(())
}

pub fn handle_add(cli: &Cli, args: &AddArgs) -> anyhow::Result<()> {
    let key = natural_key(&args.key)?;
    let mut session = open_session(cli)?;

    let record = Record::new(key.subject_id.clone(), key.occurred_on)
        .with_diagnosis(args.diagnosis.clone())
        .with_prescription(args.prescription.clone())
        .with_notes(args.notes.clone());
    session.upsert(record, None)?;

    if !cli.quiet {
        println!("Added record {}", key);
    }
    Ok(())
}

pub fn handle_edit(cli: &Cli, args: &EditArgs) -> anyhow::Result<()> {
    let key = natural_key(&args.key)?;
    let mut session = open_session(cli)?;

    let mut record = session
        .find(&key)?
        .ok_or_else(|| anyhow::anyhow!("Record {} not found", key))?;
    if let Some(value) = &args.new_date {
        record.occurred_on = parse_date(value)?;
    }
    if let Some(value) = &args.diagnosis {
        record.diagnosis = value.clone();
    }
    if let Some(value) = &args.prescription {
        record.prescription = value.clone();
    }
    if let Some(value) = &args.notes {
        record.notes = value.clone();
    }
    let updated = record.natural_key();
    session.upsert(record, Some(&key))?;

    if !cli.quiet {
        println!("Edited record {}", updated);
    }
    Ok(())
}

pub fn handle_attach(cli: &Cli, args: &AttachArgs) -> anyhow::Result<()> {
    let key = natural_key(&args.key)?;
    let path = Path::new(&args.file);
    let payload = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let name = match &args.name {
        Some(name) => name.clone(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string(),
    };
    let mime_type = args
        .mime
        .clone()
        .unwrap_or_else(|| guess_mime_type(path).to_string());

    let mut session = open_session(cli)?;
    let record = session
        .find(&key)?
        .ok_or_else(|| anyhow::anyhow!("Record {} not found", key))?;
    let attachment = Attachment::new(name, mime_type, payload);
    let attachment_id = attachment.id.clone();
    session.upsert(record.with_attachment(attachment), Some(&key))?;

    if !cli.quiet {
        println!("Attached {} to {}", attachment_id, key);
    } else {
        println!("{}", attachment_id);
    }
    Ok(())
}

pub fn handle_detach(cli: &Cli, args: &DetachArgs) -> anyhow::Result<()> {
    let key = natural_key(&args.key)?;
    let mut session = open_session(cli)?;

    let had_attachment = session
        .find(&key)?
        .map(|r| r.attachments.iter().any(|a| a.id == args.attachment_id))
        .unwrap_or(false);
    session.delete_attachment(&key, &args.attachment_id)?;

    if !cli.quiet {
        if had_attachment {
            println!("Removed attachment {} from {}", args.attachment_id, key);
        } else {
            println!("No attachment {} on {}; nothing changed", args.attachment_id, key);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("31/01/2024").is_err());
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("scan.PNG")), "image/png");
        assert_eq!(guess_mime_type(Path::new("report.pdf")), "application/pdf");
        assert_eq!(guess_mime_type(Path::new("blob")), "application/octet-stream");
    }
}
