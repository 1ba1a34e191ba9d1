//! Record and attachment data model.
//!
//! These types are the plaintext payload that gets encrypted as a whole. The
//! JSON field names are part of the stored format and must not change.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of an attachment, used by viewers to pick a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    #[serde(rename = "pdf", alias = "document")]
    Document,
}

impl AttachmentKind {
    /// Classify by MIME type: `image/*` is an image, everything else a document.
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type.trim().to_ascii_lowercase().starts_with("image/") {
            AttachmentKind::Image
        } else {
            AttachmentKind::Document
        }
    }
}

/// A binary file embedded in a record.
///
/// Identity is `id`. Attachments are never edited in place; they are added
/// with the record and removed by id.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "data", with = "payload_base64")]
    pub payload: Vec<u8>,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub mime_type: String,
}

impl Attachment {
    /// Create an attachment with a fresh random id.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, payload: Vec<u8>) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            payload,
            kind: AttachmentKind::from_mime_type(&mime_type),
            mime_type,
        }
    }
}

// Payloads can be megabytes; keep them out of debug output and logs.
impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("payload_len", &self.payload.len())
            .field("kind", &self.kind)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Identifies the logical record addressed by an edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub subject_id: String,
    pub occurred_on: NaiveDate,
}

impl NaturalKey {
    pub fn new(subject_id: impl Into<String>, occurred_on: NaiveDate) -> Self {
        Self {
            subject_id: subject_id.into(),
            occurred_on,
        }
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.subject_id, self.occurred_on)
    }
}

/// One clinical visit for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "patientId")]
    pub subject_id: String,
    #[serde(rename = "date")]
    pub occurred_on: NaiveDate,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub prescription: String,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "files", default)]
    pub attachments: Vec<Attachment>,
}

impl Record {
    /// Create an empty record for `subject_id` on `occurred_on`.
    pub fn new(subject_id: impl Into<String>, occurred_on: NaiveDate) -> Self {
        Self {
            subject_id: subject_id.into(),
            occurred_on,
            diagnosis: String::new(),
            prescription: String::new(),
            notes: String::new(),
            attachments: Vec::new(),
        }
    }

    pub fn with_diagnosis(mut self, diagnosis: impl Into<String>) -> Self {
        self.diagnosis = diagnosis.into();
        self
    }

    pub fn with_prescription(mut self, prescription: impl Into<String>) -> Self {
        self.prescription = prescription.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(self.subject_id.clone(), self.occurred_on)
    }

    pub fn has_key(&self, key: &NaturalKey) -> bool {
        self.subject_id == key.subject_id && self.occurred_on == key.occurred_on
    }

    /// Remove the attachment with `attachment_id`. Returns whether one was removed.
    pub fn remove_attachment(&mut self, attachment_id: &str) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.id != attachment_id);
        self.attachments.len() != before
    }
}

/// Attachment payloads are base64 (standard alphabet) in the stored JSON.
///
/// Older payloads stored a browser data URL (`data:<mime>;base64,<...>`);
/// the prefix is stripped on read. An empty data URL is an empty payload.
mod payload_base64 {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let encoded = match text.strip_prefix("data:") {
            // A zero-byte file without a type reads back as a bare "data:".
            Some("") => "",
            Some(rest) => match rest.split_once(',') {
                Some((header, data)) if header.ends_with(";base64") => data,
                Some((_, "")) => "",
                _ => return Err(serde::de::Error::custom("data URL is not base64")),
            },
            None => text.as_str(),
        };
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}
