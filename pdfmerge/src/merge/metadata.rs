//! PDF metadata management.
//!
//! This module handles the output's document information dictionary:
//! - Title, Author, Subject, Keywords
//! - Creator, Producer
//! - Creation and modification dates

use chrono::{DateTime, Utc};
use lopdf::{Dictionary, Document, Object, StringFormat};

use crate::config::Metadata;
use crate::error::CompositionError;
use crate::utils::{decode_text_string, encode_text_string};

/// Manager for PDF metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataManager;

impl MetadataManager {
    /// Create a new metadata manager.
    pub fn new() -> Self {
        Self
    }

    /// Write the Info dictionary of a document.
    ///
    /// `Creator`, `Producer` and both dates are always written. Title, author,
    /// subject and keywords are written when present in `metadata`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trailer's `/Info` entry points at an object
    /// that is not a dictionary.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfmerge::merge::metadata::MetadataManager;
    /// # use pdfmerge::config::Metadata;
    /// # use lopdf::Document;
    /// # fn example(mut doc: Document) -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = MetadataManager::new();
    /// let metadata = Metadata::new(
    ///     Some("My Document".to_string()),
    ///     Some("John Doe".to_string()),
    ///     None,
    ///     None,
    /// );
    /// manager.set_metadata(&mut doc, &metadata)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn set_metadata(
        &self,
        doc: &mut Document,
        metadata: &Metadata,
    ) -> Result<(), CompositionError> {
        self.set_metadata_at(doc, metadata, Utc::now())
    }

    pub(crate) fn set_metadata_at(
        &self,
        doc: &mut Document,
        metadata: &Metadata,
        now: DateTime<Utc>,
    ) -> Result<(), CompositionError> {
        let info_id = match doc.trailer.get(b"Info").and_then(|i| i.as_reference()) {
            Ok(id) => id,
            Err(_) => {
                let id = doc.add_object(Dictionary::new());
                doc.trailer.set("Info", Object::Reference(id));
                id
            }
        };

        let Some(Object::Dictionary(info)) = doc.objects.get_mut(&info_id) else {
            return Err(CompositionError::new(
                "document information entry is not a dictionary",
            ));
        };

        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, text_string(value));
            }
        }

        let producer = format!("{} {}", crate::NAME, crate::VERSION);
        info.set("Creator", text_string(&producer));
        info.set("Producer", text_string(&producer));

        let date = format_pdf_date(now);
        info.set("CreationDate", text_string(&date));
        info.set("ModDate", text_string(&date));

        Ok(())
    }

    /// Read title, author, subject and keywords from a document.
    ///
    /// Missing or unreadable entries come back as `None`.
    pub fn get_metadata(&self, doc: &Document) -> Metadata {
        let info = match doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => match doc.objects.get(id) {
                Some(Object::Dictionary(dict)) => dict,
                _ => return Metadata::default(),
            },
            Ok(Object::Dictionary(dict)) => dict,
            _ => return Metadata::default(),
        };

        Metadata::new(
            Self::get_string_field(info, b"Title"),
            Self::get_string_field(info, b"Author"),
            Self::get_string_field(info, b"Subject"),
            Self::get_string_field(info, b"Keywords"),
        )
    }

    /// Read a single Info dictionary entry as text.
    pub(crate) fn get_string_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
        match dict.get(key) {
            Ok(Object::String(bytes, _)) => decode_text_string(bytes),
            _ => None,
        }
    }
}

fn text_string(value: &str) -> Object {
    Object::String(encode_text_string(value), StringFormat::Literal)
}

/// Format a timestamp as a PDF date string (`D:YYYYMMDDHHmmSSZ`).
fn format_pdf_date(time: DateTime<Utc>) -> String {
    time.format("D:%Y%m%d%H%M%SZ").to_string()
}
