//! Document types, statuses and validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::slug::{is_valid_slug, slugify};

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Document type
// ---------------------------------------------------------------------------

/// Kind of legal text. Stored as lowercase text in `documents.document_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Constitution,
    Code,
    Law,
    Ordinance,
    Decree,
    Order,
    Treaty,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        Self::Constitution,
        Self::Code,
        Self::Law,
        Self::Ordinance,
        Self::Decree,
        Self::Order,
        Self::Treaty,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constitution => "constitution",
            Self::Code => "code",
            Self::Law => "law",
            Self::Ordinance => "ordinance",
            Self::Decree => "decree",
            Self::Order => "order",
            Self::Treaty => "treaty",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid document_type '{value}'. Valid types: {}",
                    Self::ALL.map(|t| t.as_str()).join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_ARCHIVED: &str = "archived";

/// All valid document statuses.
pub const VALID_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_PUBLISHED, STATUS_ARCHIVED];

/// Validate a document status against the known set.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if !VALID_STATUSES.contains(&status) {
        return Err(CoreError::Validation(format!(
            "Invalid status '{status}'. Valid statuses: {}",
            VALID_STATUSES.join(", ")
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Title / slug
// ---------------------------------------------------------------------------

/// Validate a document title (non-blank, at most [`MAX_TITLE_LEN`] chars).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Resolve the slug for a document: the explicit one if given (validated),
/// otherwise one generated from the title.
pub fn resolve_slug(title: &str, explicit: Option<&str>) -> Result<String, CoreError> {
    match explicit {
        Some(slug) => {
            if !is_valid_slug(slug) {
                return Err(CoreError::Validation(format!(
                    "Slug '{slug}' must contain only lowercase alphanumeric characters and single hyphens"
                )));
            }
            Ok(slug.to_string())
        }
        None => {
            let generated = slugify(title);
            if generated.is_empty() {
                return Err(CoreError::Validation(
                    "Cannot derive a slug from the title; provide one explicitly".into(),
                ));
            }
            Ok(generated)
        }
    }
}
