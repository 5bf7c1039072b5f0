use std::fmt;

use thiserror::Error;
use uuid::Uuid;
use vellum_model::{ContentKind, MediaAssetStatus, MediaKind, ModelError};

/// Which entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    MediaAsset,
    ContentItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::MediaAsset => f.write_str("media asset"),
            EntityKind::ContentItem => f.write_str("content item"),
        }
    }
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in one input, collected before any I/O happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.errors.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

/// Failure modes of the catalog managers.
///
/// `NotFound` is returned for missing, soft-deleted and foreign records
/// alike; the message never says which.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: Uuid },

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("slug '{slug}' is already in use")]
    SlugConflict { slug: String },

    #[error("content kind {content_kind} cannot use a {media_kind} asset")]
    ContentKindMismatch {
        content_kind: ContentKind,
        media_kind: MediaKind,
    },

    #[error("media asset {media_asset_id} is not ready ({})", status_label(.status))]
    MediaNotReady {
        media_asset_id: Uuid,
        /// `None` when the asset is gone (soft-deleted).
        status: Option<MediaAssetStatus>,
    },

    #[error("cannot move media asset from {from} to {to}")]
    InvalidStateTransition {
        from: MediaAssetStatus,
        to: MediaAssetStatus,
    },

    #[error("content item {content_item_id} cannot be published: {reason}")]
    Unpublishable {
        content_item_id: Uuid,
        reason: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_label(status: &Option<MediaAssetStatus>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("unavailable")
}

/// Stable discriminant for mapping failures onto wire-level responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogErrorKind {
    NotFound,
    Validation,
    SlugConflict,
    ContentKindMismatch,
    MediaNotReady,
    InvalidStateTransition,
    Unpublishable,
    Internal,
}

impl CatalogError {
    pub fn kind(&self) -> CatalogErrorKind {
        match self {
            CatalogError::NotFound { .. } => CatalogErrorKind::NotFound,
            CatalogError::Validation(_) => CatalogErrorKind::Validation,
            CatalogError::SlugConflict { .. } => CatalogErrorKind::SlugConflict,
            CatalogError::ContentKindMismatch { .. } => {
                CatalogErrorKind::ContentKindMismatch
            }
            CatalogError::MediaNotReady { .. } => {
                CatalogErrorKind::MediaNotReady
            }
            CatalogError::InvalidStateTransition { .. } => {
                CatalogErrorKind::InvalidStateTransition
            }
            CatalogError::Unpublishable { .. } => {
                CatalogErrorKind::Unpublishable
            }
            CatalogError::Internal(_) => CatalogErrorKind::Internal,
        }
    }

    pub fn media_asset_not_found(id: impl Into<Uuid>) -> Self {
        CatalogError::NotFound {
            entity: EntityKind::MediaAsset,
            id: id.into(),
        }
    }

    pub fn content_item_not_found(id: impl Into<Uuid>) -> Self {
        CatalogError::NotFound {
            entity: EntityKind::ContentItem,
            id: id.into(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CatalogError::Validation(ValidationErrors::single(field, message))
    }
}

impl From<ModelError> for CatalogError {
    fn from(err: ModelError) -> Self {
        // Only raised when decoding stored rows, so it is a storage fault.
        CatalogError::Internal(format!("Corrupt stored value: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
