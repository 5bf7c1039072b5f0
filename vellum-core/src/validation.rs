//! Shape checks run before any datastore call.
//!
//! Each input type gets one `Validate` impl that records every problem it can
//! find, so the caller sees all bad fields at once.

use once_cell::sync::Lazy;
use regex::Regex;
use vellum_model::{
    ContentItemPatch, ContentKind, MediaAssetPatch, MediaKind, NewContentItem,
    NewMediaAsset, ReadyRendition, patch::assigned,
};

use crate::error::{Result, ValidationErrors};

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 5_000;
pub const SLUG_MAX_LEN: usize = 120;
pub const CATEGORY_MAX_LEN: usize = 64;
pub const TAG_MAX_LEN: usize = 40;
pub const TAG_MAX_COUNT: usize = 20;
pub const BODY_MAX_LEN: usize = 200_000;
pub const STORAGE_KEY_MAX_LEN: usize = 1_024;
pub const MIME_TYPE_MAX_LEN: usize = 127;
pub const FAILURE_REASON_MAX_LEN: usize = 2_000;
pub const SEARCH_MAX_LEN: usize = 200;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$")
        .expect("slug regex should compile")
});

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for NewMediaAsset {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();

        check_required(&mut errors, "storage_key", &self.storage_key, STORAGE_KEY_MAX_LEN);
        if self.file_size <= 0 {
            errors.push("file_size", "must be greater than zero");
        }
        check_required(&mut errors, "mime_type", &self.mime_type, MIME_TYPE_MAX_LEN);
        if !self.mime_type.trim().is_empty()
            && !mime_matches_kind(&self.mime_type, self.kind)
        {
            errors.push(
                "mime_type",
                format!("'{}' is not a {} type", self.mime_type, self.kind),
            );
        }
        check_optional(&mut errors, "title", self.title.as_deref(), TITLE_MAX_LEN);
        check_optional(
            &mut errors,
            "description",
            self.description.as_deref(),
            DESCRIPTION_MAX_LEN,
        );

        errors.into_result()
    }
}

impl Validate for MediaAssetPatch {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        if self.is_empty() {
            errors.push("patch", "at least one field must be provided");
        }
        check_optional(
            &mut errors,
            "title",
            assigned(&self.title).map(String::as_str),
            TITLE_MAX_LEN,
        );
        check_optional(
            &mut errors,
            "description",
            assigned(&self.description).map(String::as_str),
            DESCRIPTION_MAX_LEN,
        );
        errors.into_result()
    }
}

impl Validate for ReadyRendition {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        check_required(&mut errors, "playlist_key", &self.playlist_key, STORAGE_KEY_MAX_LEN);
        check_required(&mut errors, "thumbnail_key", &self.thumbnail_key, STORAGE_KEY_MAX_LEN);
        // Sub-second media probes to a whole-second duration of zero.
        if self.duration_seconds < 0 {
            errors.push("duration_seconds", "must not be negative");
        }
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if matches!(value, Some(v) if v <= 0) {
                errors.push(field, "must be greater than zero");
            }
        }
        for (field, value) in [
            ("preview_playlist_key", self.preview_playlist_key.as_deref()),
            ("waveform_key", self.waveform_key.as_deref()),
            ("waveform_image_key", self.waveform_image_key.as_deref()),
            ("mezzanine_key", self.mezzanine_key.as_deref()),
        ] {
            check_optional(&mut errors, field, value, STORAGE_KEY_MAX_LEN);
        }
        if self.ready_variants.iter().any(|v| v.trim().is_empty()) {
            errors.push("ready_variants", "variant names must not be empty");
        }
        errors.into_result()
    }
}

impl Validate for NewContentItem {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();

        check_required(&mut errors, "title", &self.title, TITLE_MAX_LEN);
        check_slug(&mut errors, &self.slug);
        check_price(&mut errors, self.price_cents);
        check_optional(&mut errors, "category", self.category.as_deref(), CATEGORY_MAX_LEN);
        check_tags(&mut errors, &self.tags);

        match (self.kind, self.media_asset_id) {
            (ContentKind::Written, Some(_)) => {
                errors.push("media_asset_id", "written content cannot reference a media asset");
            }
            (kind, None) if kind.requires_media() => {
                errors.push("media_asset_id", format!("{kind} content requires a media asset"));
            }
            _ => {}
        }

        check_body(&mut errors, self.kind, self.body.as_deref());

        errors.into_result()
    }
}

impl Validate for ContentItemPatch {
    fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();

        if self.media_asset_id.is_some() {
            errors.push("media_asset_id", "the media asset link cannot be changed");
        }
        if let Some(title) = self.title.as_deref() {
            check_required(&mut errors, "title", title, TITLE_MAX_LEN);
        }
        if let Some(slug) = self.slug.as_deref() {
            check_slug(&mut errors, slug);
        }
        if let Some(price) = self.price_cents {
            check_price(&mut errors, price);
        }
        check_optional(
            &mut errors,
            "category",
            assigned(&self.category).map(String::as_str),
            CATEGORY_MAX_LEN,
        );
        if let Some(tags) = self.tags.as_deref() {
            check_tags(&mut errors, tags);
        }
        if let Some(body) = assigned(&self.body)
            && body.chars().count() > BODY_MAX_LEN
        {
            errors.push("body", format!("must be at most {BODY_MAX_LEN} characters"));
        }

        errors.into_result()
    }
}

/// A body may only be set on written content. Checked once the stored kind
/// is known.
pub fn validate_body_for_kind(kind: ContentKind, body: Option<&str>) -> Result<()> {
    let mut errors = ValidationErrors::new();
    check_body(&mut errors, kind, body);
    errors.into_result()
}

pub fn validate_failure_reason(reason: &str) -> Result<()> {
    let mut errors = ValidationErrors::new();
    check_required(&mut errors, "failure_reason", reason, FAILURE_REASON_MAX_LEN);
    errors.into_result()
}

pub fn validate_search(search: Option<&str>) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if let Some(text) = search
        && text.chars().count() > SEARCH_MAX_LEN
    {
        errors.push("search", format!("must be at most {SEARCH_MAX_LEN} characters"));
    }
    errors.into_result()
}

pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() <= SLUG_MAX_LEN && SLUG_PATTERN.is_match(slug)
}

fn mime_matches_kind(mime: &str, kind: MediaKind) -> bool {
    let prefix = match kind {
        MediaKind::Video => "video/",
        MediaKind::Audio => "audio/",
    };
    mime.trim().to_ascii_lowercase().starts_with(prefix)
}

fn check_required(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max_len: usize,
) {
    if value.trim().is_empty() {
        errors.push(field, "must not be empty");
    } else if value.chars().count() > max_len {
        errors.push(field, format!("must be at most {max_len} characters"));
    }
}

fn check_optional(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) {
    if let Some(value) = value {
        check_required(errors, field, value, max_len);
    }
}

fn check_slug(errors: &mut ValidationErrors, slug: &str) {
    if slug.is_empty() {
        errors.push("slug", "must not be empty");
    } else if slug.len() > SLUG_MAX_LEN {
        errors.push("slug", format!("must be at most {SLUG_MAX_LEN} characters"));
    } else if !SLUG_PATTERN.is_match(slug) {
        errors.push(
            "slug",
            "must be lowercase letters and digits separated by single hyphens",
        );
    }
}

fn check_price(errors: &mut ValidationErrors, price_cents: Option<i64>) {
    if matches!(price_cents, Some(p) if p < 0) {
        errors.push("price_cents", "must not be negative");
    }
}

fn check_tags(errors: &mut ValidationErrors, tags: &[String]) {
    if tags.len() > TAG_MAX_COUNT {
        errors.push("tags", format!("at most {TAG_MAX_COUNT} tags are allowed"));
    }
    if tags.iter().any(|t| t.trim().is_empty()) {
        errors.push("tags", "tags must not be empty");
    }
    if tags.iter().any(|t| t.chars().count() > TAG_MAX_LEN) {
        errors.push("tags", format!("tags must be at most {TAG_MAX_LEN} characters"));
    }
}

fn check_body(errors: &mut ValidationErrors, kind: ContentKind, body: Option<&str>) {
    let Some(body) = body else {
        return;
    };
    if kind != ContentKind::Written {
        errors.push("body", "only written content has a body");
    } else if body.chars().count() > BODY_MAX_LEN {
        errors.push("body", format!("must be at most {BODY_MAX_LEN} characters"));
    }
}
