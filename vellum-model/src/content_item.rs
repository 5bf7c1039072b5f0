use chrono::{DateTime, Utc};

use crate::ids::{ContentItemID, MediaAssetID, OrganizationID, OwnerID};
use crate::macros::named_enum;
use crate::media_asset::{MediaAsset, MediaKind};

named_enum! {
    /// What a content item delivers to its audience.
    pub enum ContentKind: "content kind" {
        Video => "video",
        Audio => "audio",
        Written => "written",
    }
}

impl ContentKind {
    /// The media kind a backing asset must have, or `None` for written
    /// content which must not reference an asset at all.
    pub fn required_media_kind(&self) -> Option<MediaKind> {
        match self {
            ContentKind::Video => Some(MediaKind::Video),
            ContentKind::Audio => Some(MediaKind::Audio),
            ContentKind::Written => None,
        }
    }

    pub fn requires_media(&self) -> bool {
        self.required_media_kind().is_some()
    }
}

named_enum! {
    /// Who can discover the item once published.
    #[derive(Default)]
    pub enum Visibility: "visibility" {
        #[default]
        Public => "public",
        Unlisted => "unlisted",
        Private => "private",
    }
}

named_enum! {
    /// Draft/published/archived lifecycle flag. Independent of the backing
    /// asset's transcoding status.
    pub enum PublicationStatus: "publication status" {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

/// A publishable, priceable unit of video, audio or written material.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentItem {
    pub id: ContentItemID,
    pub owner_id: OwnerID,
    pub organization_id: Option<OrganizationID>,
    pub media_asset_id: Option<MediaAssetID>,
    pub title: String,
    pub slug: String,
    pub kind: ContentKind,
    pub visibility: Visibility,
    /// `None` means free.
    pub price_cents: Option<i64>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub body: Option<String>,
    pub publication_status: PublicationStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub purchase_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    pub fn is_published(&self) -> bool {
        self.publication_status == PublicationStatus::Published
    }

    pub fn is_free(&self) -> bool {
        self.price_cents.is_none()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A content item with its backing asset resolved.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentItemDetails {
    pub item: ContentItem,
    pub media_asset: Option<MediaAsset>,
}

/// Input for creating a content item. The organization comes from the
/// caller's ownership scope, not from this payload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewContentItem {
    pub title: String,
    pub slug: String,
    pub kind: ContentKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub media_asset_id: Option<MediaAssetID>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub visibility: Visibility,
    #[cfg_attr(feature = "serde", serde(default))]
    pub price_cents: Option<i64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub body: Option<String>,
}

impl NewContentItem {
    /// Minimal written item; handy for seeding and tests.
    pub fn written(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            kind: ContentKind::Written,
            media_asset_id: None,
            visibility: Visibility::default(),
            price_cents: None,
            category: None,
            tags: Vec::new(),
            body: None,
        }
    }

    /// Minimal media-backed item.
    pub fn with_media(
        title: impl Into<String>,
        slug: impl Into<String>,
        kind: ContentKind,
        media_asset_id: MediaAssetID,
    ) -> Self {
        Self {
            kind,
            media_asset_id: Some(media_asset_id),
            ..Self::written(title, slug)
        }
    }
}

/// Metadata edit for a content item. `None` leaves a field untouched; for
/// the nullable fields `Some(None)` clears the value, so `price_cents:
/// Some(None)` makes the item free.
///
/// `media_asset_id` exists only so a caller that forwards it can be told the
/// link is immutable; any value is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentItemPatch {
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub slug: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub visibility: Option<Visibility>,
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub price_cents: Option<Option<i64>>,
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub category: Option<Option<String>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Option<Vec<String>>,
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub body: Option<Option<String>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub media_asset_id: Option<MediaAssetID>,
}

impl ContentItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.visibility.is_none()
            && self.price_cents.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.body.is_none()
            && self.media_asset_id.is_none()
    }
}
