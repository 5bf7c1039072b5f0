use chrono::{DateTime, Utc};

use crate::ids::{MediaAssetID, OwnerID};
use crate::macros::named_enum;

named_enum! {
    /// What kind of file an asset holds.
    pub enum MediaKind: "media kind" {
        Video => "video",
        Audio => "audio",
    }
}

named_enum! {
    /// Processing state of an uploaded asset.
    pub enum MediaAssetStatus: "media asset status" {
        Uploading => "uploading",
        Uploaded => "uploaded",
        Transcoding => "transcoding",
        Ready => "ready",
        Failed => "failed",
    }
}

impl MediaAssetStatus {
    /// Transition table: the statuses reachable from `self` in one step.
    ///
    /// `uploading → uploaded → transcoding → {ready, failed}`. There are no
    /// self-loops and no backward edges; `ready` and `failed` are terminal.
    pub fn legal_successors(&self) -> &'static [MediaAssetStatus] {
        use MediaAssetStatus::*;
        match self {
            Uploading => &[Uploaded],
            Uploaded => &[Transcoding],
            Transcoding => &[Ready, Failed],
            Ready | Failed => &[],
        }
    }

    pub fn can_transition_to(&self, next: MediaAssetStatus) -> bool {
        self.legal_successors().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.legal_successors().is_empty()
    }
}

/// An uploaded audio/video file and its transcoded derivatives.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaAsset {
    pub id: MediaAssetID,
    pub owner_id: OwnerID,
    pub kind: MediaKind,
    pub status: MediaAssetStatus,
    pub title: Option<String>,
    pub description: Option<String>,
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub playlist_key: Option<String>,
    pub thumbnail_key: Option<String>,
    pub duration_seconds: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub preview_playlist_key: Option<String>,
    pub waveform_key: Option<String>,
    pub waveform_image_key: Option<String>,
    pub mezzanine_key: Option<String>,
    pub ready_variants: Vec<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ready_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MediaAsset {
    pub fn is_ready(&self) -> bool {
        self.status == MediaAssetStatus::Ready
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the row satisfies the "ready implies rendition" invariant.
    pub fn rendition_consistent(&self) -> bool {
        self.status != MediaAssetStatus::Ready
            || (self.playlist_key.is_some()
                && self.thumbnail_key.is_some()
                && self.duration_seconds.is_some())
    }
}

/// Input for registering a new upload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewMediaAsset {
    pub kind: MediaKind,
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

/// Free-form metadata edit. `None` leaves a field untouched and `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaAssetPatch {
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub title: Option<Option<String>>,
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "crate::patch::nullable",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub description: Option<Option<String>>,
}

impl MediaAssetPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Playback derivatives written together with the move into `ready`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadyRendition {
    pub playlist_key: String,
    pub thumbnail_key: String,
    pub duration_seconds: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub preview_playlist_key: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub waveform_key: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub waveform_image_key: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mezzanine_key: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ready_variants: Vec<String>,
}

impl ReadyRendition {
    pub fn new(
        playlist_key: impl Into<String>,
        thumbnail_key: impl Into<String>,
        duration_seconds: i32,
    ) -> Self {
        Self {
            playlist_key: playlist_key.into(),
            thumbnail_key: thumbnail_key.into(),
            duration_seconds,
            ..Self::default()
        }
    }

    pub fn with_dimensions(mut self, width: i32, height: i32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Completion report emitted by the transcoding worker for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "status", rename_all = "snake_case")
)]
pub enum TranscodingOutcome {
    Completed {
        #[cfg_attr(feature = "serde", serde(rename = "hlsMasterPlaylistKey"))]
        playlist_key: Option<String>,
        #[cfg_attr(feature = "serde", serde(rename = "hlsPreviewKey", default))]
        preview_playlist_key: Option<String>,
        #[cfg_attr(feature = "serde", serde(rename = "thumbnailKey", default))]
        thumbnail_key: Option<String>,
        #[cfg_attr(feature = "serde", serde(rename = "waveformKey", default))]
        waveform_key: Option<String>,
        #[cfg_attr(
            feature = "serde",
            serde(rename = "waveformImageKey", default)
        )]
        waveform_image_key: Option<String>,
        #[cfg_attr(feature = "serde", serde(rename = "mezzanineKey", default))]
        mezzanine_key: Option<String>,
        #[cfg_attr(feature = "serde", serde(rename = "durationSeconds"))]
        duration_seconds: Option<i32>,
        #[cfg_attr(feature = "serde", serde(default))]
        width: Option<i32>,
        #[cfg_attr(feature = "serde", serde(default))]
        height: Option<i32>,
        #[cfg_attr(feature = "serde", serde(rename = "readyVariants", default))]
        ready_variants: Vec<String>,
    },
    Failed {
        #[cfg_attr(feature = "serde", serde(default))]
        error: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_pipeline() {
        use MediaAssetStatus::*;
        assert!(Uploading.can_transition_to(Uploaded));
        assert!(Uploaded.can_transition_to(Transcoding));
        assert!(Transcoding.can_transition_to(Ready));
        assert!(Transcoding.can_transition_to(Failed));

        for status in MediaAssetStatus::ALL {
            assert!(!status.can_transition_to(*status), "{status} self-loop");
        }
        assert!(!Uploading.can_transition_to(Transcoding));
        assert!(!Transcoding.can_transition_to(Uploaded));
        assert!(!Failed.can_transition_to(Transcoding));
        assert!(Ready.is_terminal());
        assert!(Failed.is_terminal());
    }

    #[test]
    fn status_names_round_trip_through_from_str() {
        for status in MediaAssetStatus::ALL {
            assert_eq!(status.as_str().parse::<MediaAssetStatus>(), Ok(*status));
        }
        assert!("done".parse::<MediaAssetStatus>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn worker_report_deserializes() {
        let raw = r#"{
            "status": "completed",
            "hlsMasterPlaylistKey": "u/hls/m/master.m3u8",
            "thumbnailKey": null,
            "waveformImageKey": "u/waveforms/m.png",
            "durationSeconds": 184,
            "readyVariants": ["128k", "64k"]
        }"#;
        let outcome: TranscodingOutcome =
            serde_json::from_str(raw).expect("completed payload");
        match outcome {
            TranscodingOutcome::Completed {
                playlist_key,
                thumbnail_key,
                waveform_image_key,
                duration_seconds,
                ready_variants,
                ..
            } => {
                assert_eq!(playlist_key.as_deref(), Some("u/hls/m/master.m3u8"));
                assert!(thumbnail_key.is_none());
                assert_eq!(waveform_image_key.as_deref(), Some("u/waveforms/m.png"));
                assert_eq!(duration_seconds, Some(184));
                assert_eq!(ready_variants, vec!["128k", "64k"]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        let failed: TranscodingOutcome =
            serde_json::from_str(r#"{"status":"failed","error":"ffmpeg exited 1"}"#)
                .expect("failed payload");
        assert_eq!(
            failed,
            TranscodingOutcome::Failed {
                error: Some("ffmpeg exited 1".into())
            }
        );
    }
}
