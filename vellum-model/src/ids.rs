use std::str::FromStr;

use uuid::Uuid;

use crate::error::ModelError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                $name(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                $name(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.trim().is_empty() {
                    return Err(ModelError::InvalidId {
                        kind: $label,
                        value: s.to_string(),
                    });
                }
                Uuid::parse_str(s.trim()).map($name).map_err(|_| {
                    ModelError::InvalidId {
                        kind: $label,
                        value: s.to_string(),
                    }
                })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of an uploaded media asset.
    MediaAssetID,
    "media asset"
);

uuid_id!(
    /// Identifier of a publishable content item.
    ContentItemID,
    "content item"
);

uuid_id!(
    /// Identity of the creator that owns a record. Supplied by the
    /// authentication layer and trusted as-is.
    OwnerID,
    "owner"
);

uuid_id!(
    /// Secondary grouping key for organization-owned content.
    OrganizationID,
    "organization"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hyphenated_uuid() {
        let raw = "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa";
        let id: OwnerID = raw.parse().expect("valid owner id");
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn rejects_blank_and_garbage() {
        assert!(matches!(
            "".parse::<MediaAssetID>(),
            Err(ModelError::InvalidId { kind: "media asset", .. })
        ));
        assert!("not-a-uuid".parse::<ContentItemID>().is_err());
    }

    #[test]
    fn generated_ids_are_v7() {
        let id = ContentItemID::new();
        assert_eq!(id.as_uuid().get_version_num(), 7);
        assert_ne!(id, ContentItemID::new());
    }
}
