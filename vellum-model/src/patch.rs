//! Helpers for tri-state patch fields.
//!
//! A nullable column is patched through `Option<Option<T>>`: absent leaves
//! the value alone, `null` clears it, anything else replaces it.

/// Maps a present field (including `null`) to `Some`, so serde's `default`
/// only covers the absent case.
#[cfg(feature = "serde")]
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Some)
}

/// The replacement value of a tri-state field, if it sets one.
pub fn assigned<T>(field: &Option<Option<T>>) -> Option<&T> {
    field.as_ref().and_then(Option::as_ref)
}
