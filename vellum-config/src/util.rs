use std::str::FromStr;

use url::Url;

const REDACTED: &str = "****";

/// Reads and parses an environment variable, ignoring unparsable values.
pub fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
}

/// Masks the password of a connection URL for display. Strings that do not
/// parse as URLs are masked entirely.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some(REDACTED));
            }
            url.to_string()
        }
        Err(_) => REDACTED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_masked() {
        assert_eq!(
            redact_url("postgresql://app:hunter2@db:5432/vellum"),
            "postgresql://app:****@db:5432/vellum"
        );
        assert_eq!(
            redact_url("postgresql://db/vellum"),
            "postgresql://db/vellum"
        );
        assert_eq!(redact_url("not a url"), "****");
    }
}
