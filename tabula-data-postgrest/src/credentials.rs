use tabula_data::DataError;

/// Message carried by the configuration error raised when either credential
/// is absent or empty.
pub const MISSING_CREDENTIALS: &str =
    "Missing Supabase credentials. Please set SUPABASE_URL and SUPABASE_KEY environment variables.";

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VAR: &str = "SUPABASE_KEY";

/// Project URL and API key of the hosted backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl Credentials {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }

    /// Read `SUPABASE_URL` and `SUPABASE_KEY` from the process environment.
    pub fn from_env() -> Result<Self, DataError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read both credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|v| !v.is_empty());
        match (present(URL_VAR), present(KEY_VAR)) {
            (Some(url), Some(key)) => Ok(Self { url, key }),
            _ => Err(DataError::Configuration(MISSING_CREDENTIALS.into())),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_both_present() {
        let creds = Credentials::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(creds, Credentials::new("https://abc.supabase.co", "anon"));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = Credentials::from_lookup(lookup(&[("SUPABASE_URL", "https://abc.supabase.co")]))
            .unwrap_err();
        assert!(matches!(err, DataError::Configuration(_)));
        assert_eq!(err.to_string(), MISSING_CREDENTIALS);
    }

    #[test]
    fn test_empty_url_counts_as_missing() {
        let err = Credentials::from_lookup(lookup(&[
            ("SUPABASE_URL", ""),
            ("SUPABASE_KEY", "anon"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), MISSING_CREDENTIALS);
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = Credentials::new("https://abc.supabase.co", "service-role-secret");
        assert!(!format!("{creds:?}").contains("service-role-secret"));
    }
}
