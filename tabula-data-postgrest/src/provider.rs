use crate::client::{ClientOptions, PostgrestClient};
use crate::credentials::Credentials;
use std::sync::{Arc, OnceLock};
use tabula_data::DataError;

static PROVIDER: OnceLock<Arc<ConnectionProvider>> = OnceLock::new();

/// Owner of the single backend handle shared by every repository.
///
/// Either build one explicitly with [`from_credentials`](Self::from_credentials)
/// and inject it, or use the process-wide [`get_instance`](Self::get_instance).
#[derive(Debug)]
pub struct ConnectionProvider {
    client: Arc<PostgrestClient>,
}

impl ConnectionProvider {
    pub fn from_credentials(
        credentials: &Credentials,
        options: &ClientOptions,
    ) -> Result<Self, DataError> {
        let client = PostgrestClient::new(credentials, options)?;
        tracing::info!(
            url = %credentials.url,
            schema = %options.schema,
            "backend client configured"
        );
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Build from `SUPABASE_URL` / `SUPABASE_KEY`.
    pub fn from_env(options: &ClientOptions) -> Result<Self, DataError> {
        Self::from_credentials(&Credentials::from_env()?, options)
    }

    /// Process-wide provider, built from the environment on first success.
    ///
    /// A failed build is not remembered; the next call reads the environment
    /// again. Concurrent first callers may each build a provider, but only one
    /// is published and all of them get that one.
    pub fn get_instance() -> Result<Arc<Self>, DataError> {
        if let Some(provider) = PROVIDER.get() {
            return Ok(provider.clone());
        }
        let provider = Arc::new(Self::from_env(&ClientOptions::default())?);
        let _ = PROVIDER.set(provider.clone());
        Ok(PROVIDER.get().cloned().unwrap_or(provider))
    }

    /// The shared backend handle.
    pub fn client(&self) -> &Arc<PostgrestClient> {
        &self.client
    }
}
