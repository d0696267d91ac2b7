//! # tabula-data-postgrest: PostgREST backend for the Tabula data layer
//!
//! Implements [`tabula_data::Backend`] over HTTP against a PostgREST-compatible
//! service such as Supabase.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PostgrestClient`] | reqwest-based client translating `TableQuery` and RPC calls |
//! | [`ClientOptions`] | Schema profile and request timeout |
//! | [`Credentials`] | `SUPABASE_URL` / `SUPABASE_KEY` pair |
//! | [`ConnectionProvider`] | Owner of the shared client, with a process-wide instance |
//! | [`ReqwestErrorExt`] | Converts `reqwest::Error` → `DataError` (`.into_data_error()`) |
//!
//! # Quick start
//!
//! ```ignore
//! use tabula_data::prelude::*;
//! use tabula_data_postgrest::ConnectionProvider;
//!
//! let provider = ConnectionProvider::get_instance()?;
//! let registry = RepositoryRegistry::new(provider.client().clone());
//! let users = registry.resolve("users").find_all().await?;
//! ```

pub mod client;
pub mod credentials;
pub mod error;
pub mod provider;

pub use client::{ClientOptions, PostgrestClient, SINGLE_OBJECT};
pub use credentials::{Credentials, MISSING_CREDENTIALS};
pub use error::{PostgrestResult, ReqwestErrorExt};
pub use provider::ConnectionProvider;

/// Re-exports of the most commonly used types from both `tabula-data` and this crate.
pub mod prelude {
    pub use crate::{ClientOptions, ConnectionProvider, Credentials, PostgrestClient};
    pub use tabula_data::prelude::*;
}
