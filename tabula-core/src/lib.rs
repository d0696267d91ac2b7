//! # tabula-core: shared runtime pieces
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | [`TabulaConfig`]: YAML + profile + `.env` + environment layering |
//! | [`error`] | [`ApiError`], the handler error rendered as a failure envelope |
//! | [`response`] | [`ApiResponse`], the `{success, data}` / `{success, error}` envelope |
//! | [`layers`] | tracing setup and the tower layers every router gets |
//! | [`http`] | axum re-exports |

pub mod config;
pub mod error;
pub mod http;
pub mod layers;
pub mod response;

pub use config::{
    ConfigError, ConfigValue, DefaultSecretResolver, FromConfigValue, SecretResolver, TabulaConfig,
};
pub use error::{route_not_found, ApiError};
pub use layers::{
    catch_panic_layer, default_cors, default_trace, init_tracing, init_tracing_with, LogFormat,
};
pub use response::{ApiResponse, ApiResult};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::http::{IntoResponse, Json, Path, Query, Router, State, StatusCode};
    pub use crate::{ApiError, ApiResponse, ApiResult, TabulaConfig};
}
