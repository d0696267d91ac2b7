//! # tabula-server
//!
//! Exposes dynamic tables over HTTP. Routes live under
//! `<api.prefix>/supabase` and answer with the `{success, data}` /
//! `{success, error}` envelope.
//!
//! The router is generic over the [`Backend`] so tests can mount it on an
//! in-memory store.

pub mod config;
pub mod handlers;
pub mod state;

use tabula_core::http::routing::{delete, get};
use tabula_core::http::Router;
use tabula_core::{catch_panic_layer, default_cors, default_trace, route_not_found};
use tabula_data::Backend;

pub use config::ServerConfig;
pub use state::AppState;

/// Path the table routes are nested under for a given API prefix.
pub fn mount_path(api_prefix: &str) -> String {
    let prefix = api_prefix.trim().trim_matches('/');
    if prefix.is_empty() {
        "/supabase".to_string()
    } else {
        format!("/{prefix}/supabase")
    }
}

/// Table routes, relative to [`mount_path`].
pub fn table_routes<B: Backend>(state: AppState<B>) -> Router {
    use handlers::*;

    Router::new()
        .route("/tables", get(list_tables::<B>).post(create_table::<B>))
        .route("/tables/{table_name}", delete(drop_table::<B>))
        .route("/tables/{table_name}/exists", get(table_exists::<B>))
        .route("/tables/{table_name}/count", get(count_rows::<B>))
        .route(
            "/tables/{table_name}/data",
            get(query_rows::<B>)
                .post(upsert_row::<B>)
                .patch(patch_rows::<B>),
        )
        .route("/tables/{table_name}/data/{id}", delete(delete_row::<B>))
        .with_state(state)
}

/// The complete application: welcome route, table routes, 404 fallback,
/// panic recovery, request tracing and CORS.
pub fn app<B: Backend>(state: AppState<B>, api_prefix: &str) -> Router {
    Router::new()
        .route("/", get(handlers::welcome))
        .nest(&mount_path(api_prefix), table_routes(state))
        .fallback(route_not_found)
        .layer(catch_panic_layer())
        .layer(default_trace())
        .layer(default_cors())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_path_normalizes_slashes() {
        assert_eq!(mount_path("/api/v1"), "/api/v1/supabase");
        assert_eq!(mount_path("api/v1/"), "/api/v1/supabase");
        assert_eq!(mount_path(""), "/supabase");
        assert_eq!(mount_path("/"), "/supabase");
    }
}
