//! # tabula-test: test support
//!
//! - [`TestApp`]: in-process HTTP client driving an assembled router.
//! - [`MockBackend`]: in-memory [`Backend`](tabula_data::Backend) with call
//!   recording and scripted failures.

mod app;
mod mock;

pub use app::{resolve_path, TestApp, TestRequest, TestResponse};
pub use mock::{Call, MockBackend};
