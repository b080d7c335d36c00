//! Steamstats Core - shared infrastructure for the metadata fetch pipeline
//!
//! Transport with retry/backoff, record types, identifier input,
//! TSV export, logging and progress plumbing.

pub mod error;
pub mod export;
pub mod input;
pub mod logging;
pub mod progress;
pub mod record;
pub mod retry;
pub mod shutdown;
pub mod similarity;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-exports for convenience
pub use error::{InputError, TransportError};
pub use export::{COLUMNS, TsvSink, export_record, slugify, write_table};
pub use input::read_identifiers;
pub use logging::init_logging;
pub use progress::{ProgressContext, SharedProgress};
pub use record::{AppId, FieldValue, MergedRecord, PartialRecord, ResultSet, store_url};
pub use retry::RetryPolicy;
pub use shutdown::{install_signal_handlers, is_shutdown_requested, request_shutdown, shutdown_flag};
pub use similarity::name_similarity;
pub use transport::{
    HttpConfig, HttpGet, HttpResponse, ReqwestGet, SHARED_RUNTIME, Sleep, ThreadSleep, Transport,
    http_client, set_http_config,
};
