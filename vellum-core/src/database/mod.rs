//! Persistence layer: ports, adapters and the Postgres connection.

pub mod infrastructure;
pub mod ports;
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;

pub use infrastructure::memory::MemoryCatalog;
#[cfg(feature = "postgres")]
pub use postgres::{DatabaseSettings, PostgresCatalog};
