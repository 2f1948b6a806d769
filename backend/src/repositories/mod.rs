//! Request storage: the `RequestStore` seam plus in-memory and Postgres
//! implementations.

pub mod memory;
pub mod postgres;
pub mod request;
pub mod transaction;

pub use memory::InMemoryRequestStore;
pub use postgres::PgRequestStore;
pub use request::{CommitOutcome, RequestListFilters, RequestScope, RequestStore};
