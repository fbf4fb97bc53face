//! PostgreSQL-backed stores. Every multi-statement write runs in one transaction.

mod connections;
mod matches;
mod profiles;

pub use connections::PgConnectionStore;
pub use matches::PgMatchStore;
pub use profiles::PgProfileSource;
