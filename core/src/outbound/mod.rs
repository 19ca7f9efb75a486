//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of the domain port traits:
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: a mutex-guarded in-memory store backing every port, used by
//!   the integration tests and embeddable by consumers for theirs
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic
//! beyond the transactional invariants the ports demand.

pub mod memory;
pub mod persistence;
