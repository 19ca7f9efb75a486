//! Social-graph consistency engine.
//!
//! This crate is the transactional core of a small social network: identities,
//! the friend request/accept lifecycle, symmetric friendship edges, posts with
//! denormalized like counters, a per-(post, user) like ledger, and a durable
//! notification log. Inbound adapters (an HTTP layer, a CLI, tests) call the
//! domain services; driven adapters implement the repository ports, either
//! against PostgreSQL or against the in-memory store.

pub mod domain;
pub mod outbound;
