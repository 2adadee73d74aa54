// src/lib.rs

//! mensa-core: the domain core of a food-ordering platform.
//!
//! Two components carry the real invariants:
//!  - The order lifecycle state machine: role-keyed status transitions over
//!    a static table, with terminal states and compare-and-set persistence.
//!  - The rating aggregator: a restaurant's denormalized (average, count)
//!    pair, kept consistent with its review set on every review write.
//!
//! Around them sit the domain models, the error taxonomy, and the
//! [`store::Store`] trait — the persistence seam both services run on.
//! Backends are interchangeable; this crate ships an in-memory one, the
//! server crate adds PostgreSQL.
//!
//! Both services are stateless: all state lives behind the store.

pub mod error;
pub mod model;
pub mod order;
pub mod review;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::error::{CoreError, CoreResult};

pub use crate::model::{Actor, CreateOrder, Order, OrderDetail, OrderLine, Restaurant, Review, User};

pub use crate::order::{allowed_targets, can_transition, OrderService, OrderStatus, Role};

pub use crate::review::{ReviewEligibility, ReviewPolicy, ReviewService};

pub use crate::store::memory::MemoryStore;
pub use crate::store::Store;
