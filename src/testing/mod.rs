//! Testing infrastructure for the kanban core.
//!
//! - **Mocks**: a key-value store that fails on demand, for driving
//!   multi-write operations into partial failure
//! - **Assertions**: panicking checks for the board/task invariants
//!
//! # Example
//!
//! ```rust
//! use kanban::config::KanbanConfig;
//! use kanban::coordinator::BoardCoordinator;
//! use kanban::testing::{assert_membership_exclusive, MockStore};
//!
//! let mut coordinator =
//!     BoardCoordinator::open(MockStore::new(), &KanbanConfig::default()).unwrap();
//! let board = coordinator.create_board("Home", "").unwrap();
//! assert_membership_exclusive(&board);
//! ```

pub mod assertions;
pub mod mocks;

pub use assertions::*;
pub use mocks::*;
