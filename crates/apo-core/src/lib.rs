//! Core logic of the APO service: norm resolution, draft generation, the
//! estimate ledger with its budget invariant, and the role-gated state
//! machines for items and headers.
//!
//! Every operation takes the connection pool as an argument; there is no
//! ambient global state, which keeps the components testable against a
//! throwaway database.

pub mod approval;
pub mod draft;
pub mod error;
pub mod ledger;
pub mod norms;
pub mod transition;

pub use error::{CoreError, Result};
