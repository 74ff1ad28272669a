//! Query functions, one module per table.

pub mod activities;
pub mod headers;
pub mod items;
pub mod norms;
pub mod plantations;
