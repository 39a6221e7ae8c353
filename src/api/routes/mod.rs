//! API Routes
//!
//! Route handlers organized by functionality.

pub mod charts;
pub mod countries;
pub mod export;
pub mod health;
pub mod selection;
