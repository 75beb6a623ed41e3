//! Core types for Refill.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod timestamp;

pub use address::{AddressError, BARANGAYS, Barangay, DeliveryAddress};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Amount;
pub use status::*;
pub use timestamp::Timestamp;
