//! Types shared between the purchase-order client and anything speaking its
//! wire format.

pub mod domain;
pub mod error;
pub mod protocol;
