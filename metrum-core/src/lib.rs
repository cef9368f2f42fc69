//! Metrum Core - Fundamental numeric type
//!
//! This crate provides the arbitrary precision `Number` shared by the
//! metrum crates. Units use it for exponents, quantities for magnitudes.

mod number;

pub use number::{Number, NumberError, DEFAULT_PRECISION};
