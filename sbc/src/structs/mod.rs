//! Data structures representing format components.
//!
//! Contains the frame header and descriptor along with the bit allocation
//! shared by the encoder and decoder.

pub mod allocation;
pub mod frame;
