//! Frame-at-a-time bitstream I/O.
//!
//! - **Reader** ([`reader`]): Two-phase probe-then-fill frame assembly
//! - **Writer** ([`writer`]): Batch encoding into back-to-back frames

pub mod reader;
pub mod writer;
