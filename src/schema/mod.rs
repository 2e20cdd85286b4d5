//! Daily log input schema
//!
//! This module defines the shape of one daily form submission and the lenient
//! decoding that lets hand-entered values through without failing a run.

pub mod lenient;
mod raw_entry;

pub use raw_entry::*;
