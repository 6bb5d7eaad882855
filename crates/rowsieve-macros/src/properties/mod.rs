//! Implementation of the `#[derive(Properties)]` macro.
//!
//! This module generates accessor registrations and property name constants
//! from struct fields and their `#[prop(...)]` annotations.

mod attrs;
mod derive;

pub use derive::properties_derive_impl;
