//! Query plan surfaces consumed by the index tuner.
//!
//! The tuner never builds or executes plans; it only walks them. This crate
//! carries the two plan shapes the plan cache may hold (logical, preferred,
//! and physical, fallback) and the cache itself.

pub mod cache;
pub mod logical;
pub mod physical;
