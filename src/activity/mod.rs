//! Tautulli activity API access and session classification

pub mod classifier;
pub mod client;

pub use classifier::{classify, Aggregate};
pub use client::{ActivityClient, RawSession};
