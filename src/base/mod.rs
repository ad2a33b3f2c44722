//! Failure taxonomy and error plumbing.
//!
//! - [`failure::Failure`]: canonical failure strings
//! - [`operation::Operation`]: what was running when an error occurred
//! - [`classify`]: generic, resolver, TLS and QUIC classifiers
//! - [`errwrapper::WrappedError`]: classified errors with provenance
//! - [`neterror::NetError`]: the crate-wide error type

pub mod classify;
pub mod errno;
pub mod errwrapper;
pub mod failure;
pub mod logger;
pub mod neterror;
pub mod operation;
pub mod scrubber;

#[cfg(test)]
mod tests;
