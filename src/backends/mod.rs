//! Backend implementations.

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "aws")]
pub mod aws;

#[cfg(feature = "postgres")]
pub mod postgres;
