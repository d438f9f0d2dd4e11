//! Boundary to the remote service. HTTP, authentication and sessions live behind this trait.

use crate::error::TransportError;
use crate::wire::Request;
use async_trait::async_trait;

/// Executes one assembled request and returns the raw response body. Connectivity and
/// authentication failures are `Err`; remote error envelopes are returned as bytes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: &Request) -> Result<Vec<u8>, TransportError>;
}
