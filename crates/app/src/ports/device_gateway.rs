//! Device gateway port: read and patch a single actuator block.
//!
//! Implementations are not required to bound their own latency; the engine
//! wraps every call in a timeout.

use std::future::Future;

use brewhub_domain::device::{Block, DeviceRef};
use brewhub_domain::error::BrewhubError;

/// External device-control API.
pub trait DeviceGateway {
    /// Read the full state of a block.
    fn read(&self, device: &DeviceRef) -> impl Future<Output = Result<Block, BrewhubError>> + Send;

    /// Merge `data` into the block and return the resulting state.
    fn patch(
        &self,
        device: &DeviceRef,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<Block, BrewhubError>> + Send;

    /// Whether the gateway can currently serve requests.
    fn is_ready(&self) -> impl Future<Output = bool> + Send;
}
