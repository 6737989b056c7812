//! State store port: durable key/value records.

use std::future::Future;

use brewhub_domain::error::BrewhubError;

/// Durable get/set of JSON documents by namespace and id.
///
/// Plain read-modify-write semantics; there are no transactions.
pub trait StateStore {
    /// Read a document, `None` if it was never written.
    fn get(
        &self,
        namespace: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, BrewhubError>> + Send;

    /// Create or replace a document.
    fn set(
        &self,
        namespace: &str,
        id: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), BrewhubError>> + Send;
}
