//! The provider contract.

use async_trait::async_trait;

use crate::capability::Capability;
use crate::error::BackendResult;

/// One interchangeable backend implementation of a capability.
///
/// A provider exposes exactly two router-visible operations: invoking the
/// capability with a typed request, and a standalone health probe. The
/// router treats both as opaque suspending calls.
#[async_trait]
pub trait Provider<C: Capability>: Send + Sync {
    /// Provider name, unique within its capability kind.
    fn name(&self) -> &str;

    /// Invoke the capability against this backend.
    async fn invoke(&self, request: C::Request) -> BackendResult<C::Response>;

    /// Independent health probe (default: always healthy).
    ///
    /// Implementations should hit a cheap backend endpoint rather than run
    /// a full inference call.
    async fn probe(&self) -> BackendResult<()> {
        Ok(())
    }
}
