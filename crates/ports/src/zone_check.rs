//! Zone-check service boundary contract.

use crate::BoxFuture;
use quick_evac_domain::{ApiError, LocationCheckRequest, LocationCheckResult};
use quick_evac_shared::RequestContext;

/// Boundary contract for the remote zone classification service.
///
/// One call is one round trip. Implementations do not retry.
pub trait ZoneCheckPort: Send + Sync {
    /// Ask whether the request's position lies in a hazard zone.
    fn check(
        &self,
        ctx: &RequestContext,
        request: LocationCheckRequest,
    ) -> BoxFuture<'_, Result<LocationCheckResult, ApiError>>;
}
