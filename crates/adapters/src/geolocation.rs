//! Geolocation adapters for hosts without a live position source.
//!
//! A command-line host has no GPS; the position is supplied by the operator
//! (or absent, which reads as "capability unsupported").

use quick_evac_ports::{BoxFuture, Coordinates, GeoError, GeolocationPort, PositionOptions};
use quick_evac_shared::RequestContext;

/// Geolocation that always resolves to the same outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixedGeolocation {
    /// Report this position.
    Position(Coordinates),
    /// Fail with this error (e.g. the operator denied location access).
    Failing(GeoError),
    /// The host has no geolocation capability.
    Unsupported,
}

impl FixedGeolocation {
    /// Build from optional operator-supplied coordinates.
    #[must_use]
    pub const fn from_option(position: Option<Coordinates>) -> Self {
        match position {
            Some(position) => Self::Position(position),
            None => Self::Unsupported,
        }
    }
}

impl GeolocationPort for FixedGeolocation {
    fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    fn current_position(
        &self,
        ctx: &RequestContext,
        _options: PositionOptions,
    ) -> BoxFuture<'_, Result<Coordinates, GeoError>> {
        let outcome = match *self {
            _ if ctx.is_cancelled() => Err(GeoError::Unknown),
            Self::Position(position) => Ok(position),
            Self::Failing(error) => Err(error),
            Self::Unsupported => Err(GeoError::Unsupported),
        };
        Box::pin(async move { outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn options() -> PositionOptions {
        PositionOptions::fresh(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn fixed_position_resolves() -> Result<(), Box<dyn std::error::Error>> {
        let position = Coordinates::new(40.0, -75.0)?;
        let geolocation = FixedGeolocation::from_option(Some(position));
        let ctx = RequestContext::new_check();

        assert!(geolocation.is_supported());
        assert_eq!(geolocation.current_position(&ctx, options()).await, Ok(position));
        Ok(())
    }

    #[tokio::test]
    async fn missing_position_is_unsupported() {
        let geolocation = FixedGeolocation::from_option(None);
        let ctx = RequestContext::new_check();

        assert!(!geolocation.is_supported());
        assert_eq!(
            geolocation.current_position(&ctx, options()).await,
            Err(GeoError::Unsupported)
        );
    }

    #[tokio::test]
    async fn failing_reports_its_error() {
        let geolocation = FixedGeolocation::Failing(GeoError::PermissionDenied);
        let ctx = RequestContext::new_check();

        assert_eq!(
            geolocation.current_position(&ctx, options()).await,
            Err(GeoError::PermissionDenied)
        );
    }
}
