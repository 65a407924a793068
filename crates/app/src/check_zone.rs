//! Zone-check use case: one round trip to the zone classification service.

use quick_evac_domain::{ApiError, LocationCheckRequest, LocationCheckResult};
use quick_evac_ports::{LogFields, LoggerPort, TelemetryPort, TelemetryTags, ZoneCheckPort};
use quick_evac_shared::RequestContext;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Dependencies required by the zone check.
#[derive(Clone)]
pub struct CheckZoneDeps {
    /// Zone-check service client.
    pub zone_check: Arc<dyn ZoneCheckPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Send the request and return the classified outcome. Never retries.
#[tracing::instrument(
    name = "app.zone_check",
    skip_all,
    fields(correlation_id = %ctx.correlation_id())
)]
pub async fn check_zone(
    ctx: &RequestContext,
    deps: &CheckZoneDeps,
    request: LocationCheckRequest,
) -> Result<LocationCheckResult, ApiError> {
    let started_at = Instant::now();
    let timer = deps
        .telemetry
        .as_ref()
        .map(|telemetry| telemetry.start_timer("client.zoneCheck.request", None));

    if let Some(logger) = deps.logger.as_ref() {
        logger.debug(
            "client.zoneCheck.request",
            "Zone check requested",
            Some(log_fields_request(&request)),
        );
    }

    let outcome = deps.zone_check.check(ctx, request).await;

    if let Some(timer) = timer.as_ref() {
        timer.stop();
    }

    match &outcome {
        Ok(result) => {
            count(deps, "success");
            if let Some(logger) = deps.logger.as_ref() {
                logger.info(
                    "client.zoneCheck.completed",
                    "Zone check completed",
                    Some(log_fields_completed(result, started_at)),
                );
            }
        },
        Err(error) => {
            count(deps, error.code());
            if let Some(logger) = deps.logger.as_ref() {
                logger.warn(
                    "client.zoneCheck.failed",
                    "Zone check failed",
                    Some(log_fields_error(error, started_at)),
                );
            }
        },
    }

    outcome
}

fn count(deps: &CheckZoneDeps, outcome: &str) {
    if let Some(telemetry) = deps.telemetry.as_ref() {
        let mut tags = TelemetryTags::new();
        tags.insert("outcome".into(), outcome.into());
        telemetry.increment_counter("client.zoneCheck.request", 1, Some(&tags));
    }
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn log_fields_request(request: &LocationCheckRequest) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert(
        "phoneNumber".into(),
        Value::String(request.phone_number.as_str().to_owned()),
    );
    fields.insert(
        "latitude".into(),
        Value::from(request.location.latitude()),
    );
    fields.insert(
        "longitude".into(),
        Value::from(request.location.longitude()),
    );
    fields
}

fn log_fields_completed(result: &LocationCheckResult, started_at: Instant) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("inDangerZone".into(), Value::from(result.in_danger_zone));
    if let Some(zone) = result.danger_zone() {
        fields.insert("zoneId".into(), Value::String(zone.id.as_str().to_owned()));
        fields.insert(
            "zoneType".into(),
            Value::String(zone.zone_type.as_str().to_owned()),
        );
    }
    fields.insert(
        "hasEvacuation".into(),
        Value::from(result.evacuation.is_some()),
    );
    fields.insert(
        "durationMs".into(),
        Value::from(duration_ms(started_at)),
    );
    fields
}

fn log_fields_error(error: &ApiError, started_at: Instant) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("code".into(), Value::String(error.code().to_owned()));
    fields.insert("error".into(), Value::String(error.to_string()));
    fields.insert(
        "durationMs".into(),
        Value::from(duration_ms(started_at)),
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_evac_adapters::{JsonLogger, MemoryLogSink};
    use quick_evac_domain::{Coordinates, NormalizedPhoneNumber};
    use quick_evac_ports::BoxFuture;

    struct Canned(Result<LocationCheckResult, ApiError>);

    impl ZoneCheckPort for Canned {
        fn check(
            &self,
            _ctx: &RequestContext,
            _request: LocationCheckRequest,
        ) -> BoxFuture<'_, Result<LocationCheckResult, ApiError>> {
            let answer = self.0.clone();
            Box::pin(async move { answer })
        }
    }

    fn request() -> Result<LocationCheckRequest, Box<dyn std::error::Error>> {
        Ok(LocationCheckRequest::new(
            NormalizedPhoneNumber::parse("555-123-4567")?,
            Coordinates::new(40.0, -75.0)?,
        ))
    }

    #[tokio::test]
    async fn failure_is_logged_without_the_raw_number() -> Result<(), Box<dyn std::error::Error>> {
        let sink = Arc::new(MemoryLogSink::default());
        let deps = CheckZoneDeps {
            zone_check: Arc::new(Canned(Err(ApiError::NetworkError {
                detail: "connection refused".into(),
            }))),
            logger: Some(Arc::new(
                JsonLogger::new(sink.clone()).with_min_level(quick_evac_ports::LogLevel::Debug),
            )),
            telemetry: None,
        };

        let outcome = check_zone(&RequestContext::new_check(), &deps, request()?).await;
        assert!(matches!(outcome, Err(ApiError::NetworkError { .. })));

        let lines = sink.json_lines()?;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "client.zoneCheck.request");
        assert_eq!(lines[0]["fields"]["phoneNumber"], "******4567");
        assert_eq!(lines[1]["event"], "client.zoneCheck.failed");
        assert_eq!(lines[1]["fields"]["code"], "network");
        Ok(())
    }

    #[tokio::test]
    async fn success_passes_the_result_through() -> Result<(), Box<dyn std::error::Error>> {
        let here = Coordinates::new(40.0, -75.0)?;
        let deps = CheckZoneDeps {
            zone_check: Arc::new(Canned(Ok(LocationCheckResult::safe(here)))),
            logger: None,
            telemetry: None,
        };

        let result = check_zone(&RequestContext::new_check(), &deps, request()?).await?;
        assert!(!result.in_danger_zone);
        Ok(())
    }
}
