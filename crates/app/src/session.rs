//! Check session controller.
//!
//! Owns the single live [`CheckSessionState`] and drives it through
//! geolocation, the zone check and the map render. Every transition after a
//! suspension point is applied only if the session generation is unchanged,
//! so a [`CheckSession::reset`] during a check discards late results.

use crate::check_zone::{CheckZoneDeps, check_zone};
use crate::geolocation::{AcquireLocationDeps, AcquireLocationOptions, acquire_location};
use crate::overlay::{MapOverlayRenderer, RouteOutcome};
use quick_evac_domain::{
    CheckSessionState, LocationCheckRequest, NormalizedPhoneNumber, PhoneValidationError,
    SessionEvent,
};
use quick_evac_ports::{
    GeolocationPort, LogFields, LoggerPort, TelemetryPort, TelemetryTags, ZoneCheckPort,
};
use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Dependencies required by a check session.
#[derive(Clone)]
pub struct CheckSessionDeps {
    /// Platform geolocation capability.
    pub geolocation: Arc<dyn GeolocationPort>,
    /// Zone-check service client.
    pub zone_check: Arc<dyn ZoneCheckPort>,
    /// Renderer that owns the map.
    pub renderer: Arc<MapOverlayRenderer>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The check ran to a terminal state.
    Completed(CheckSessionState),
    /// A check was already in flight or a result is on screen; nothing changed.
    Rejected,
    /// The session was reset while the check was in flight.
    Superseded,
}

#[derive(Default)]
struct SessionCore {
    generation: u64,
    in_flight: Option<RequestContext>,
    pending_route: Option<JoinHandle<Result<RouteOutcome>>>,
}

/// Orchestrates one location check at a time.
pub struct CheckSession {
    deps: CheckSessionDeps,
    options: AcquireLocationOptions,
    core: Mutex<SessionCore>,
    state_tx: watch::Sender<CheckSessionState>,
}

impl CheckSession {
    /// Create an idle session.
    pub fn new(deps: CheckSessionDeps) -> Self {
        let (state_tx, _) = watch::channel(CheckSessionState::Idle);
        Self {
            deps,
            options: AcquireLocationOptions::default(),
            core: Mutex::new(SessionCore::default()),
            state_tx,
        }
    }

    /// Override geolocation settings.
    #[must_use]
    pub const fn with_geolocation_options(mut self, options: AcquireLocationOptions) -> Self {
        self.options = options;
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CheckSessionState {
        self.state_tx.borrow().clone()
    }

    /// Whether a check is in flight.
    pub fn is_busy(&self) -> bool {
        self.state_tx.borrow().is_busy()
    }

    /// Observe every transition.
    pub fn subscribe(&self) -> watch::Receiver<CheckSessionState> {
        self.state_tx.subscribe()
    }

    /// Validate the number and run a check.
    ///
    /// Only an idle session accepts a submission. An invalid number leaves the
    /// session idle and returns the validation error.
    #[tracing::instrument(name = "app.session.submit", skip_all)]
    pub async fn submit(&self, raw_phone: &str) -> Result<SubmitOutcome, PhoneValidationError> {
        let (generation, ctx, phone) = {
            let mut core = self.lock_core();
            let current = self.state();
            if current.is_busy() || current.is_terminal() {
                self.log_debug("client.session.submit", "Submission ignored while not idle", None);
                return Ok(SubmitOutcome::Rejected);
            }
            let phone = match NormalizedPhoneNumber::parse(raw_phone) {
                Ok(phone) => phone,
                Err(error) => {
                    self.log_debug(
                        "client.session.submit",
                        "Submission rejected by validation",
                        Some(single_field("digitCount", Value::from(error.digit_count))),
                    );
                    return Err(error);
                },
            };
            let Ok(next) = current.apply(SessionEvent::Submitted(phone.clone())) else {
                return Ok(SubmitOutcome::Rejected);
            };
            let ctx = RequestContext::new_check();
            core.in_flight = Some(ctx.clone());
            self.state_tx.send_replace(next);
            (core.generation, ctx, phone)
        };

        let logger = self.deps.logger.as_ref().map(|logger| {
            Arc::<dyn LoggerPort>::from(logger.child(single_field(
                "correlationId",
                Value::String(ctx.correlation_id().as_str().to_owned()),
            )))
        });
        if let Some(logger) = logger.as_ref() {
            logger.info(
                "client.session.submit",
                "Location check started",
                Some(single_field(
                    "phoneNumber",
                    Value::String(phone.as_str().to_owned()),
                )),
            );
            log_transition(
                logger.as_ref(),
                CheckSessionState::Idle.name(),
                "acquiring_location",
                "submitted",
            );
        }

        let acquire_deps = AcquireLocationDeps {
            geolocation: Arc::clone(&self.deps.geolocation),
            telemetry: self.deps.telemetry.clone(),
        };
        let event = match acquire_location(&ctx, &acquire_deps, self.options).await {
            Ok(location) => SessionEvent::LocationAcquired(location),
            Err(error) => SessionEvent::LocationFailed(error),
        };
        let Some(mut state) = self.advance(generation, event, logger.as_deref()) else {
            return Ok(SubmitOutcome::Superseded);
        };

        if let CheckSessionState::CheckingZone { location, .. } = &state {
            let request = LocationCheckRequest::new(phone, *location);
            let zone_deps = CheckZoneDeps {
                zone_check: Arc::clone(&self.deps.zone_check),
                logger: logger.clone(),
                telemetry: self.deps.telemetry.clone(),
            };
            let event = match check_zone(&ctx, &zone_deps, request).await {
                Ok(result) => SessionEvent::ZoneChecked(Box::new(result)),
                Err(error) => SessionEvent::ZoneCheckFailed(error),
            };
            let Some(next) = self.advance(generation, event, logger.as_deref()) else {
                return Ok(SubmitOutcome::Superseded);
            };
            state = next;
        }

        self.finish(generation, &ctx, &state, logger.as_deref());
        Ok(SubmitOutcome::Completed(state))
    }

    /// Return to idle from any state.
    ///
    /// Discards the phone, result and error, cancels any in-flight request
    /// and tears the map scene down.
    pub fn reset(&self) -> Result<()> {
        let previous = {
            let mut core = self.lock_core();
            core.generation += 1;
            if let Some(ctx) = core.in_flight.take() {
                ctx.cancel();
            }
            if let Some(route) = core.pending_route.take() {
                route.abort();
            }
            let current = self.state();
            let previous = current.name();
            self.state_tx
                .send_replace(current.apply(SessionEvent::Reset).unwrap_or_default());
            previous
        };

        if let Some(logger) = self.deps.logger.as_ref() {
            logger.info(
                "client.session.reset",
                "Session reset",
                Some(single_field("from", Value::from(previous))),
            );
        }
        self.deps.renderer.teardown()
    }

    /// Wait for the evacuation route of the last render, if one is pending.
    pub async fn route_settled(&self) -> Result<Option<RouteOutcome>> {
        let pending = self.lock_core().pending_route.take();
        let Some(pending) = pending else {
            return Ok(None);
        };
        match pending.await {
            Ok(outcome) => outcome.map(Some),
            Err(error) if error.is_cancelled() => Ok(Some(RouteOutcome::Stale)),
            Err(error) => Err(ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                format!("route task failed: {error}"),
                ErrorClass::NonRetriable,
            )),
        }
    }

    fn advance(
        &self,
        generation: u64,
        event: SessionEvent,
        logger: Option<&dyn LoggerPort>,
    ) -> Option<CheckSessionState> {
        let core = self.lock_core();
        let event_name = event.name();
        if core.generation != generation {
            if let Some(logger) = logger {
                logger.info(
                    "client.session.stale",
                    "Discarded result of a superseded check",
                    Some(single_field("event", Value::from(event_name))),
                );
            }
            return None;
        }

        let current = self.state_tx.borrow().clone();
        let from = current.name();
        match current.apply(event) {
            Ok(next) => {
                self.state_tx.send_replace(next.clone());
                drop(core);
                if let Some(logger) = logger {
                    log_transition(logger, from, next.name(), event_name);
                }
                Some(next)
            },
            Err(rejected) => {
                if let Some(logger) = logger {
                    logger.warn(
                        "client.session.stale",
                        "Event did not match the session state",
                        Some(single_field("reason", Value::String(rejected.to_string()))),
                    );
                }
                None
            },
        }
    }

    fn finish(
        &self,
        generation: u64,
        ctx: &RequestContext,
        state: &CheckSessionState,
        logger: Option<&dyn LoggerPort>,
    ) {
        let mut core = self.lock_core();
        if core.generation == generation {
            core.in_flight = None;
        }

        match state {
            CheckSessionState::Success { result, .. } => {
                self.count("client.session.completed", "success");
                if core.generation != generation {
                    return;
                }
                match self.deps.renderer.render(ctx, result) {
                    Ok(report) => core.pending_route = report.route,
                    Err(error) => {
                        if let Some(logger) = logger {
                            logger.error(
                                "client.overlay.render",
                                "Map scene could not be drawn",
                                Some(single_field("error", Value::String(error.to_string()))),
                            );
                        }
                    },
                }
            },
            CheckSessionState::Failed { error } => {
                self.count("client.session.failed", error.stage());
                if let Some(logger) = logger {
                    let mut fields = LogFields::new();
                    fields.insert("stage".into(), Value::from(error.stage()));
                    fields.insert("code".into(), Value::from(error.code()));
                    fields.insert("message".into(), Value::String(error.message()));
                    logger.warn("client.session.failed", "Location check failed", Some(fields));
                }
            },
            _ => {},
        }
    }

    fn count(&self, name: &str, outcome: &str) {
        if let Some(telemetry) = self.deps.telemetry.as_ref() {
            let mut tags = TelemetryTags::new();
            tags.insert("outcome".into(), outcome.into());
            telemetry.increment_counter(name, 1, Some(&tags));
        }
    }

    fn log_debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.debug(event, message, fields);
        }
    }

    fn lock_core(&self) -> MutexGuard<'_, SessionCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_transition(logger: &dyn LoggerPort, from: &str, to: &str, event: &str) {
    let mut fields = LogFields::new();
    fields.insert("from".into(), Value::from(from));
    fields.insert("to".into(), Value::from(to));
    fields.insert("event".into(), Value::from(event));
    logger.info(
        "client.session.transition",
        "Session state changed",
        Some(fields),
    );
}

fn single_field(key: &str, value: Value) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert(key.into(), value);
    fields
}
