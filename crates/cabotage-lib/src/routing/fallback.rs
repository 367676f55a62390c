//! Routing with snap-to-road and profile fallback.
//!
//! A request walks an explicit state machine:
//!
//! ```text
//! TryPrimary --ok--> Done(Direct)
//!     | NoRoute
//!     v
//!   Snap --moved--> RetryWithSnap --ok--> Done(Snapped)
//!     | unchanged         | NoRoute
//!     v                   v
//! TryFallback <-----------+ --ok--> Done(Direct, fallback profile)
//!     | NoRoute / disabled
//!     v
//!   Failed
//! ```
//!
//! Only `NoRoute` moves the machine forward. Rate limiting and every other
//! provider error fail immediately.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::{Coordinates, Point};

use super::{Directions, RouteProfile, RouteResponse, RouteStrategy, RoutingBackend, RoutingClient};

/// Which recovery steps the router may take after a `NoRoute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Snap both endpoints to the road network and retry once.
    pub snap: bool,
    /// Retry with this profile when the requested one finds no route.
    pub fallback_profile: Option<RouteProfile>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            snap: true,
            fallback_profile: Some(RouteProfile::DrivingCar),
        }
    }
}

/// States of a single routing request.
#[derive(Debug)]
pub enum RouteState {
    TryPrimary,
    Snap,
    RetryWithSnap { from: Coordinates, to: Coordinates },
    TryFallback(RouteProfile),
    Failed(Error),
    Done(RouteResponse),
}

/// [`RoutingClient`] over a raw backend with bounded recovery.
#[derive(Debug, Clone)]
pub struct FallbackRouter<B> {
    backend: B,
    policy: FallbackPolicy,
}

impl<B: RoutingBackend> FallbackRouter<B> {
    pub fn new(backend: B, policy: FallbackPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    fn fallback_after(&self, profile: RouteProfile, err: Error) -> RouteState {
        match self.policy.fallback_profile {
            Some(fallback) if fallback != profile => RouteState::TryFallback(fallback),
            _ => RouteState::Failed(err),
        }
    }

    /// Advance one state. `last_no_route` carries the most recent `NoRoute`
    /// so a dead end reports it.
    fn step(
        &self,
        state: RouteState,
        origin: &Point,
        destination: &Point,
        profile: RouteProfile,
        last_no_route: &mut Option<Error>,
    ) -> RouteState {
        let from = origin.coordinates;
        let to = destination.coordinates;

        match state {
            RouteState::TryPrimary => match self.backend.directions(&from, &to, profile) {
                Ok(d) => RouteState::Done(response(d, profile, RouteStrategy::Direct)),
                Err(err @ Error::NoRoute { .. }) => {
                    debug!(%profile, from = %origin.label, to = %destination.label, "no route on primary profile");
                    if self.policy.snap {
                        *last_no_route = Some(err);
                        RouteState::Snap
                    } else {
                        self.fallback_after(profile, err)
                    }
                }
                Err(err) => RouteState::Failed(err),
            },
            RouteState::Snap => match self.backend.snap(&[from, to], profile) {
                Ok(snapped) => {
                    let new_from = snapped.first().copied().flatten().unwrap_or(from);
                    let new_to = snapped.get(1).copied().flatten().unwrap_or(to);
                    if new_from == from && new_to == to {
                        debug!(%profile, "snap left endpoints unchanged");
                        self.fallback_after(profile, take_no_route(last_no_route, origin, destination, profile))
                    } else {
                        RouteState::RetryWithSnap {
                            from: new_from,
                            to: new_to,
                        }
                    }
                }
                Err(err @ Error::RateLimited { .. }) => RouteState::Failed(err),
                Err(err) => {
                    warn!(%profile, error = %err, "snap-to-road failed");
                    self.fallback_after(profile, take_no_route(last_no_route, origin, destination, profile))
                }
            },
            RouteState::RetryWithSnap { from, to } => {
                match self.backend.directions(&from, &to, profile) {
                    Ok(d) => RouteState::Done(response(d, profile, RouteStrategy::Snapped)),
                    Err(err @ Error::NoRoute { .. }) => self.fallback_after(profile, err),
                    Err(err) => RouteState::Failed(err),
                }
            }
            RouteState::TryFallback(fallback) => {
                warn!(
                    from = %origin.label,
                    to = %destination.label,
                    primary = %profile,
                    %fallback,
                    "falling back to secondary routing profile"
                );
                match self.backend.directions(&from, &to, fallback) {
                    Ok(d) => RouteState::Done(response(d, fallback, RouteStrategy::Direct)),
                    Err(err) => RouteState::Failed(err),
                }
            }
            terminal @ (RouteState::Failed(_) | RouteState::Done(_)) => terminal,
        }
    }
}

impl<B: RoutingBackend> RoutingClient for FallbackRouter<B> {
    fn route(
        &self,
        origin: &Point,
        destination: &Point,
        profile: RouteProfile,
    ) -> Result<RouteResponse> {
        let mut last_no_route = None;
        let mut state = RouteState::TryPrimary;
        loop {
            state = match self.step(state, origin, destination, profile, &mut last_no_route) {
                RouteState::Done(resp) => {
                    info!(
                        from = %origin.label,
                        to = %destination.label,
                        distance_km = resp.distance_km,
                        profile = %resp.profile_used,
                        strategy = ?resp.strategy,
                        "road route resolved"
                    );
                    return Ok(resp);
                }
                RouteState::Failed(err) => return Err(err),
                next => next,
            };
        }
    }
}

fn response(d: Directions, profile: RouteProfile, strategy: RouteStrategy) -> RouteResponse {
    RouteResponse {
        distance_km: d.distance_km,
        duration_h: d.duration_h,
        profile_used: profile,
        strategy,
    }
}

fn take_no_route(
    last: &mut Option<Error>,
    origin: &Point,
    destination: &Point,
    profile: RouteProfile,
) -> Error {
    last.take().unwrap_or_else(|| Error::NoRoute {
        from: origin.label.clone(),
        to: destination.label.clone(),
        profile: profile.to_string(),
    })
}
