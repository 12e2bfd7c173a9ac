use std::sync::Arc;

use hermes_routing::{
    error::RouteError,
    profile::RouteProfile,
    route::Route,
    router::RouteSource,
    routing::{route_point::RouteCoordSet, search_control::SearchControl},
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub enum RouteRequest {
    Route {
        profile: RouteProfile,
        points: RouteCoordSet,
    },
    BestRoute {
        profile: RouteProfile,
        points: RouteCoordSet,
        start_fixed: bool,
        end_fixed: bool,
        iterations: usize,
    },
}

impl RouteRequest {
    fn run(&self, source: &dyn RouteSource, control: &SearchControl) -> Result<Route, RouteError> {
        match self {
            RouteRequest::Route { profile, points } => source.create_route(profile, points, control),
            RouteRequest::BestRoute {
                profile,
                points,
                start_fixed,
                end_fixed,
                iterations,
            } => source.create_best_route(profile, points, *start_fixed, *end_fixed, *iterations, control),
        }
    }
}

#[derive(Default)]
struct InFlight {
    next_id: u64,
    controls: Vec<(u64, SearchControl)>,
}

/// One request's place in the in-flight list. Dropping it, whether the
/// request finished or its future was dropped, removes the entry and stops
/// the search.
struct InFlightEntry {
    in_flight: Arc<Mutex<InFlight>>,
    id: u64,
    control: SearchControl,
}

impl Drop for InFlightEntry {
    fn drop(&mut self) {
        self.control.cancel();
        self.in_flight
            .lock()
            .controls
            .retain(|(request_id, _)| *request_id != self.id);
    }
}

/// Runs route requests on the blocking pool. A request made with
/// `override_previous` cancels every request still in flight; those finish
/// with [`RouteError::Cancelled`] whatever their search produced.
pub struct AsyncRouter {
    source: Arc<dyn RouteSource>,
    in_flight: Arc<Mutex<InFlight>>,
}

impl AsyncRouter {
    pub fn new(source: Arc<dyn RouteSource>) -> Self {
        AsyncRouter {
            source,
            in_flight: Arc::new(Mutex::new(InFlight::default())),
        }
    }

    pub async fn create_route(
        &self,
        profile: RouteProfile,
        points: RouteCoordSet,
        override_previous: bool,
    ) -> Result<Route, RouteError> {
        self.request(RouteRequest::Route { profile, points }, override_previous)
            .await
    }

    pub async fn create_best_route(
        &self,
        profile: RouteProfile,
        points: RouteCoordSet,
        start_fixed: bool,
        end_fixed: bool,
        iterations: usize,
        override_previous: bool,
    ) -> Result<Route, RouteError> {
        let request = RouteRequest::BestRoute {
            profile,
            points,
            start_fixed,
            end_fixed,
            iterations,
        };
        self.request(request, override_previous).await
    }

    pub async fn request(&self, request: RouteRequest, override_previous: bool) -> Result<Route, RouteError> {
        let entry = self.begin(override_previous);
        self.run(entry, request).await
    }

    /// Starts `request` in the background and hands the result to `callback`.
    /// Overriding takes effect before this returns.
    pub fn start_route<F>(self: &Arc<Self>, request: RouteRequest, override_previous: bool, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Route, RouteError>) + Send + 'static,
    {
        let entry = self.begin(override_previous);
        let router = Arc::clone(self);

        tokio::spawn(async move {
            let result = router.run(entry, request).await;
            callback(result);
        })
    }

    /// Cancels every request in flight.
    pub fn cancel(&self) {
        let mut in_flight = self.in_flight.lock();
        for (_, control) in in_flight.controls.drain(..) {
            control.cancel();
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().controls.len()
    }

    fn begin(&self, override_previous: bool) -> InFlightEntry {
        let mut in_flight = self.in_flight.lock();

        if override_previous && !in_flight.controls.is_empty() {
            debug!(cancelled = in_flight.controls.len(), "Overriding route requests in flight");
            for (_, control) in in_flight.controls.drain(..) {
                control.cancel();
            }
        }

        let id = in_flight.next_id;
        in_flight.next_id += 1;
        let control = SearchControl::new();
        in_flight.controls.push((id, control.clone()));

        InFlightEntry {
            in_flight: Arc::clone(&self.in_flight),
            id,
            control,
        }
    }

    async fn run(&self, entry: InFlightEntry, request: RouteRequest) -> Result<Route, RouteError> {
        let source = Arc::clone(&self.source);
        let task_control = entry.control.clone();

        let result = tokio::task::spawn_blocking(move || request.run(source.as_ref(), &task_control))
            .await
            .unwrap_or_else(|error| {
                warn!(%error, "Route task did not complete");
                Err(RouteError::Cancelled)
            });

        if entry.control.is_cancelled() {
            return Err(RouteError::Cancelled);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use hermes_routing::profile::RouteProfileType;
    use tokio::sync::oneshot;

    use crate::test_utils::{GatedSource, point};

    fn request() -> RouteRequest {
        RouteRequest::Route {
            profile: RouteProfile::new(RouteProfileType::Car),
            points: RouteCoordSet::from_points([point(0.0, 0.0), point(0.001, 0.0)]),
        }
    }

    async fn wait_for_calls(source: &GatedSource, calls: usize) {
        while source.calls() < calls {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn test_route_completes() {
        let source = Arc::new(GatedSource::default());
        source.release();
        let router = AsyncRouter::new(source);

        let route = router
            .create_route(
                RouteProfile::new(RouteProfileType::Walk),
                RouteCoordSet::from_points([point(0.0, 0.0), point(0.001, 0.0)]),
                false,
            )
            .await;

        assert!(route.is_ok());
        assert_eq!(router.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_override_cancels_request_in_flight() {
        let source = Arc::new(GatedSource::default());
        let router = Arc::new(AsyncRouter::new(source.clone()));

        let (sender, receiver) = oneshot::channel();
        let first = router.start_route(request(), false, move |result| {
            let _ = sender.send(result);
        });
        wait_for_calls(&source, 1).await;

        let second = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.request(request(), true).await })
        };

        assert_eq!(receiver.await.unwrap(), Err(RouteError::Cancelled));
        first.await.unwrap();

        wait_for_calls(&source, 2).await;
        source.release();
        assert!(second.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_requests_without_override_run_side_by_side() {
        let source = Arc::new(GatedSource::default());
        let router = Arc::new(AsyncRouter::new(source.clone()));

        let first = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.request(request(), false).await })
        };
        let second = {
            let router = Arc::clone(&router);
            tokio::spawn(async move {
                router
                    .create_best_route(
                        RouteProfile::new(RouteProfileType::Car),
                        RouteCoordSet::from_points([point(0.0, 0.0), point(0.001, 0.0), point(0.002, 0.0)]),
                        true,
                        true,
                        0,
                        false,
                    )
                    .await
            })
        };

        wait_for_calls(&source, 2).await;
        source.release();

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_dropped_request_leaves_nothing_in_flight() {
        let source = Arc::new(GatedSource::default());
        let router = AsyncRouter::new(source.clone());

        let abandoned = tokio::time::timeout(Duration::from_millis(20), router.request(request(), false)).await;

        assert!(abandoned.is_err());
        assert_eq!(router.in_flight(), 0);
        assert!(source.calls() <= 1);
        source.release();
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let source = Arc::new(GatedSource::default());
        let router = Arc::new(AsyncRouter::new(source.clone()));

        let pending = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.request(request(), false).await })
        };
        wait_for_calls(&source, 1).await;
        router.cancel();

        assert_eq!(pending.await.unwrap(), Err(RouteError::Cancelled));
        assert_eq!(router.in_flight(), 0);
    }
}
