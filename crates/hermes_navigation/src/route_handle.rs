use std::sync::Arc;

use hermes_routing::route::Route;
use parking_lot::RwLock;

/// The active route, shared with readers on other threads. Replacing it is a
/// single swap; readers holding the previous route keep it alive.
#[derive(Debug, Default)]
pub struct RouteHandle {
    route: RwLock<Option<Arc<Route>>>,
}

impl RouteHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Option<Arc<Route>> {
        self.route.read().clone()
    }

    /// Installs `route` and returns the one it replaced.
    pub fn replace(&self, route: Option<Arc<Route>>) -> Option<Arc<Route>> {
        std::mem::replace(&mut *self.route.write(), route)
    }

    pub fn clear(&self) -> Option<Arc<Route>> {
        self.replace(None)
    }

    pub fn is_empty(&self) -> bool {
        self.route.read().is_none()
    }
}
