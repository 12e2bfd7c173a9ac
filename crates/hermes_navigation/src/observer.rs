use std::sync::{Arc, Weak};

use hermes_routing::route::Route;

use crate::{navigation_state::NavigationState, navigator_turn::NavigatorTurn};

/// Receives navigation events. Called synchronously from
/// [`Navigator::navigate`](crate::navigator::Navigator::navigate); implementations
/// must not call back into the navigator.
pub trait NavigatorObserver: Send + Sync {
    /// A route was installed, or cleared when `route` is `None`.
    fn on_route(&self, _route: Option<&Route>) {}

    /// The next significant turn, a second one if it follows within 100 m,
    /// and an ahead or continue turn coming before the first.
    fn on_turn(&self, _first: &NavigatorTurn, _second: Option<&NavigatorTurn>, _continuation: Option<&NavigatorTurn>) {}

    fn on_state(&self, _state: NavigationState) {}
}

/// Weakly held observers; dropped ones are skipped and forgotten.
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Weak<dyn NavigatorObserver>>,
}

impl ObserverList {
    pub fn add(&mut self, observer: &Arc<dyn NavigatorObserver>) {
        self.observers.push(Arc::downgrade(observer));
    }

    pub fn remove(&mut self, observer: &Arc<dyn NavigatorObserver>) {
        let target = Arc::downgrade(observer);
        self.observers.retain(|weak| !Weak::ptr_eq(weak, &target));
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Calls `notify` on every live observer.
    pub fn notify(&mut self, mut notify: impl FnMut(&dyn NavigatorObserver)) {
        self.observers.retain(|weak| match weak.upgrade() {
            Some(observer) => {
                notify(observer.as_ref());
                true
            }
            None => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingObserver;

    #[test]
    fn test_dropped_observer_skipped() {
        let kept: Arc<dyn NavigatorObserver> = Arc::new(RecordingObserver::default());
        let dropped: Arc<dyn NavigatorObserver> = Arc::new(RecordingObserver::default());

        let mut observers = ObserverList::default();
        observers.add(&kept);
        observers.add(&dropped);
        drop(dropped);

        let mut calls = 0;
        observers.notify(|observer| {
            observer.on_state(NavigationState::Turn);
            calls += 1;
        });

        assert_eq!(calls, 1);
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn test_remove_observer() {
        let observer: Arc<dyn NavigatorObserver> = Arc::new(RecordingObserver::default());
        let mut observers = ObserverList::default();
        observers.add(&observer);
        observers.remove(&observer);

        assert!(observers.is_empty());
    }
}
