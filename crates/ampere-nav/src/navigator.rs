use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::errors::NavigationError;
use crate::route::{Destination, Route, RouteParams};

/// Shared handle to the navigation stack. Clones address the same stack.
///
/// The stack is never empty: the initial route can be replaced but never
/// popped. Every mutation publishes the new top of stack to [`Navigator::watch`]
/// receivers exactly once.
#[derive(Clone)]
pub struct Navigator {
    pub(crate) inner: Arc<NavigatorInner>,
}

pub(crate) struct NavigatorInner {
    stack: Mutex<Vec<Arc<Route>>>,
    current: watch::Sender<Arc<Route>>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let initial = Arc::new(initial);
        let (current, _) = watch::channel(Arc::clone(&initial));
        Self {
            inner: Arc::new(NavigatorInner {
                stack: Mutex::new(vec![initial]),
                current,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<NavigatorInner>) -> Self {
        Self { inner }
    }

    pub fn push(&self, name: impl Into<String>, params: Option<RouteParams>) {
        self.push_route(Route::new(name, params));
    }

    pub fn push_route(&self, route: Route) {
        let mut stack = self.inner.lock();
        let route = Arc::new(route);
        stack.push(Arc::clone(&route));
        tracing::debug!(route = route.name(), depth = stack.len(), "navigation push");
        self.inner.current.send_replace(route);
    }

    pub fn push_to<D: Destination>(&self, destination: &D) -> Result<(), NavigationError> {
        self.push_route(Route::to(destination)?);
        Ok(())
    }

    /// Swap the top of stack. Depth is unchanged, so the replaced route is
    /// no longer reachable through [`Navigator::back`].
    pub fn replace(&self, name: impl Into<String>, params: Option<RouteParams>) {
        self.replace_route(Route::new(name, params));
    }

    pub fn replace_route(&self, route: Route) {
        let mut stack = self.inner.lock();
        let route = Arc::new(route);
        match stack.last_mut() {
            Some(top) => *top = Arc::clone(&route),
            None => stack.push(Arc::clone(&route)),
        }
        tracing::debug!(route = route.name(), depth = stack.len(), "navigation replace");
        self.inner.current.send_replace(route);
    }

    pub fn replace_with<D: Destination>(&self, destination: &D) -> Result<(), NavigationError> {
        self.replace_route(Route::to(destination)?);
        Ok(())
    }

    /// Pop the top of stack. Returns false, and changes nothing, at the root.
    pub fn back(&self) -> bool {
        let mut stack = self.inner.lock();
        if stack.len() <= 1 {
            tracing::trace!("navigation back ignored at root");
            return false;
        }
        stack.pop();
        let Some(top) = stack.last().cloned() else {
            return false;
        };
        tracing::debug!(route = top.name(), depth = stack.len(), "navigation back");
        self.inner.current.send_replace(top);
        true
    }

    pub fn current(&self) -> Arc<Route> {
        let stack = self.inner.lock();
        match stack.last() {
            Some(top) => Arc::clone(top),
            None => self.inner.current.borrow().clone(),
        }
    }

    pub fn depth(&self) -> usize {
        self.inner.lock().len()
    }

    /// Stack contents, root first.
    pub fn history(&self) -> Vec<Arc<Route>> {
        self.inner.lock().clone()
    }

    /// Receiver that observes every change of the current route.
    pub fn watch(&self) -> watch::Receiver<Arc<Route>> {
        self.inner.current.subscribe()
    }

    pub fn ptr_eq(&self, other: &Navigator) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl NavigatorInner {
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Route>>> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stack = self.inner.lock();
        f.debug_struct("Navigator")
            .field("depth", &stack.len())
            .field("current", &stack.last().map(|route| route.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(navigator: &Navigator) -> Vec<String> {
        navigator
            .history()
            .iter()
            .map(|route| route.name().to_string())
            .collect()
    }

    #[test]
    fn back_at_root_is_a_no_op() {
        let navigator = Navigator::new(Route::named("DISCOVER"));
        assert!(!navigator.back());
        assert!(!navigator.back());
        assert_eq!(navigator.depth(), 1);
        assert_eq!(navigator.current().name(), "DISCOVER");
    }

    #[test]
    fn replace_keeps_depth_and_hides_previous_top() {
        let navigator = Navigator::new(Route::named("DISCOVER"));
        navigator.push("BOOK_FIXED_TIME", None);
        navigator.replace("BOOKING_CONFIRMED", None);

        assert_eq!(names(&navigator), vec!["DISCOVER", "BOOKING_CONFIRMED"]);
        assert!(navigator.back());
        assert_eq!(navigator.current().name(), "DISCOVER");
    }

    #[test]
    fn replace_at_root_swaps_the_root() {
        let navigator = Navigator::new(Route::named("SPLASH"));
        navigator.replace("DISCOVER", None);
        assert_eq!(names(&navigator), vec!["DISCOVER"]);
        assert!(!navigator.back());
    }

    #[test]
    fn clones_share_one_stack() {
        let navigator = Navigator::new(Route::named("DISCOVER"));
        let other = navigator.clone();
        other.push("PROFILE", None);
        assert_eq!(navigator.current().name(), "PROFILE");
        assert!(navigator.ptr_eq(&other));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn watchers_see_each_transition() {
        let navigator = Navigator::new(Route::named("DISCOVER"));
        let mut rx = navigator.watch();
        assert_eq!(rx.borrow_and_update().name(), "DISCOVER");

        navigator.push("STATION_DETAILS", None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().name(), "STATION_DETAILS");

        assert!(!rx.has_changed().unwrap());
        navigator.back();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().name(), "DISCOVER");

        // the root no-op publishes nothing
        navigator.back();
        assert!(!rx.has_changed().unwrap());
    }
}
