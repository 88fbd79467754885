//! Process-wide navigation entry point for call sites that have no
//! [`Navigator`] handle.
//!
//! Only one navigator is reachable here at a time: the most recently mounted
//! one. New code should take a `Navigator` instead of calling [`go`].

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use crate::errors::BridgeError;
use crate::navigator::{Navigator, NavigatorInner};
use crate::route::RouteParams;

static MOUNTED: OnceLock<Mutex<Option<Weak<NavigatorInner>>>> = OnceLock::new();

fn slot() -> MutexGuard<'static, Option<Weak<NavigatorInner>>> {
    MOUNTED
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn mounted() -> Option<Navigator> {
    slot()
        .as_ref()
        .and_then(Weak::upgrade)
        .map(Navigator::from_inner)
}

/// Push `name` onto the mounted navigator.
pub fn go(name: impl Into<String>, params: Option<RouteParams>) -> Result<(), BridgeError> {
    let navigator = mounted().ok_or(BridgeError::Unmounted)?;
    let name = name.into();
    tracing::debug!(route = %name, "navigation through bridge");
    navigator.push(name, params);
    Ok(())
}

pub fn is_mounted() -> bool {
    mounted().is_some()
}

impl Navigator {
    /// Make this navigator the target of [`go`], replacing any earlier one.
    /// The registration does not keep the navigator alive.
    pub fn mount(&self) {
        *slot() = Some(Arc::downgrade(&self.inner));
    }

    /// Clear the registration if it still points at this navigator.
    pub fn unmount(&self) -> bool {
        let mut slot = slot();
        let ours = slot
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(&self.inner)));
        if ours {
            *slot = None;
        }
        ours
    }
}
