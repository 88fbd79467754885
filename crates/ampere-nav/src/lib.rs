//! Stack navigation for the Ampere client.
//!
//! A [`Navigator`] owns the screen history as a stack of [`Route`]s that is
//! never empty. Screens move forward with `push`, finish flows with `replace`
//! and go back with `back`, which is a no-op at the root.

pub mod bridge;
pub mod errors;
pub mod navigator;
pub mod route;

pub use errors::{BridgeError, NavigationError};
pub use navigator::Navigator;
pub use route::{Destination, Route, RouteParams};
