use std::sync::Arc;

use tokio::sync::watch;

/// Host foreground state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }
}

/// Host side of the visibility signal. Dropping every controller is host teardown.
#[derive(Clone, Debug)]
pub struct VisibilityController {
    tx: Arc<watch::Sender<Visibility>>,
}

impl VisibilityController {
    pub fn set(&self, visibility: Visibility) {
        self.tx.send_if_modified(|current| {
            if *current == visibility {
                return false;
            }
            *current = visibility;
            true
        });
    }

    pub fn show(&self) {
        self.set(Visibility::Visible);
    }

    pub fn hide(&self) {
        self.set(Visibility::Hidden);
    }

    pub fn current(&self) -> Visibility {
        *self.tx.borrow()
    }

    pub fn signal(&self) -> VisibilitySignal {
        VisibilitySignal {
            rx: self.tx.subscribe(),
            _keepalive: None,
        }
    }
}

/// Subscriber side of the visibility signal. Cloned into every subscription.
#[derive(Clone, Debug)]
pub struct VisibilitySignal {
    rx: watch::Receiver<Visibility>,
    _keepalive: Option<Arc<watch::Sender<Visibility>>>,
}

impl VisibilitySignal {
    /// Signal for hosts without a foreground concept (CLIs, daemons).
    pub fn always_visible() -> Self {
        let (tx, rx) = watch::channel(Visibility::Visible);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn current(&self) -> Visibility {
        *self.rx.borrow()
    }

    /// Resolves once the host is visible. `false` means the host went away while hidden.
    pub async fn wait_visible(&mut self) -> bool {
        self.rx.wait_for(|v| v.is_visible()).await.is_ok()
    }

    /// Resolves once the host is hidden; never resolves after host teardown.
    pub async fn wait_hidden(&mut self) {
        if self.rx.wait_for(|v| !v.is_visible()).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn visibility_channel(initial: Visibility) -> (VisibilityController, VisibilitySignal) {
    let (tx, rx) = watch::channel(initial);
    (
        VisibilityController { tx: Arc::new(tx) },
        VisibilitySignal {
            rx,
            _keepalive: None,
        },
    )
}
