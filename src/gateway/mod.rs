//! Realtime sync gateway: the boundary between the dashboard snapshot and
//! an external hierarchical store.
//!
//! ```text
//!  RealtimeStore ──watch──▶ decode ──▶ typed callback ──▶ LiveSession
//!        ▲                                                  │
//!        └──────────── set ◀── encode ◀── request_* ◀──────┘
//! ```
//!
//! Every subscription hands back an [`Unsubscribe`] handle.  Payload shape
//! normalisation lives in [`decode`]; store keys live in [`paths`].

pub mod decode;
pub mod paths;
mod store;

pub use store::StoreGateway;

/// Cancellation handle for one subscription.
///
/// [`cancel`](Self::cancel) releases the subscription the first time it is
/// called and does nothing afterwards.  Dropping a handle that was never
/// cancelled cancels it.
#[must_use = "dropping an Unsubscribe cancels the subscription"]
pub struct Unsubscribe {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Unsubscribe {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle returned when a subscription never started.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// False once cancelled, and always false for [`noop`](Self::noop).
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl core::fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}
