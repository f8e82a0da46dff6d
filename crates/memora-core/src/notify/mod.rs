//! Notification delivery: a fixed, ordered chain of transports tried most
//! capable first. Availability is probed once when the chain is built and
//! cached; delivery halts at the first transport that succeeds. The final
//! log transport cannot fail, so a full chain never loses a message.

use crate::models::NotifyMethod;
use thiserror::Error;
use tracing::{debug, info};

pub mod transports;

pub use transports::{
    DesktopNotifier, LogFile, NativeNotifier, SoundCue, TerminalBanner,
};

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("transport not available")]
    Unavailable,

    #[error("transport failed: {0}")]
    Failed(String),

    #[error("all transports failed: {0}")]
    Exhausted(String),
}

/// One rendered notification, transport-agnostic.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub title: String,
    pub subtitle: Option<String>,
    pub body: String,
    /// Sound hint; transports map it to their own palette.
    pub sound: Option<String>,
    /// Grouping key for notification centers that coalesce by group.
    pub group: Option<String>,
    pub action_url: Option<String>,
}

impl Message {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// A single way of getting a message in front of the user.
pub trait Transport: Send + Sync {
    fn method(&self) -> NotifyMethod;

    /// Availability check, run once at chain construction.
    fn probe(&self) -> bool;

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError>;
}

/// Ordered transports with cached availability.
pub struct DeliveryChain {
    transports: Vec<(Box<dyn Transport>, bool)>,
}

impl DeliveryChain {
    /// Build the default chain and probe each transport once.
    pub fn detect() -> Self {
        Self::with_transports(vec![
            Box::new(NativeNotifier::new()),
            Box::new(DesktopNotifier::new()),
            Box::new(TerminalBanner::new()),
            Box::new(SoundCue::new()),
            Box::new(LogFile::default()),
        ])
    }

    pub fn with_transports(transports: Vec<Box<dyn Transport>>) -> Self {
        let transports = transports
            .into_iter()
            .map(|t| {
                let available = t.probe();
                debug!(method = %t.method(), available, "probed transport");
                (t, available)
            })
            .collect();
        Self { transports }
    }

    /// The most capable transport that probed available.
    pub fn best_method(&self) -> NotifyMethod {
        self.transports
            .iter()
            .find(|(_, available)| *available)
            .map(|(t, _)| t.method())
            .unwrap_or(NotifyMethod::Log)
    }

    pub fn is_available(&self, method: NotifyMethod) -> bool {
        self.transports
            .iter()
            .any(|(t, available)| *available && t.method() == method)
    }

    /// Deliver through the full chain, most capable transport first.
    pub fn deliver(&self, message: &Message) -> Result<NotifyMethod, DeliveryError> {
        self.deliver_from(NotifyMethod::Auto, message)
    }

    /// Deliver starting at `method` (or the top of the chain for `Auto`),
    /// degrading through the remaining transports. Returns the method that
    /// actually carried the message.
    pub fn deliver_from(
        &self,
        method: NotifyMethod,
        message: &Message,
    ) -> Result<NotifyMethod, DeliveryError> {
        let start = match method {
            NotifyMethod::Auto => 0,
            _ => self
                .transports
                .iter()
                .position(|(t, _)| t.method() == method)
                .unwrap_or(0),
        };

        let mut last_error = String::from("no transports configured");
        for (transport, available) in &self.transports[start..] {
            if !available {
                continue;
            }
            match transport.deliver(message) {
                Ok(()) => {
                    info!(method = %transport.method(), title = %message.title, "delivered");
                    return Ok(transport.method());
                }
                Err(e) => {
                    debug!(method = %transport.method(), error = %e, "transport failed, degrading");
                    last_error = e.to_string();
                }
            }
        }
        Err(DeliveryError::Exhausted(last_error))
    }

    /// Force one specific transport, no fallback. Test hook.
    pub fn deliver_via(
        &self,
        method: NotifyMethod,
        message: &Message,
    ) -> Result<(), DeliveryError> {
        let transport = self
            .transports
            .iter()
            .find(|(t, _)| t.method() == method)
            .ok_or(DeliveryError::Unavailable)?;
        if !transport.1 {
            return Err(DeliveryError::Unavailable);
        }
        transport.0.deliver(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubTransport {
        method: NotifyMethod,
        available: bool,
        succeeds: bool,
        deliveries: Arc<AtomicUsize>,
    }

    impl StubTransport {
        fn boxed(
            method: NotifyMethod,
            available: bool,
            succeeds: bool,
            deliveries: &Arc<AtomicUsize>,
        ) -> Box<dyn Transport> {
            Box::new(Self {
                method,
                available,
                succeeds,
                deliveries: Arc::clone(deliveries),
            })
        }
    }

    impl Transport for StubTransport {
        fn method(&self) -> NotifyMethod {
            self.method
        }

        fn probe(&self) -> bool {
            self.available
        }

        fn deliver(&self, _message: &Message) -> Result<(), DeliveryError> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            if self.succeeds {
                Ok(())
            } else {
                Err(DeliveryError::Failed("stub failure".into()))
            }
        }
    }

    fn message() -> Message {
        Message::new("Reminder", "water the plants")
    }

    #[test]
    fn chain_halts_at_first_success() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let chain = DeliveryChain::with_transports(vec![
            StubTransport::boxed(NotifyMethod::Native, true, true, &first),
            StubTransport::boxed(NotifyMethod::Log, true, true, &second),
        ]);

        let used = chain.deliver(&message()).unwrap();
        assert_eq!(used, NotifyMethod::Native);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn chain_degrades_past_failures_and_unavailable_transports() {
        let native = Arc::new(AtomicUsize::new(0));
        let desktop = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(AtomicUsize::new(0));
        let chain = DeliveryChain::with_transports(vec![
            // unavailable: skipped without a delivery attempt
            StubTransport::boxed(NotifyMethod::Native, false, true, &native),
            // available but failing
            StubTransport::boxed(NotifyMethod::Desktop, true, false, &desktop),
            StubTransport::boxed(NotifyMethod::Log, true, true, &log),
        ]);

        let used = chain.deliver(&message()).unwrap();
        assert_eq!(used, NotifyMethod::Log);
        assert_eq!(native.load(Ordering::SeqCst), 0);
        assert_eq!(desktop.load(Ordering::SeqCst), 1);
        assert_eq!(log.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exhausted_when_every_transport_fails() {
        let count = Arc::new(AtomicUsize::new(0));
        let chain = DeliveryChain::with_transports(vec![
            StubTransport::boxed(NotifyMethod::Native, true, false, &count),
            StubTransport::boxed(NotifyMethod::Desktop, true, false, &count),
        ]);

        let result = chain.deliver(&message());
        assert!(matches!(result, Err(DeliveryError::Exhausted(_))));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn deliver_from_skips_more_capable_transports() {
        let native = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(AtomicUsize::new(0));
        let chain = DeliveryChain::with_transports(vec![
            StubTransport::boxed(NotifyMethod::Native, true, true, &native),
            StubTransport::boxed(NotifyMethod::Log, true, true, &log),
        ]);

        let used = chain.deliver_from(NotifyMethod::Log, &message()).unwrap();
        assert_eq!(used, NotifyMethod::Log);
        assert_eq!(native.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn deliver_via_never_falls_back() {
        let native = Arc::new(AtomicUsize::new(0));
        let log = Arc::new(AtomicUsize::new(0));
        let chain = DeliveryChain::with_transports(vec![
            StubTransport::boxed(NotifyMethod::Native, true, false, &native),
            StubTransport::boxed(NotifyMethod::Log, true, true, &log),
        ]);

        let result = chain.deliver_via(NotifyMethod::Native, &message());
        assert!(matches!(result, Err(DeliveryError::Failed(_))));
        assert_eq!(log.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn best_method_is_first_available() {
        let count = Arc::new(AtomicUsize::new(0));
        let chain = DeliveryChain::with_transports(vec![
            StubTransport::boxed(NotifyMethod::Native, false, true, &count),
            StubTransport::boxed(NotifyMethod::Terminal, true, true, &count),
            StubTransport::boxed(NotifyMethod::Log, true, true, &count),
        ]);
        assert_eq!(chain.best_method(), NotifyMethod::Terminal);
        assert!(!chain.is_available(NotifyMethod::Native));
        assert!(chain.is_available(NotifyMethod::Log));
    }
}
