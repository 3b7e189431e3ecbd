//! Shared server state wiring.

use std::sync::Arc;

use tokio::sync::Mutex;

use huddle_shared::time::{Clock, SystemClock};

use crate::{
    dispatcher::Dispatcher,
    gate::SessionGate,
    history::HistoryBuffer,
    pusher::ChannelEventPusher,
    rate_limit::RateLimiter,
    registry::ConnectionRegistry,
};

/// One server instance's state: the gate, the dispatcher, and the pusher the
/// transport registers connections with.
///
/// The registry, history, and limiter live behind the dispatcher; nothing
/// outside it mutates them after admission.
pub struct AppState {
    pub gate: SessionGate,
    pub dispatcher: Dispatcher,
    pub pusher: Arc<ChannelEventPusher>,
}

impl AppState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(Mutex::new(ConnectionRegistry::new()));
        let history = Arc::new(Mutex::new(HistoryBuffer::new()));
        let limiter = Arc::new(Mutex::new(RateLimiter::new()));
        let pusher = Arc::new(ChannelEventPusher::new());

        let gate = SessionGate::new(registry.clone(), clock.clone());
        let dispatcher = Dispatcher::new(registry, history, limiter, pusher.clone(), clock);

        Self {
            gate,
            dispatcher,
            pusher,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}
