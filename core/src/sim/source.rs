use crate::interface::{LocationSource, SubscriptionHandle, UpdateSender};
use crate::model::TrackPoint;
use crate::prelude::{LocationUpdateConfig, TrackerError, TrackerResult};
use crate::tracking::filter::UpdateFilter;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Location provider fed by hand or by a route replay.
///
/// Each subscriber gets its own [`UpdateFilter`]. Fixes that pass the
/// displacement check are queued and handed over as one batch once the
/// update interval has elapsed, so a single callback may carry several fixes.
pub struct SimulatedLocationSource {
    inner: Mutex<SourceState>,
}

struct Subscriber {
    sender: UpdateSender,
    filter: UpdateFilter,
    queued: Vec<TrackPoint>,
}

struct SourceState {
    last_known: Option<TrackPoint>,
    answer_last_known: bool,
    subscribe_failure: Option<String>,
    subscribers: HashMap<SubscriptionHandle, Subscriber>,
    next_handle: u64,
    last_known_requests: usize,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
}

impl SimulatedLocationSource {
    pub fn new(last_known: Option<TrackPoint>) -> Self {
        Self {
            inner: Mutex::new(SourceState {
                last_known,
                answer_last_known: true,
                subscribe_failure: None,
                subscribers: HashMap::new(),
                next_handle: 1,
                last_known_requests: 0,
                subscribe_calls: 0,
                unsubscribe_calls: 0,
            }),
        }
    }

    /// Never answers last-known requests; the reply sender is dropped.
    pub fn without_last_known(self) -> Self {
        self.state().answer_last_known = false;
        self
    }

    /// Rejects every subscription with `reason`.
    pub fn failing_subscribe(self, reason: &str) -> Self {
        self.state().subscribe_failure = Some(reason.to_string());
        self
    }

    fn state(&self) -> MutexGuard<'_, SourceState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reports a new device fix at `at_ms`. Returns the number of fixes
    /// handed to subscribers by this call.
    pub fn push_fix(&self, at_ms: u64, point: TrackPoint) -> usize {
        let mut state = self.state();
        state.last_known = Some(point);

        let mut delivered = 0;
        state.subscribers.retain(|_, subscriber| {
            if subscriber.filter.admit(&point) {
                subscriber.queued.push(point);
            }
            if subscriber.queued.is_empty() || !subscriber.filter.callback_due(at_ms) {
                return true;
            }
            subscriber.filter.mark_delivered(at_ms);
            let batch = std::mem::take(&mut subscriber.queued);
            let count = batch.len();
            match subscriber.sender.send(batch) {
                Ok(()) => {
                    delivered += count;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    /// Hands over every queued fix regardless of the interval.
    pub fn flush(&self) -> usize {
        let mut state = self.state();
        let mut delivered = 0;
        state.subscribers.retain(|_, subscriber| {
            if subscriber.queued.is_empty() {
                return true;
            }
            let batch = std::mem::take(&mut subscriber.queued);
            let count = batch.len();
            match subscriber.sender.send(batch) {
                Ok(()) => {
                    delivered += count;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    /// Drops every subscriber's sender, as a provider shutting down would.
    pub fn drop_subscribers(&self) {
        self.state().subscribers.clear();
    }

    pub fn active_subscriptions(&self) -> usize {
        self.state().subscribers.len()
    }

    pub fn last_known_requests(&self) -> usize {
        self.state().last_known_requests
    }

    pub fn subscribe_count(&self) -> usize {
        self.state().subscribe_calls
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.state().unsubscribe_calls
    }
}

impl LocationSource for SimulatedLocationSource {
    fn last_known_position(&self) -> oneshot::Receiver<Option<TrackPoint>> {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.state();
        state.last_known_requests += 1;
        if state.answer_last_known {
            let _ = sender.send(state.last_known);
        }
        receiver
    }

    fn subscribe(
        &self,
        config: &LocationUpdateConfig,
        updates: UpdateSender,
    ) -> TrackerResult<SubscriptionHandle> {
        let mut state = self.state();
        state.subscribe_calls += 1;
        if let Some(reason) = &state.subscribe_failure {
            return Err(TrackerError::SubscriptionFailure(reason.clone()));
        }
        let handle = SubscriptionHandle::new(state.next_handle);
        state.next_handle += 1;
        state.subscribers.insert(
            handle,
            Subscriber {
                sender: updates,
                filter: UpdateFilter::new(*config),
                queued: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let mut state = self.state();
        state.unsubscribe_calls += 1;
        state.subscribers.remove(&handle);
    }
}
