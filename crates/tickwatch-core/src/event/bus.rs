// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::TimerError;

/// One item of a tick stream: a tick value, or the terminal failure.
pub type TickResult = Result<u64, TimerError>;

/// Fans every published tick out to all current subscribers.
///
/// Each subscriber owns the receiving end of its own unbounded channel, so a
/// slow subscriber never delays the others. Subscribers only see ticks
/// published after they subscribed.
#[derive(Debug, Default)]
pub struct TickBus {
    subscribers: Vec<flume::Sender<TickResult>>,
    terminated: bool,
}

impl TickBus {
    /// Creates a bus with no subscribers.
    ///
    /// ## Returns
    /// A new instance of the TickBus struct.
    pub fn new() -> Self {
        log::trace!("TickBus initialized.");
        Self::default()
    }

    /// Registers a new subscriber.
    ///
    /// If the bus has already failed, the returned subscription is completed.
    /// Subscribers dropped since the last publish are pruned first.
    ///
    /// ## Returns
    /// The receiving side of the new subscription.
    pub fn subscribe(&mut self) -> TickSubscription {
        self.subscribers.retain(|sender| !sender.is_disconnected());
        let (sender, receiver) = flume::unbounded();
        if self.terminated {
            log::debug!("Subscribed to a terminated tick stream.");
        } else {
            self.subscribers.push(sender);
        }
        TickSubscription { receiver }
    }

    /// Sends a tick to every subscriber, dropping the ones that went away.
    ///
    /// ## Arguments
    /// * `tick` - The tick value to deliver.
    pub fn publish(&mut self, tick: u64) {
        log::trace!("Publishing tick {tick} to {} subscriber(s).", self.subscribers.len());
        self.subscribers.retain(|sender| {
            let delivered = sender.send(Ok(tick)).is_ok();
            if !delivered {
                log::trace!("Dropping disconnected tick subscriber.");
            }
            delivered
        });
    }

    /// Delivers `error` to every subscriber and completes all subscriptions.
    ///
    /// ## Arguments
    /// * `error` - The terminal failure of the stream.
    pub fn fail(&mut self, error: TimerError) {
        log::error!(
            "Tick stream failed for {} subscriber(s): {error}",
            self.subscribers.len()
        );
        for sender in self.subscribers.drain(..) {
            // A subscriber that is already gone has nothing left to complete.
            let _ = sender.send(Err(error.clone()));
        }
        self.terminated = true;
    }

    /// The number of subscribers still attached.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|sender| !sender.is_disconnected())
            .count()
    }

    /// Returns `true` once [`fail`](Self::fail) has been called.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// A subscriber's view of a tick stream.
///
/// The stream stays open for as long as the engine lives and has not failed.
/// It completes (every receive returns `None`) after the engine is dropped or
/// after the terminal error has been received.
#[derive(Debug)]
pub struct TickSubscription {
    receiver: flume::Receiver<TickResult>,
}

impl TickSubscription {
    /// Takes the next pending item without waiting.
    pub fn try_next(&self) -> Option<TickResult> {
        self.receiver.try_recv().ok()
    }

    /// Iterates over the items pending right now.
    pub fn try_iter(&self) -> impl Iterator<Item = TickResult> + '_ {
        self.receiver.try_iter()
    }

    /// Takes every item pending right now.
    pub fn drain(&self) -> Vec<TickResult> {
        self.receiver.drain().collect()
    }

    /// Waits for the next item.
    ///
    /// ## Returns
    /// `None` once the stream has completed.
    pub async fn next(&self) -> Option<TickResult> {
        self.receiver.recv_async().await.ok()
    }

    /// Converts the subscription into an asynchronous stream.
    pub fn into_stream(self) -> flume::r#async::RecvStream<'static, TickResult> {
        self.receiver.into_stream()
    }

    /// Returns `true` when the stream has completed and nothing is pending.
    pub fn is_terminated(&self) -> bool {
        self.receiver.is_disconnected() && self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;

    fn ticks(subscription: &TickSubscription) -> Vec<u64> {
        subscription
            .drain()
            .into_iter()
            .map(|item| item.expect("Tick stream should not fail"))
            .collect()
    }

    #[test]
    fn tick_bus_creation() {
        let bus = TickBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.is_terminated());
    }

    #[test]
    fn every_subscriber_receives_each_tick() {
        let mut bus = TickBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(0);
        bus.publish(1);

        assert_eq!(ticks(&first), vec![0, 1]);
        assert_eq!(ticks(&second), vec![0, 1]);
    }

    #[test]
    fn late_subscriber_gets_no_history() {
        let mut bus = TickBus::new();
        let early = bus.subscribe();
        bus.publish(0);

        let late = bus.subscribe();
        bus.publish(1);

        assert_eq!(ticks(&early), vec![0, 1]);
        assert_eq!(ticks(&late), vec![1]);
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let mut bus = TickBus::new();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(dropped);
        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(3);
        assert_eq!(bus.subscribers.len(), 1);
        assert_eq!(ticks(&kept), vec![3]);
    }

    #[test]
    fn subscribe_prunes_dropped_subscribers_without_publishing() {
        let mut bus = TickBus::new();
        let kept = bus.subscribe();
        for _ in 0..16 {
            drop(bus.subscribe());
        }

        let latest = bus.subscribe();
        assert_eq!(bus.subscribers.len(), 2);
        bus.publish(0);
        assert_eq!(ticks(&kept), vec![0]);
        assert_eq!(ticks(&latest), vec![0]);
    }

    #[test]
    fn fail_delivers_error_then_completes() {
        let mut bus = TickBus::new();
        let subscription = bus.subscribe();
        bus.publish(0);

        let error = TimerError::from(SchedulerError::ZeroPeriod);
        bus.fail(error.clone());

        assert!(!subscription.is_terminated());
        assert_eq!(subscription.drain(), vec![Ok(0), Err(error)]);
        assert!(subscription.is_terminated());
        assert!(bus.is_terminated());
    }

    #[test]
    fn subscribing_after_failure_yields_completed_stream() {
        let mut bus = TickBus::new();
        bus.fail(SchedulerError::NoRuntime.into());

        let subscription = bus.subscribe();
        bus.publish(1);
        assert!(subscription.is_terminated());
        assert!(subscription.try_next().is_none());
    }

    #[test]
    fn open_subscription_is_not_terminated() {
        let mut bus = TickBus::new();
        let subscription = bus.subscribe();
        assert!(subscription.try_next().is_none());
        assert!(!subscription.is_terminated());
    }
}
