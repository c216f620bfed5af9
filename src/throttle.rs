//! Subscription throttle
//!
//! Viewers do not hold a standing subscription: a subscribe request buys a
//! fixed budget of records (10 by default) that decays as records are
//! forwarded and expires outright after a grant window (180 seconds by
//! default). A viewer that wants to keep receiving must re-subscribe,
//! which simply re-grants the budget. Expiry is evaluated lazily at
//! decision time; there is no background timer.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::registry::ProducerId;

/// Throttle configuration
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Records granted per subscribe request
    pub credits: u32,

    /// How long a grant stays valid
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            credits: 10,
            window: Duration::from_secs(180),
        }
    }
}

impl ThrottleConfig {
    /// Set the records granted per subscribe request
    pub fn credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }

    /// Set the grant validity window
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

/// Outcome of a forward decision for one validated record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardDecision {
    /// Credit available and the grant window is open: broadcast the record
    Forward,
    /// No credit, or the grant expired: do not broadcast
    Drop,
}

/// Remaining credit and grant time for one identity
#[derive(Debug, Clone, Copy)]
struct CreditGrant {
    remaining: u32,
    granted_at: Option<Instant>,
}

impl CreditGrant {
    fn empty() -> Self {
        Self {
            remaining: 0,
            granted_at: None,
        }
    }
}

/// Per-producer decaying message budget
///
/// Decision and decrement happen under one lock, so concurrent forward
/// decisions for the same identity never double-spend a credit.
pub struct SubscriptionThrottle {
    grants: Mutex<HashMap<ProducerId, CreditGrant>>,
    config: ThrottleConfig,
}

impl SubscriptionThrottle {
    /// Create a throttle with default configuration
    pub fn new() -> Self {
        Self::with_config(ThrottleConfig::default())
    }

    /// Create a throttle with custom configuration
    pub fn with_config(config: ThrottleConfig) -> Self {
        Self {
            grants: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Get the throttle configuration
    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// (Re)grant the full credit budget for an identity.
    ///
    /// Unconditional: repeated calls just reset the grant, regardless of
    /// how much of the prior one was spent.
    pub fn subscribe(&self, id: &ProducerId) {
        let mut grants = self.grants.lock().expect("throttle lock poisoned");
        grants.insert(
            *id,
            CreditGrant {
                remaining: self.config.credits,
                granted_at: Some(Instant::now()),
            },
        );

        tracing::debug!(producer = %id, credits = self.config.credits, "Subscription granted");
    }

    /// Decide whether the next validated record may be forwarded.
    ///
    /// `Forward` spends one credit; `Drop` spends nothing. A grant older
    /// than the window is dead even with credit left over.
    pub fn on_record(&self, id: &ProducerId) -> ForwardDecision {
        let mut grants = self.grants.lock().expect("throttle lock poisoned");
        let grant = grants.entry(*id).or_insert_with(CreditGrant::empty);

        let window_open = grant
            .granted_at
            .map(|t| t.elapsed() < self.config.window)
            .unwrap_or(false);

        if grant.remaining > 0 && window_open {
            grant.remaining -= 1;
            ForwardDecision::Forward
        } else {
            ForwardDecision::Drop
        }
    }

    /// Credits left for an identity (0 for unknown identities)
    pub fn remaining(&self, id: &ProducerId) -> u32 {
        let grants = self.grants.lock().expect("throttle lock poisoned");
        grants.get(id).map(|g| g.remaining).unwrap_or(0)
    }
}

impl Default for SubscriptionThrottle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ProducerId {
        ProducerId::new(s.parse().unwrap())
    }

    #[test]
    fn test_unsubscribed_drops() {
        let throttle = SubscriptionThrottle::new();
        let producer = id("10.0.0.1");

        assert_eq!(throttle.on_record(&producer), ForwardDecision::Drop);
        assert_eq!(throttle.remaining(&producer), 0);
    }

    #[test]
    fn test_grant_forwards_exactly_credits_records() {
        let throttle = SubscriptionThrottle::new();
        let producer = id("10.0.0.1");

        throttle.subscribe(&producer);

        for _ in 0..10 {
            assert_eq!(throttle.on_record(&producer), ForwardDecision::Forward);
        }
        // The 11th is dropped without touching the (empty) budget
        assert_eq!(throttle.on_record(&producer), ForwardDecision::Drop);
        assert_eq!(throttle.remaining(&producer), 0);
    }

    #[test]
    fn test_resubscribe_resets_grant() {
        let throttle = SubscriptionThrottle::with_config(ThrottleConfig::default().credits(3));
        let producer = id("10.0.0.1");

        throttle.subscribe(&producer);
        assert_eq!(throttle.on_record(&producer), ForwardDecision::Forward);
        assert_eq!(throttle.remaining(&producer), 2);

        throttle.subscribe(&producer);
        assert_eq!(throttle.remaining(&producer), 3);
    }

    #[test]
    fn test_window_beats_remaining_credit() {
        let throttle = SubscriptionThrottle::with_config(
            ThrottleConfig::default().window(Duration::from_millis(20)),
        );
        let producer = id("10.0.0.1");

        throttle.subscribe(&producer);
        assert_eq!(throttle.on_record(&producer), ForwardDecision::Forward);

        std::thread::sleep(Duration::from_millis(40));

        // Credit is left over, but the grant expired
        assert!(throttle.remaining(&producer) > 0);
        assert_eq!(throttle.on_record(&producer), ForwardDecision::Drop);
        // An expired grant is not spent down
        assert_eq!(throttle.remaining(&producer), 9);
    }

    #[test]
    fn test_grant_with_no_records_just_expires() {
        let throttle = SubscriptionThrottle::with_config(
            ThrottleConfig::default().window(Duration::from_millis(10)),
        );
        let producer = id("10.0.0.1");

        throttle.subscribe(&producer);
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(throttle.on_record(&producer), ForwardDecision::Drop);
    }

    #[test]
    fn test_identities_throttled_independently() {
        let throttle = SubscriptionThrottle::with_config(ThrottleConfig::default().credits(1));
        let a = id("10.0.0.1");
        let b = id("10.0.0.2");

        throttle.subscribe(&a);

        assert_eq!(throttle.on_record(&a), ForwardDecision::Forward);
        assert_eq!(throttle.on_record(&b), ForwardDecision::Drop);
        assert_eq!(throttle.on_record(&a), ForwardDecision::Drop);
    }

    #[test]
    fn test_no_double_spend_under_contention() {
        use std::sync::Arc;

        let throttle = Arc::new(SubscriptionThrottle::new());
        let producer = id("10.0.0.1");
        throttle.subscribe(&producer);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let throttle = Arc::clone(&throttle);
            handles.push(std::thread::spawn(move || {
                let mut forwarded = 0u32;
                for _ in 0..10 {
                    if throttle.on_record(&producer) == ForwardDecision::Forward {
                        forwarded += 1;
                    }
                }
                forwarded
            }));
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 10);
    }
}
