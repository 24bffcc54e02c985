use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;

use crate::provider::Provenance;

/// One named attempt to obtain a payload from a specific source. An empty
/// or invalid result must be reported as `Err`, not as a degenerate `Ok`;
/// the orchestrator treats any `Err` as "advance to the next strategy".
#[async_trait]
pub trait FetchStrategy<T>: Send + Sync {
    fn name(&self) -> &str;
    fn provenance(&self) -> Provenance {
        Provenance::ExternalApi
    }
    async fn attempt(&self) -> anyhow::Result<T>;
}

/// A payload tagged with the strategy that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub strategy: String,
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    pub fn fallback(value: T) -> Self {
        Self {
            value,
            strategy: "static-fallback".to_string(),
            provenance: Provenance::StaticFallback,
        }
    }
}

/// Rejects calls that arrive within a minimum interval of the previous
/// accepted call. Protects shared external quota, not correctness; callers
/// short-circuit to their fallback payload when blocked.
#[derive(Debug)]
pub struct MinIntervalGate {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinIntervalGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Returns `true` and records the call time when enough time has
    /// passed; `false` when the call is too frequent.
    pub fn admit(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match *last {
            Some(prev) if now.duration_since(prev) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// Prioritized list of strategies, tried strictly in order. The first
/// success wins and later strategies are never invoked; if everything
/// fails, the caller-supplied static payload is returned instead of an
/// error, tagged `static_fallback`. Each attempt is bounded by `timeout`.
pub struct Orchestrator<T> {
    label: &'static str,
    strategies: Vec<Box<dyn FetchStrategy<T>>>,
    timeout: Duration,
    gate: Option<std::sync::Arc<MinIntervalGate>>,
}

impl<T: Send> Orchestrator<T> {
    pub fn new(label: &'static str, timeout: Duration) -> Self {
        Self {
            label,
            strategies: Vec::new(),
            timeout,
            gate: None,
        }
    }

    /// Attach a min-interval gate; blocked calls skip every strategy and go
    /// straight to the fallback payload.
    pub fn with_gate(mut self, gate: std::sync::Arc<MinIntervalGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn push(mut self, strategy: Box<dyn FetchStrategy<T>>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub async fn fetch(&self, fallback: impl FnOnce() -> T) -> Sourced<T> {
        if let Some(gate) = &self.gate {
            if !gate.admit() {
                tracing::info!("{}: request too frequent, using fallback", self.label);
                return Sourced::fallback(fallback());
            }
        }

        for strategy in &self.strategies {
            match tokio::time::timeout(self.timeout, strategy.attempt()).await {
                Ok(Ok(value)) => {
                    tracing::info!("{}: strategy {} succeeded", self.label, strategy.name());
                    return Sourced {
                        value,
                        strategy: strategy.name().to_string(),
                        provenance: strategy.provenance(),
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!("{}: strategy {} failed: {e:#}", self.label, strategy.name());
                }
                Err(_) => {
                    tracing::warn!(
                        "{}: strategy {} timed out after {:?}",
                        self.label,
                        strategy.name(),
                        self.timeout
                    );
                }
            }
        }

        tracing::warn!("{}: all strategies exhausted, using fallback", self.label);
        Sourced::fallback(fallback())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Fails {
        name: &'static str,
    }

    #[async_trait]
    impl FetchStrategy<u32> for Fails {
        fn name(&self) -> &str {
            self.name
        }
        async fn attempt(&self) -> anyhow::Result<u32> {
            anyhow::bail!("unavailable")
        }
    }

    struct Succeeds {
        name: &'static str,
        value: u32,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FetchStrategy<u32> for Succeeds {
        fn name(&self) -> &str {
            self.name
        }
        async fn attempt(&self) -> anyhow::Result<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value)
        }
    }

    struct Hangs;

    #[async_trait]
    impl FetchStrategy<u32> for Hangs {
        fn name(&self) -> &str {
            "hangs"
        }
        async fn attempt(&self) -> anyhow::Result<u32> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0)
        }
    }

    #[tokio::test]
    async fn first_success_wins_and_later_strategies_are_not_invoked() {
        let second_calls = Arc::new(AtomicUsize::new(0));
        let third_calls = Arc::new(AtomicUsize::new(0));

        let orch = Orchestrator::new("test", Duration::from_secs(1))
            .push(Box::new(Fails { name: "one" }))
            .push(Box::new(Succeeds {
                name: "two",
                value: 2,
                calls: second_calls.clone(),
            }))
            .push(Box::new(Succeeds {
                name: "three",
                value: 3,
                calls: third_calls.clone(),
            }));

        let got = orch.fetch(|| 99).await;
        assert_eq!(got.value, 2);
        assert_eq!(got.strategy, "two");
        assert_eq!(got.provenance, Provenance::ExternalApi);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhaustion_returns_static_fallback_without_error() {
        let orch = Orchestrator::new("test", Duration::from_secs(1))
            .push(Box::new(Fails { name: "one" }))
            .push(Box::new(Fails { name: "two" }));

        let got = orch.fetch(|| 42).await;
        assert_eq!(got.value, 42);
        assert_eq!(got.provenance, Provenance::StaticFallback);
        assert_eq!(got.strategy, "static-fallback");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_failure_and_the_chain_advances() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::new("test", Duration::from_millis(50))
            .push(Box::new(Hangs))
            .push(Box::new(Succeeds {
                name: "next",
                value: 7,
                calls: calls.clone(),
            }));

        let got = orch.fetch(|| 0).await;
        assert_eq!(got.value, 7);
        assert_eq!(got.strategy, "next");
    }

    #[tokio::test]
    async fn gate_short_circuits_frequent_calls_to_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(MinIntervalGate::new(Duration::from_secs(60)));
        let orch = Orchestrator::new("test", Duration::from_secs(1))
            .with_gate(gate)
            .push(Box::new(Succeeds {
                name: "net",
                value: 1,
                calls: calls.clone(),
            }));

        let first = orch.fetch(|| 0).await;
        assert_eq!(first.value, 1);

        let second = orch.fetch(|| 0).await;
        assert_eq!(second.value, 0);
        assert_eq!(second.provenance, Provenance::StaticFallback);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
