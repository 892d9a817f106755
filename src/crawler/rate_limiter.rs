use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{Instant, MissedTickBehavior};

/// Burst-then-steady throttle shared by every outbound API call
///
/// Tokens flow through a bounded channel of capacity `burst`. A background task
/// pre-fills it with `burst` tokens, then adds one token per `interval`. When
/// nobody consumes, the channel fills up and the producer waits for room, so an
/// idle period never builds up more than `burst` tokens of credit.
#[derive(Debug)]
pub struct RateLimiter {
    tokens: Mutex<mpsc::Receiver<Instant>>,
    interval: Duration,
    burst: usize,
}

impl RateLimiter {
    /// Creates a limiter and starts its token producer
    ///
    /// Must be called from within a tokio runtime. A `burst` of zero is treated
    /// as one. The producer runs until the limiter is dropped.
    pub fn new(interval: Duration, burst: usize) -> Self {
        let burst = burst.max(1);
        let interval = interval.max(Duration::from_millis(1));
        let (tx, rx) = mpsc::channel(burst);

        tokio::spawn(async move {
            for _ in 0..burst {
                if tx.send(Instant::now()).await.is_err() {
                    return;
                }
            }

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the burst already covers it.
            ticker.tick().await;

            loop {
                let permit = match tx.try_reserve() {
                    Ok(permit) => permit,
                    Err(TrySendError::Full(())) => match tx.reserve().await {
                        Ok(permit) => {
                            // Credit only accrues again once there is room for it.
                            ticker.reset();
                            permit
                        }
                        Err(_) => break,
                    },
                    Err(TrySendError::Closed(())) => break,
                };
                permit.send(ticker.tick().await);
            }

            tracing::trace!("Rate limiter dropped, stopping token producer");
        });

        Self {
            tokens: Mutex::new(rx),
            interval,
            burst,
        }
    }

    /// Waits until one more operation is permitted
    ///
    /// Callers are served in the order they started waiting.
    pub async fn acquire(&self) {
        let mut tokens = self.tokens.lock().await;
        // The producer only stops once `self` is gone, so this never sees `None`
        // while the limiter is alive.
        let _ = tokens.recv().await;
    }

    /// Steady-state spacing between grants
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of grants available without waiting
    pub fn burst(&self) -> usize {
        self.burst
    }
}
