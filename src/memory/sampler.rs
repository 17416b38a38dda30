use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::probe::{MemoryProbe, SystemProbe};

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

struct Running {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Background peak-memory tracker.
///
/// `start` spawns a periodic task on the current tokio runtime; `stop` signals
/// it and waits for it to exit, after which [`peak_kb`](Self::peak_kb) stays
/// fixed until the next `start`.
pub struct MemorySampler {
    probe: Arc<dyn MemoryProbe>,
    interval: Duration,
    peak: Arc<Mutex<u64>>,
    running: Option<Running>,
}

impl MemorySampler {
    pub fn new(probe: Arc<dyn MemoryProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval,
            peak: Arc::new(Mutex::new(0)),
            running: None,
        }
    }

    /// Sampler over a [`SystemProbe`] tracking the named process.
    pub fn for_process(name: impl Into<String>) -> Self {
        Self::new(
            Arc::new(SystemProbe::for_process(name)),
            DEFAULT_SAMPLE_INTERVAL,
        )
    }

    /// Sampler over the calling process only.
    pub fn for_self() -> Self {
        Self::new(Arc::new(SystemProbe::for_self()), DEFAULT_SAMPLE_INTERVAL)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Resets the peak and begins sampling. No-op while already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }
        *self.peak.lock() = 0;

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let probe = Arc::clone(&self.probe);
        let peak = Arc::clone(&self.peak);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let probe = Arc::clone(&probe);
                        let current = tokio::task::spawn_blocking(move || probe.sample_kb())
                            .await
                            .unwrap_or(0);
                        let mut peak = peak.lock();
                        *peak = (*peak).max(current);
                    }
                }
            }
        });

        self.running = Some(Running { stop_tx, handle });
    }

    /// Stops sampling and waits for the background task. No-op when stopped.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        // The task may already be gone if the runtime is shutting down.
        let _ = running.stop_tx.send(());
        if let Err(err) = running.handle.await {
            log::warn!("memory sampler task ended abnormally: {err}");
        }
    }

    /// Highest sample seen since the last `start`, in kilobytes.
    pub fn peak_kb(&self) -> u64 {
        *self.peak.lock()
    }
}

impl Drop for MemorySampler {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
        }
    }
}
