//! Background tick for periodic refresh.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use log::debug;

struct Running {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// At most one ticking thread at a time. Dropping the timer stops it.
#[derive(Default)]
pub struct RefreshTimer {
    running: Option<Running>,
}

impl RefreshTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `tick` every `interval` until cancelled. A timer that is already
    /// running is cancelled first.
    pub fn start<F>(&mut self, interval: Duration, mut tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.cancel();

        let (stop, stopped) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    // Explicit stop, or the timer was dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        debug!("refresh timer started ({}s)", interval.as_secs_f64());
        self.running = Some(Running { stop, handle });
    }

    /// Stop ticking and wait for an in-progress tick to finish.
    pub fn cancel(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.stop.send(());
            let _ = running.handle.join();
            debug!("refresh timer cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn ticks_until_cancelled() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut timer = RefreshTimer::new();
        timer.start(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.is_running());
        std::thread::sleep(Duration::from_millis(80));
        timer.cancel();
        assert!(!timer.is_running());

        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen >= 1);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[test]
    fn cancel_without_start_is_noop() {
        let mut timer = RefreshTimer::new();
        timer.cancel();
        assert!(!timer.is_running());
    }
}
