use log::{error, info};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// Wall-clock limit for the whole process.
///
/// When armed, a watchdog thread terminates the process once the limit
/// elapses. Lifting disarms the watchdog for the rest of the run.
#[derive(Debug, Default)]
pub struct TimeLimit {
    disarm_tx: Mutex<Option<Sender<()>>>,
    lifted: AtomicBool,
}

impl TimeLimit {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn arm(limit: Duration) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        thread::Builder::new()
            .name("time-limit-watchdog".to_string())
            .spawn(move || match rx.recv_timeout(limit) {
                Err(RecvTimeoutError::Timeout) => {
                    error!("Maximum execution time of {:?} exceeded", limit);
                    std::process::exit(1);
                }
                // Lifted, or the limit itself was dropped.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            })
            .map(|_| ())
            .unwrap_or_else(|e| error!("Failed to spawn time limit watchdog: {}", e));

        Self {
            disarm_tx: Mutex::new(Some(tx)),
            lifted: AtomicBool::new(false),
        }
    }

    pub fn lift(&self) {
        let tx = match self.disarm_tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(tx) = tx {
            let _ = tx.send(());
            info!("Execution time limit lifted");
        }
        self.lifted.store(true, Ordering::SeqCst);
    }

    pub fn is_lifted(&self) -> bool {
        self.lifted.load(Ordering::SeqCst)
    }

    pub fn is_armed(&self) -> bool {
        match self.disarm_tx.lock() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifting_disarms_the_watchdog() {
        let limit = TimeLimit::arm(Duration::from_secs(3600));
        assert!(limit.is_armed());
        assert!(!limit.is_lifted());

        limit.lift();

        assert!(!limit.is_armed());
        assert!(limit.is_lifted());
    }

    #[test]
    fn lifting_an_unarmed_limit_is_harmless() {
        let limit = TimeLimit::none();
        limit.lift();
        limit.lift();
        assert!(limit.is_lifted());
    }
}
