use std::sync::atomic::{AtomicUsize, Ordering};

/// Matched/skipped line counters, or succeeded/failed jobs. Shared across
/// worker threads by reference.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    processed: AtomicUsize,
    errors: AtomicUsize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// `(processed, errors)`.
    pub fn snapshot(&self) -> (usize, usize) {
        (
            self.processed.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn counts_from_several_threads() {
        let recorder = Arc::new(MetricsRecorder::new());
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let recorder = Arc::clone(&recorder);
                thread::spawn(move || {
                    if i < 4 {
                        recorder.record_processed();
                    } else {
                        recorder.record_error();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(recorder.snapshot(), (4, 2));
    }
}
