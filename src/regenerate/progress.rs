use indicatif::ProgressBar;

/// Receives one tick per record seen and a single completion signal.
pub trait ProgressSink {
    fn advance(&self);
    fn finish(&self);
}

impl ProgressSink for ProgressBar {
    fn advance(&self) {
        self.inc(1);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }
}
