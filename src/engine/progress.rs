use std::sync::atomic::{AtomicUsize, Ordering};

/// Best-effort progress reporter for one counting pass.
///
/// Counters are read with relaxed ordering while tasks are still
/// running, so snapshots are advisory and may lag; they are never used
/// for correctness.
pub struct Progress {
    label: &'static str,
    quiet: bool,
    last: AtomicUsize,
}

impl Progress {
    pub fn new(label: &'static str, quiet: bool) -> Self {
        Progress {
            label,
            quiet,
            last: AtomicUsize::new(0),
        }
    }

    /// Emit a snapshot line, throttled to roughly one per percent.
    pub fn emit(&self, done: usize, total: usize) {
        if self.quiet || total == 0 {
            return;
        }
        let step = (total / 100).max(1);
        let last = self.last.load(Ordering::Relaxed);
        if done != total && done < last.saturating_add(step) {
            return;
        }
        self.last.store(done, Ordering::Relaxed);
        let percent = done * 100 / total;
        eprintln!("{}: {}% ({}/{})", self.label, percent, done, total);
    }
}
