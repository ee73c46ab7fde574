use log::{debug, warn};

use super::model::STANDARD_SEA_LEVEL_KPA;

/// Reentrant freeze gate around the sea-level pressure reference.
///
/// While at least one freeze is held, writes are parked in a single pending
/// slot (last writer wins) and readers keep seeing the value that was in
/// effect when the outermost freeze began. The pending value lands when the
/// final matching `end_freeze` runs.
///
/// Lives on the pipeline's single context, so it carries no lock.
#[derive(Debug, Clone)]
pub struct PressureReferenceGuard {
    reference_kpa: f64,
    freeze_depth: u32,
    pending_kpa: Option<f64>,
}

impl Default for PressureReferenceGuard {
    fn default() -> Self {
        Self::new(STANDARD_SEA_LEVEL_KPA)
    }
}

impl PressureReferenceGuard {
    pub fn new(reference_kpa: f64) -> Self {
        Self {
            reference_kpa,
            freeze_depth: 0,
            pending_kpa: None,
        }
    }

    pub fn reference_kpa(&self) -> f64 {
        self.reference_kpa
    }

    pub fn freeze_depth(&self) -> u32 {
        self.freeze_depth
    }

    pub fn pending_kpa(&self) -> Option<f64> {
        self.pending_kpa
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze_depth > 0
    }

    pub fn begin_freeze(&mut self) {
        self.freeze_depth = self.freeze_depth.saturating_add(1);
    }

    pub fn set_reference(&mut self, kpa: f64) {
        if self.freeze_depth == 0 {
            self.reference_kpa = kpa;
        } else {
            debug!(
                "sea-level reference frozen (depth {}), deferring {:.3} kPa",
                self.freeze_depth, kpa
            );
            self.pending_kpa = Some(kpa);
        }
    }

    pub fn end_freeze(&mut self) {
        if self.freeze_depth == 0 {
            warn!("end_freeze called without a matching begin_freeze");
            return;
        }
        self.freeze_depth -= 1;
        if self.freeze_depth == 0 {
            if let Some(pending) = self.pending_kpa.take() {
                self.reference_kpa = pending;
            }
        }
    }

    /// Runs `f` inside a matched begin/end pair.
    pub fn frozen<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_freeze();
        let result = f(self);
        self.end_freeze();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfrozen_write_applies_immediately() {
        let mut guard = PressureReferenceGuard::default();
        assert!((guard.reference_kpa() - 101.325).abs() < 1e-9);

        guard.set_reference(99.9);
        assert!((guard.reference_kpa() - 99.9).abs() < 1e-9);
    }

    #[test]
    fn frozen_write_waits_for_end() {
        let mut guard = PressureReferenceGuard::default();
        let original = guard.reference_kpa();

        guard.begin_freeze();
        guard.set_reference(102.0);
        assert_eq!(guard.reference_kpa(), original);

        guard.end_freeze();
        assert_eq!(guard.reference_kpa(), 102.0);
        assert!(guard.pending_kpa().is_none());
    }

    #[test]
    fn nested_freeze_defers_until_final_end() {
        let mut guard = PressureReferenceGuard::default();
        let original = guard.reference_kpa();

        guard.begin_freeze();
        guard.begin_freeze();
        guard.set_reference(103.3);
        assert_eq!(guard.reference_kpa(), original);

        guard.end_freeze();
        assert_eq!(guard.reference_kpa(), original);
        assert_eq!(guard.freeze_depth(), 1);

        guard.end_freeze();
        assert_eq!(guard.reference_kpa(), 103.3);
    }

    #[test]
    fn last_pending_value_wins() {
        let mut guard = PressureReferenceGuard::default();
        guard.begin_freeze();
        guard.begin_freeze();

        guard.set_reference(100.1);
        guard.set_reference(100.2);
        guard.set_reference(100.3);

        guard.end_freeze();
        guard.end_freeze();
        assert_eq!(guard.reference_kpa(), 100.3);
    }

    #[test]
    fn unmatched_end_does_not_underflow() {
        let mut guard = PressureReferenceGuard::new(100.0);
        guard.end_freeze();
        assert_eq!(guard.freeze_depth(), 0);

        guard.set_reference(98.0);
        assert_eq!(guard.reference_kpa(), 98.0);
    }

    #[test]
    fn frozen_closure_applies_on_exit() {
        let mut guard = PressureReferenceGuard::new(100.0);
        let seen = guard.frozen(|g| {
            g.set_reference(101.0);
            g.frozen(|inner| inner.set_reference(101.5));
            g.reference_kpa()
        });

        assert_eq!(seen, 100.0);
        assert_eq!(guard.reference_kpa(), 101.5);
        assert!(!guard.is_frozen());
    }
}
