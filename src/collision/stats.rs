use std::sync::atomic::{AtomicU32, Ordering};

/// Approximate counters for convex vs convex queries.
///
/// Increments use relaxed ordering so totals read while queries run on other threads are
/// only estimates. `reset` is meant to be called between steps by a single owner.
#[derive(Debug, Default)]
pub struct CollideStats {
    collide_calls: AtomicU32,
    gjk_separated: AtomicU32,
    epa_runs: AtomicU32,
    epa_failures: AtomicU32,
    hits: AtomicU32,
    cast_calls: AtomicU32,
}

/// Plain copy of [`CollideStats`] taken at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollideStatsSnapshot {
    pub collide_calls: u32,
    pub gjk_separated: u32,
    pub epa_runs: u32,
    pub epa_failures: u32,
    pub hits: u32,
    pub cast_calls: u32,
}

impl CollideStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            collide_calls: AtomicU32::new(0),
            gjk_separated: AtomicU32::new(0),
            epa_runs: AtomicU32::new(0),
            epa_failures: AtomicU32::new(0),
            hits: AtomicU32::new(0),
            cast_calls: AtomicU32::new(0),
        }
    }

    #[inline]
    pub(crate) fn count_collide(&self) {
        self.collide_calls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_separated(&self) {
        self.gjk_separated.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_epa(&self) {
        self.epa_runs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_epa_failure(&self) {
        self.epa_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_cast(&self) {
        self.cast_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        for counter in [
            &self.collide_calls,
            &self.gjk_separated,
            &self.epa_runs,
            &self.epa_failures,
            &self.hits,
            &self.cast_calls,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> CollideStatsSnapshot {
        CollideStatsSnapshot {
            collide_calls: self.collide_calls.load(Ordering::Relaxed),
            gjk_separated: self.gjk_separated.load(Ordering::Relaxed),
            epa_runs: self.epa_runs.load(Ordering::Relaxed),
            epa_failures: self.epa_failures.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            cast_calls: self.cast_calls.load(Ordering::Relaxed),
        }
    }
}
