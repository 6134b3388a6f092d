use std::ops::ControlFlow;

/// Anything a query can report, ordered by how "good" the hit is (lower is better).
pub trait CollisionResult {
    fn early_out_fraction(&self) -> f32;
}

/// Receives the hits of a query.
///
/// `add_hit` returns `ControlFlow::Break` when the collector does not want any
/// more results; queries stop as soon as they see it.
pub trait CollisionCollector<R> {
    fn add_hit(&mut self, result: R) -> ControlFlow<()>;

    /// Hits with a fraction at or beyond this value are not interesting anymore.
    fn early_out_fraction(&self) -> f32 {
        f32::MAX
    }

    fn should_early_out(&self) -> bool {
        false
    }
}

/// Collects every hit.
#[derive(Debug)]
pub struct AllHitCollector<R> {
    pub hits: Vec<R>,
}

impl<R> Default for AllHitCollector<R> {
    fn default() -> Self {
        Self { hits: Vec::new() }
    }
}

impl<R: CollisionResult> AllHitCollector<R> {
    pub fn sort(&mut self) {
        self.hits
            .sort_by(|a, b| a.early_out_fraction().total_cmp(&b.early_out_fraction()));
    }

    #[inline]
    pub fn had_hit(&self) -> bool {
        !self.hits.is_empty()
    }
}

impl<R: CollisionResult> CollisionCollector<R> for AllHitCollector<R> {
    fn add_hit(&mut self, result: R) -> ControlFlow<()> {
        self.hits.push(result);
        ControlFlow::Continue(())
    }
}

/// Keeps only the hit with the lowest early out fraction.
#[derive(Debug)]
pub struct ClosestHitCollector<R> {
    pub hit: Option<R>,
    closest_fraction: f32,
}

impl<R> Default for ClosestHitCollector<R> {
    fn default() -> Self {
        Self {
            hit: None,
            closest_fraction: f32::MAX,
        }
    }
}

impl<R: CollisionResult> CollisionCollector<R> for ClosestHitCollector<R> {
    fn add_hit(&mut self, result: R) -> ControlFlow<()> {
        let fraction = result.early_out_fraction();
        if fraction < self.closest_fraction {
            self.closest_fraction = fraction;
            self.hit = Some(result);
        }

        ControlFlow::Continue(())
    }

    #[inline]
    fn early_out_fraction(&self) -> f32 {
        self.closest_fraction
    }
}

/// Stops the query after the first hit.
#[derive(Debug)]
pub struct AnyHitCollector<R> {
    pub hit: Option<R>,
}

impl<R> Default for AnyHitCollector<R> {
    fn default() -> Self {
        Self { hit: None }
    }
}

impl<R> CollisionCollector<R> for AnyHitCollector<R> {
    fn add_hit(&mut self, result: R) -> ControlFlow<()> {
        self.hit = Some(result);
        ControlFlow::Break(())
    }

    #[inline]
    fn should_early_out(&self) -> bool {
        self.hit.is_some()
    }
}
