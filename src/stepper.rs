//! Resumable spiral pass.
//!
//! A [`SteppingLoop`] walks spiral indices `0..num_cells` one at a time. After
//! every index it asks a [`YieldProbe`] whether the host wants control back;
//! if so it returns [`Step::Yield`] and picks up at the next index on the
//! following [`SteppingLoop::resume`]. All progress lives in the loop itself,
//! so a host can drive it from any scheduling loop it likes.

use std::time::{Duration, Instant};

use crate::config::PassParams;
use crate::error::PassError;
use crate::pass::PassToken;
use crate::spiral::{Offset, SpiralCursor, Viewport};

/// Per-cell decisions injected by the caller.
///
/// Both methods may keep side statistics (the largest marked index, say);
/// the loop only relies on them being called in index order.
pub trait CellRule {
    type Value;

    /// Whether the visible cell at `index` gets painted at all.
    fn should_mark(&mut self, index: u64) -> bool;

    /// What to paint for a marked cell.
    fn value_for(&mut self, index: u64) -> Self::Value;
}

/// Destination for painted cells.
pub trait CellSink<V> {
    fn paint(&mut self, offset: Offset, tile_size: f64, value: V);
}

impl<V, F> CellSink<V> for F
where
    F: FnMut(Offset, f64, V),
{
    fn paint(&mut self, offset: Offset, tile_size: f64, value: V) {
        self(offset, tile_size, value)
    }
}

/// Host scheduler probe, queried once after every index.
pub trait YieldProbe {
    fn should_yield(&mut self) -> bool;
}

impl<F> YieldProbe for F
where
    F: FnMut() -> bool,
{
    fn should_yield(&mut self) -> bool {
        self()
    }
}

/// Never hand control back; the pass runs to completion in one resume.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverYield;

impl YieldProbe for NeverYield {
    fn should_yield(&mut self) -> bool {
        false
    }
}

/// Yield after every single index.
#[derive(Clone, Copy, Debug, Default)]
pub struct EveryStep;

impl YieldProbe for EveryStep {
    fn should_yield(&mut self) -> bool {
        true
    }
}

/// Yield once a wall-clock deadline has passed.
#[derive(Clone, Copy, Debug)]
pub struct TimeBudget {
    deadline: Instant,
}

impl TimeBudget {
    /// Budget starting now.
    pub fn new(budget: Duration) -> Self {
        Self::until(Instant::now() + budget)
    }

    pub fn until(deadline: Instant) -> Self {
        Self { deadline }
    }
}

impl YieldProbe for TimeBudget {
    fn should_yield(&mut self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Adapts a pair of closures into a [`CellRule`].
pub struct FnRule<M, C> {
    mark: M,
    value: C,
}

impl<M, C> FnRule<M, C> {
    pub fn new<V>(mark: M, value: C) -> Self
    where
        M: FnMut(u64) -> bool,
        C: FnMut(u64) -> V,
    {
        Self { mark, value }
    }
}

impl<M, C, V> CellRule for FnRule<M, C>
where
    M: FnMut(u64) -> bool,
    C: FnMut(u64) -> V,
{
    type Value = V;

    fn should_mark(&mut self, index: u64) -> bool {
        (self.mark)(index)
    }

    fn value_for(&mut self, index: u64) -> V {
        (self.value)(index)
    }
}

/// Outcome of a step or resume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// One index done, the host did not ask for control.
    Continue,
    /// The host asked for control; resume to continue at the next index.
    Yield,
    /// Every index has been visited.
    Done,
    /// A newer pass took over this pass's slot; nothing more will be painted.
    Superseded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassState {
    NotStarted,
    Running,
    Suspended,
    Completed,
    Superseded,
}

impl PassState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PassState::Completed | PassState::Superseded)
    }
}

/// One pass over the spiral, resumable between indices.
pub struct SteppingLoop<R> {
    params: PassParams,
    viewport: Viewport,
    rule: R,
    token: PassToken,
    cursor: SpiralCursor,
    index: u64,
    num_cells: u64,
    state: PassState,
}

impl<R: CellRule> SteppingLoop<R> {
    /// Validate `params` and set up a pass that has not visited any index yet.
    pub fn start(params: PassParams, rule: R, token: PassToken) -> Result<Self, PassError> {
        params.validate()?;
        let num_cells = params.num_cells();
        log::debug!(
            "pass {} starting: width={} tile={} iterations={} cells={}",
            token.generation(),
            params.width,
            params.tile_size,
            params.iterations,
            num_cells
        );
        Ok(Self {
            viewport: Viewport::new(params.width),
            params,
            rule,
            token,
            cursor: SpiralCursor::new(),
            index: 0,
            num_cells,
            state: PassState::NotStarted,
        })
    }

    /// Process exactly one index, then consult `probe` unless the pass is done.
    pub fn step<S, P>(&mut self, sink: &mut S, probe: &mut P) -> Step
    where
        S: CellSink<R::Value> + ?Sized,
        P: YieldProbe + ?Sized,
    {
        match self.state {
            PassState::Completed => return Step::Done,
            PassState::Superseded => return Step::Superseded,
            _ => {}
        }
        if !self.token.is_current() {
            log::debug!(
                "pass {} superseded at index {}/{}",
                self.token.generation(),
                self.index,
                self.num_cells
            );
            self.state = PassState::Superseded;
            return Step::Superseded;
        }
        if self.index >= self.num_cells {
            return self.complete();
        }

        self.state = PassState::Running;
        let offset = self.cursor.position().scaled(self.params.tile_size);
        if self.viewport.contains(offset) && self.rule.should_mark(self.index) {
            let value = self.rule.value_for(self.index);
            sink.paint(offset, self.params.tile_size, value);
        }
        self.cursor.advance();
        self.index += 1;

        if self.index >= self.num_cells {
            self.complete()
        } else if probe.should_yield() {
            self.state = PassState::Suspended;
            Step::Yield
        } else {
            Step::Continue
        }
    }

    /// Step until the probe asks for control, the pass ends or it is superseded.
    pub fn resume<S, P>(&mut self, sink: &mut S, probe: &mut P) -> Step
    where
        S: CellSink<R::Value> + ?Sized,
        P: YieldProbe + ?Sized,
    {
        loop {
            match self.step(sink, probe) {
                Step::Continue => {}
                Step::Yield => {
                    log::trace!("pass {} yielded at index {}", self.token.generation(), self.index);
                    return Step::Yield;
                }
                other => return other,
            }
        }
    }

    /// Drive the pass to its end without yielding.
    pub fn run_to_end<S>(&mut self, sink: &mut S) -> Step
    where
        S: CellSink<R::Value> + ?Sized,
    {
        self.resume(sink, &mut NeverYield)
    }

    fn complete(&mut self) -> Step {
        if self.state != PassState::Completed {
            log::debug!("pass {} complete: {} cells", self.token.generation(), self.num_cells);
        }
        self.state = PassState::Completed;
        Step::Done
    }

    /// Next index to be visited.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn num_cells(&self) -> u64 {
        self.num_cells
    }

    /// Fraction of indices visited, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.num_cells == 0 {
            1.0
        } else {
            self.index as f64 / self.num_cells as f64
        }
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn params(&self) -> &PassParams {
        &self.params
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn rule_mut(&mut self) -> &mut R {
        &mut self.rule
    }

    pub fn token(&self) -> &PassToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::PassSlot;
    use crate::primality::{is_probably_prime, REFERENCE_ROUNDS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type Painted = Vec<(Offset, f64, u64)>;

    fn params(width: f64, tile_size: f64) -> PassParams {
        PassParams {
            width,
            tile_size,
            iterations: REFERENCE_ROUNDS,
        }
    }

    fn prime_rule(seed: u64) -> impl CellRule<Value = u64> {
        let mut rng = StdRng::seed_from_u64(seed);
        FnRule::new(
            move |i| is_probably_prime(i, REFERENCE_ROUNDS, &mut rng),
            |i| i,
        )
    }

    fn collect_with<P: YieldProbe>(mut probe: P) -> (Painted, usize) {
        let mut pass = SteppingLoop::start(params(8.0, 1.0), prime_rule(11), PassToken::detached())
            .expect("valid params");
        let mut painted = Vec::new();
        let mut sink = |o: Offset, t: f64, v: u64| painted.push((o, t, v));
        let mut resumes = 1;
        while pass.resume(&mut sink, &mut probe) == Step::Yield {
            resumes += 1;
        }
        assert_eq!(pass.state(), PassState::Completed);
        (painted, resumes)
    }

    #[test]
    fn test_end_to_end_marks_primes_in_index_order() {
        let (painted, resumes) = collect_with(NeverYield);
        assert_eq!(resumes, 1);

        let marked: Vec<u64> = painted.iter().map(|(_, _, i)| *i).collect();
        let expected: Vec<u64> = vec![
            2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61,
        ];
        assert_eq!(marked, expected);

        for (offset, tile, _) in &painted {
            assert_eq!(*tile, 1.0);
            assert!(
                (-4.0..=4.0).contains(&offset.x) && (-4.0..=4.0).contains(&offset.y),
                "{:?} escapes the 8x8 square",
                offset
            );
        }
    }

    #[test]
    fn test_yield_every_step_matches_uninterrupted_run() {
        let (uninterrupted, _) = collect_with(NeverYield);
        let (interleaved, resumes) = collect_with(EveryStep);
        assert_eq!(uninterrupted, interleaved);
        // one resume per index: every step but the last yields
        assert_eq!(resumes, 64);
    }

    #[test]
    fn test_closure_probe_yields_on_schedule() {
        let mut calls = 0;
        let probe = || {
            calls += 1;
            calls % 10 == 0
        };
        let (painted, resumes) = collect_with(probe);
        let (uninterrupted, _) = collect_with(NeverYield);
        assert_eq!(painted, uninterrupted);
        // 63 probe queries (none after the final index), yielding on every tenth
        assert_eq!(resumes, 7);
    }

    #[test]
    fn test_invisible_cells_skip_callbacks() {
        // width 3 at tile 2 walks (0,0), (2,0), (2,2); only the centre is within (-1.5, 1.5]
        let mut asked = Vec::new();
        let rule = FnRule::new(
            |i| {
                asked.push(i);
                true
            },
            |i| i,
        );
        let mut pass = SteppingLoop::start(params(3.0, 2.0), rule, PassToken::detached())
            .expect("valid params");
        assert_eq!(pass.num_cells(), 3);
        let mut painted = Vec::new();
        let mut sink = |o: Offset, _t: f64, v: u64| painted.push((o, v));
        assert_eq!(pass.run_to_end(&mut sink), Step::Done);
        drop(pass);

        assert_eq!(asked, vec![0]);
        assert_eq!(painted, vec![(Offset { x: 0.0, y: 0.0 }, 0)]);
    }

    #[test]
    fn test_tile_size_scales_offsets() {
        let rule = FnRule::new(|_| true, |i| i);
        let mut pass = SteppingLoop::start(params(12.0, 3.0), rule, PassToken::detached())
            .expect("valid params");
        let mut painted = Vec::new();
        let mut sink = |o: Offset, t: f64, v: u64| painted.push((o, t, v));
        pass.run_to_end(&mut sink);

        assert_eq!(painted.len(), 16);
        assert_eq!(painted[2], (Offset { x: 3.0, y: 3.0 }, 3.0, 2));
        for (offset, _, i) in &painted {
            assert_eq!(*offset, crate::spiral::cell_offset(*i, 3.0));
        }
    }

    #[test]
    fn test_superseded_pass_stops_painting() {
        let slot = PassSlot::new();
        let mut old = SteppingLoop::start(params(8.0, 1.0), prime_rule(1), slot.begin())
            .expect("valid params");
        let mut painted = Vec::new();
        let mut sink = |_o: Offset, _t: f64, v: u64| painted.push(v);

        let mut budget = 0;
        let mut probe = || {
            budget += 1;
            budget >= 20
        };
        assert_eq!(old.resume(&mut sink, &mut probe), Step::Yield);
        assert_eq!(old.index(), 20);

        let new = SteppingLoop::start(params(8.0, 1.0), prime_rule(1), slot.begin())
            .expect("valid params");
        assert_eq!(old.resume(&mut sink, &mut NeverYield), Step::Superseded);
        assert_eq!(old.state(), PassState::Superseded);
        assert_eq!(old.index(), 20);
        // terminal passes stay terminal
        assert_eq!(old.resume(&mut sink, &mut NeverYield), Step::Superseded);
        drop(sink);

        assert_eq!(painted, vec![2, 3, 5, 7, 11, 13, 17, 19]);
        assert!(new.token().is_current());
        assert_eq!(new.state(), PassState::NotStarted);
    }

    #[test]
    fn test_state_transitions() {
        let rule = FnRule::new(|_| false, |i| i);
        let mut pass = SteppingLoop::start(params(2.0, 1.0), rule, PassToken::detached())
            .expect("valid params");
        let mut sink = |_o: Offset, _t: f64, _v: u64| {};
        assert_eq!(pass.state(), PassState::NotStarted);
        assert_eq!(pass.progress(), 0.0);

        assert_eq!(pass.step(&mut sink, &mut NeverYield), Step::Continue);
        assert_eq!(pass.state(), PassState::Running);

        assert_eq!(pass.step(&mut sink, &mut EveryStep), Step::Yield);
        assert_eq!(pass.state(), PassState::Suspended);
        assert_eq!(pass.progress(), 0.5);

        assert_eq!(pass.resume(&mut sink, &mut NeverYield), Step::Done);
        assert_eq!(pass.state(), PassState::Completed);
        assert_eq!(pass.index(), 4);
        assert_eq!(pass.step(&mut sink, &mut NeverYield), Step::Done);
    }

    #[test]
    fn test_empty_pass_completes_immediately() {
        let rule = FnRule::new(|_| true, |i| i);
        let mut pass = SteppingLoop::start(params(0.0, 1.0), rule, PassToken::detached())
            .expect("valid params");
        let mut painted = 0;
        let mut sink = |_o: Offset, _t: f64, _v: u64| painted += 1;
        assert_eq!(pass.resume(&mut sink, &mut EveryStep), Step::Done);
        drop(sink);
        assert_eq!(painted, 0);
        assert_eq!(pass.progress(), 1.0);
    }

    #[test]
    fn test_start_fails_fast_on_bad_params() {
        let rule = FnRule::new(|_| true, |i| i);
        let result = SteppingLoop::start(params(8.0, 0.0), rule, PassToken::detached());
        assert!(matches!(result, Err(PassError::NonPositiveTileSize(_))));
    }

    #[test]
    fn test_expired_time_budget_yields() {
        let mut probe = TimeBudget::until(Instant::now());
        assert!(probe.should_yield());
        let mut generous = TimeBudget::new(Duration::from_secs(3600));
        assert!(!generous.should_yield());
    }
}
