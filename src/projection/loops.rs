//! Borrow-swap-redeposit loop construction
//!
//! Each cycle borrows `ltv * collateral - debt`, swaps it 1:1 into the
//! collateral asset and supplies it again. Borrowing headroom shrinks by a
//! factor of `ltv` every cycle, so leverage converges to `1 / (1 - ltv)`.

use super::state::LoopPosition;
use crate::error::{check, CalcResult};

/// Default smallest borrow increment worth another cycle
pub const DEFAULT_MIN_BORROW: f64 = 0.01;

/// Non-positive minimum borrows are raised to this floor so loops terminate
pub const MIN_BORROW_FLOOR: f64 = 1e-9;

/// Hard cap on cycles for the open-ended searches
pub const MAX_LOOP_ITERATIONS: u32 = 10_000;

/// Why a loop sequence stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Requested number of cycles reached
    TargetReached,
    /// Next borrow increment fell below the minimum
    BelowMinBorrow,
    /// Next cycle would have crossed the safety LTV
    SafetyLimit,
    /// Iteration cap hit
    IterationCap,
}

/// Builds looped positions at a fixed LTV
#[derive(Debug, Clone, Copy)]
pub struct LoopBuilder {
    ltv: f64,
    min_borrow: f64,
}

impl LoopBuilder {
    pub fn new(ltv: f64, min_borrow: f64) -> CalcResult<Self> {
        let ltv = check::ltv("ltv", ltv)?;
        let min_borrow = if min_borrow.is_finite() && min_borrow > MIN_BORROW_FLOOR {
            min_borrow
        } else {
            MIN_BORROW_FLOOR
        };
        Ok(Self { ltv, min_borrow })
    }

    pub fn ltv(&self) -> f64 {
        self.ltv
    }

    pub fn min_borrow(&self) -> f64 {
        self.min_borrow
    }

    /// Apply up to `target_loops` cycles
    ///
    /// Stops early once the next increment is below the minimum borrow, so
    /// the returned `loops` may be smaller than requested.
    pub fn build(&self, initial_amount: f64, target_loops: u32) -> CalcResult<LoopPosition> {
        let initial_amount = check::positive_amount("initial_amount", initial_amount)?;
        let (position, reason) = self.run(LoopPosition::new(initial_amount), target_loops);
        log::debug!(
            "built {} of {} loops at ltv {:.4} ({:?})",
            position.loops,
            target_loops,
            self.ltv,
            reason
        );
        Ok(position)
    }

    /// Loop until the increment drops below the minimum borrow
    ///
    /// The cycle count this returns is the number of real loops needed to
    /// approach the closed-form leverage at this LTV.
    pub fn converge(&self, initial_amount: f64) -> CalcResult<LoopPosition> {
        let initial_amount = check::positive_amount("initial_amount", initial_amount)?;
        let (position, reason) = self.run(LoopPosition::new(initial_amount), MAX_LOOP_ITERATIONS);
        if reason == StopReason::TargetReached {
            log::warn!(
                "loop convergence at ltv {:.4} hit the {} cycle cap",
                self.ltv,
                MAX_LOOP_ITERATIONS
            );
        }
        Ok(position)
    }

    fn run(&self, mut position: LoopPosition, max_loops: u32) -> (LoopPosition, StopReason) {
        while position.loops < max_loops {
            let available = position.available_borrow(self.ltv);
            if available < self.min_borrow {
                return (position, StopReason::BelowMinBorrow);
            }
            position = position.with_borrow(available);
        }
        (position, StopReason::TargetReached)
    }
}

/// Extends a loop sequence as far as a safety LTV allows
#[derive(Debug, Clone, Copy)]
pub struct MaxSafeLoopSearch {
    builder: LoopBuilder,
    max_safe_ltv: f64,
}

impl MaxSafeLoopSearch {
    pub fn new(ltv: f64, max_safe_ltv: f64, min_borrow: f64) -> CalcResult<Self> {
        Ok(Self {
            builder: LoopBuilder::new(ltv, min_borrow)?,
            max_safe_ltv: check::open_unit("max_safe_ltv", max_safe_ltv)?,
        })
    }

    pub fn max_safe_ltv(&self) -> f64 {
        self.max_safe_ltv
    }

    /// Last position whose effective LTV stays at or below `max_safe_ltv`
    ///
    /// Each candidate cycle is evaluated before it is applied; a cycle that
    /// would cross the limit is discarded, not rolled back.
    pub fn search(&self, initial_amount: f64) -> CalcResult<LoopPosition> {
        let initial_amount = check::positive_amount("initial_amount", initial_amount)?;
        let (position, reason) = self.run(LoopPosition::new(initial_amount));
        log::debug!(
            "max safe search: {} loops, eff ltv {:.4} <= {:.4} ({:?})",
            position.loops,
            position.effective_ltv(),
            self.max_safe_ltv,
            reason
        );
        Ok(position)
    }

    fn run(&self, mut position: LoopPosition) -> (LoopPosition, StopReason) {
        let ltv = self.builder.ltv();
        let min_borrow = self.builder.min_borrow();

        while position.loops < MAX_LOOP_ITERATIONS {
            let available = position.available_borrow(ltv);
            if available < min_borrow {
                return (position, StopReason::BelowMinBorrow);
            }

            let next = position.with_borrow(available);
            if next.effective_ltv() > self.max_safe_ltv {
                return (position, StopReason::SafetyLimit);
            }
            position = next;
        }
        (position, StopReason::IterationCap)
    }
}
