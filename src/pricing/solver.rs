//! Bounded scalar minimization.
//!
//! Derivative-free search for the minimum of `f(x)` on `[lower, upper]`:
//! a coarse grid scan locates the best cell (robust to the kink where
//! demand saturates inventory and to flat stretches where demand is
//! clamped to zero), then golden-section search refines inside the
//! neighbouring cells.
//!
//! Ties resolve toward the smaller `x`, so a flat objective yields the
//! lower bound.

use serde::{Deserialize, Serialize};

/// Golden-ratio conjugate, (sqrt(5) - 1) / 2.
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// Solver tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Points in the initial grid scan, endpoints included.
    pub grid_points: usize,
    /// Stop refining once the bracket is narrower than this.
    pub tolerance: f64,
    /// Hard cap on objective evaluations per minimization.
    pub max_evaluations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            grid_points: 51,
            tolerance: 1e-6,
            max_evaluations: 500,
        }
    }
}

/// Location and value of the minimum found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub x: f64,
    pub value: f64,
    pub evaluations: usize,
}

/// The evaluation cap was hit before the bracket reached tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("evaluation budget of {budget} exhausted before convergence")]
pub struct BudgetExhausted {
    pub budget: usize,
}

/// Counts evaluations and enforces the budget.
struct Objective<F> {
    f: F,
    evaluations: usize,
    budget: usize,
}

impl<F: Fn(f64) -> f64> Objective<F> {
    fn eval(&mut self, x: f64) -> Result<f64, BudgetExhausted> {
        if self.evaluations >= self.budget {
            return Err(BudgetExhausted {
                budget: self.budget,
            });
        }
        self.evaluations += 1;
        Ok((self.f)(x))
    }
}

/// Keeps the best point seen, preferring lower `x` on equal values.
#[derive(Debug, Clone, Copy)]
struct Best {
    x: f64,
    value: f64,
}

impl Best {
    fn offer(&mut self, x: f64, value: f64) {
        if value < self.value || (value == self.value && x < self.x) {
            self.x = x;
            self.value = value;
        }
    }
}

/// Minimize `f` over `[lower, upper]`.
///
/// `seed` is a starting hint: it is clamped into the interval and evaluated
/// once, and wins only if it beats every grid point. A poor seed never
/// causes failure.
pub fn minimize_bounded<F>(
    f: F,
    lower: f64,
    upper: f64,
    seed: f64,
    config: &SolverConfig,
) -> Result<Minimum, BudgetExhausted>
where
    F: Fn(f64) -> f64,
{
    let mut objective = Objective {
        f,
        evaluations: 0,
        budget: config.max_evaluations,
    };

    if upper <= lower {
        let value = objective.eval(lower)?;
        return Ok(Minimum {
            x: lower,
            value,
            evaluations: objective.evaluations,
        });
    }

    // Grid scan
    let cells = config.grid_points.max(2) - 1;
    let step = (upper - lower) / cells as f64;
    let mut best_index = 0;
    let mut best = Best {
        x: lower,
        value: objective.eval(lower)?,
    };
    for i in 1..=cells {
        let x = if i == cells { upper } else { lower + step * i as f64 };
        let value = objective.eval(x)?;
        if value < best.value {
            best_index = i;
            best = Best { x, value };
        }
    }

    let mut a = lower + step * best_index.saturating_sub(1) as f64;
    let mut b = (lower + step * (best_index + 1) as f64).min(upper);

    let seed = if seed.is_finite() {
        seed.clamp(lower, upper)
    } else {
        lower
    };
    let seed_value = objective.eval(seed)?;
    if seed_value < best.value {
        best = Best {
            x: seed,
            value: seed_value,
        };
        a = (seed - step).max(lower);
        b = (seed + step).min(upper);
    }

    // Golden-section refinement inside the bracket
    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = objective.eval(c)?;
    let mut fd = objective.eval(d)?;

    // Never demand a bracket narrower than the float spacing around it.
    while b - a > config.tolerance.max(4.0 * f64::EPSILON * (a.abs() + b.abs())) {
        if c >= d {
            break;
        }
        if fc <= fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = objective.eval(c)?;
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = objective.eval(d)?;
        }
    }

    best.offer(c, fc);
    best.offer(d, fd);

    Ok(Minimum {
        x: best.x.clamp(lower, upper),
        value: best.value,
        evaluations: objective.evaluations,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
