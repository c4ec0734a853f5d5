//! Minimum-cost perfect matching behind a narrow interface.
//!
//! [`linear_assignment`] is the only entry point the allocator uses:
//!
//! ```text
//! linear_assignment(solver, agents[N], tasks[N], cost) -> total cost
//! ```
//!
//! It builds the dense `N×N` [`CostMatrix`] (`O(N²)` memory), asks an
//! [`AssignmentSolver`] for the optimal permutation, checks it is a
//! bijection, and reorders `tasks` in place so `agents[i]` pairs with
//! `tasks[i]`.
//!
//! The bundled [`HungarianSolver`] is the `O(N³)` shortest augmenting path
//! form of the Hungarian method. It returns the exact global optimum, not a
//! greedy approximation. `O(N³)` time is the scaling limit of a ballot run.

use roomballot_types::{BallotError, Result};

/// Dense row-major square cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Evaluate `cost(agents[i], tasks[j])` for every pair.
    ///
    /// # Errors
    /// - `DimensionMismatch` if the sides differ in length
    /// - `NonFiniteCost` if any cost is NaN or infinite
    pub fn build<A, T, F>(agents: &[A], tasks: &[T], cost: F) -> Result<Self>
    where
        F: Fn(&A, &T) -> f64,
    {
        if agents.len() != tasks.len() {
            return Err(BallotError::DimensionMismatch {
                agents: agents.len(),
                tasks: tasks.len(),
            });
        }
        let dim = agents.len();
        let mut data = Vec::with_capacity(dim * dim);
        for (row, agent) in agents.iter().enumerate() {
            for (col, task) in tasks.iter().enumerate() {
                let c = cost(agent, task);
                if !c.is_finite() {
                    return Err(BallotError::NonFiniteCost { row, col });
                }
                data.push(c);
            }
        }
        Ok(Self { dim, data })
    }

    /// Build directly from rows. Used by tests and external callers.
    ///
    /// # Errors
    /// Same as [`CostMatrix::build`]; a ragged row is a `DimensionMismatch`.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let dim = rows.len();
        let mut data = Vec::with_capacity(dim * dim);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != dim {
                return Err(BallotError::DimensionMismatch {
                    agents: dim,
                    tasks: values.len(),
                });
            }
            for (col, &c) in values.iter().enumerate() {
                if !c.is_finite() {
                    return Err(BallotError::NonFiniteCost { row, col });
                }
                data.push(c);
            }
        }
        Ok(Self { dim, data })
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.dim + col]
    }

    /// Total cost of assigning row `i` to column `permutation[i]`.
    #[must_use]
    pub fn total(&self, permutation: &[usize]) -> f64 {
        permutation
            .iter()
            .enumerate()
            .map(|(row, &col)| self.get(row, col))
            .sum()
    }
}

/// Any exact minimum-cost perfect matching routine.
pub trait AssignmentSolver {
    /// Return `p` with row `i` assigned to column `p[i]`, minimising
    /// `Σ matrix[i][p[i]]`.
    fn solve(&self, matrix: &CostMatrix) -> Vec<usize>;
}

/// Hungarian method with potentials, `O(N³)` time, `O(N)` extra memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct HungarianSolver;

impl AssignmentSolver for HungarianSolver {
    fn solve(&self, matrix: &CostMatrix) -> Vec<usize> {
        let n = matrix.dim();
        if n == 0 {
            return Vec::new();
        }

        // 1-based with column 0 as the virtual root.
        let mut u = vec![0.0f64; n + 1];
        let mut v = vec![0.0f64; n + 1];
        let mut p = vec![0usize; n + 1];
        let mut way = vec![0usize; n + 1];

        for i in 1..=n {
            p[0] = i;
            let mut j0 = 0usize;
            let mut minv = vec![f64::INFINITY; n + 1];
            let mut used = vec![false; n + 1];

            loop {
                used[j0] = true;
                let i0 = p[j0];
                let mut delta = f64::INFINITY;
                let mut j1 = 0usize;

                for j in 1..=n {
                    if used[j] {
                        continue;
                    }
                    let cur = matrix.get(i0 - 1, j - 1) - u[i0] - v[j];
                    if cur < minv[j] {
                        minv[j] = cur;
                        way[j] = j0;
                    }
                    if minv[j] < delta {
                        delta = minv[j];
                        j1 = j;
                    }
                }

                for j in 0..=n {
                    if used[j] {
                        u[p[j]] += delta;
                        v[j] -= delta;
                    } else {
                        minv[j] -= delta;
                    }
                }

                j0 = j1;
                if p[j0] == 0 {
                    break;
                }
            }

            loop {
                let j1 = way[j0];
                p[j0] = p[j1];
                j0 = j1;
                if j0 == 0 {
                    break;
                }
            }
        }

        let mut assignment = vec![0usize; n];
        for j in 1..=n {
            if p[j] > 0 {
                assignment[p[j] - 1] = j - 1;
            }
        }
        assignment
    }
}

/// Check that `permutation` maps `0..dim` one-to-one onto `0..dim`.
///
/// # Errors
/// Returns `NotABijection` describing the first defect.
pub fn verify_permutation(permutation: &[usize], dim: usize) -> Result<()> {
    if permutation.len() != dim {
        return Err(BallotError::NotABijection {
            reason: format!("{} assignments for {dim} agents", permutation.len()),
        });
    }
    let mut seen = vec![false; dim];
    for (row, &col) in permutation.iter().enumerate() {
        if col >= dim {
            return Err(BallotError::NotABijection {
                reason: format!("agent {row} assigned out-of-range task {col}"),
            });
        }
        if seen[col] {
            return Err(BallotError::NotABijection {
                reason: format!("task {col} assigned twice"),
            });
        }
        seen[col] = true;
    }
    Ok(())
}

/// Solve the assignment and reorder `tasks` so `agents[i]` pairs with `tasks[i]`.
///
/// Returns the exact total cost of the final pairing.
///
/// # Errors
/// - `DimensionMismatch` if `agents.len() != tasks.len()` (caller bug)
/// - `NonFiniteCost` if the cost function misbehaves
/// - `NotABijection` if the solver returns something other than a permutation
pub fn linear_assignment<A, T, S, F>(
    solver: &S,
    agents: &[A],
    tasks: &mut Vec<T>,
    cost: F,
) -> Result<f64>
where
    S: AssignmentSolver + ?Sized,
    F: Fn(&A, &T) -> f64,
{
    let matrix = CostMatrix::build(agents, tasks, cost)?;
    let permutation = solver.solve(&matrix);
    verify_permutation(&permutation, matrix.dim())?;
    let total = matrix.total(&permutation);

    let mut slots: Vec<Option<T>> = tasks.drain(..).map(Some).collect();
    for &col in &permutation {
        let task = slots[col].take().ok_or_else(|| BallotError::NotABijection {
            reason: format!("task {col} consumed twice"),
        })?;
        tasks.push(task);
    }

    Ok(total)
}
