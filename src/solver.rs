//! Conjugate gradient solvers on the normal equations: CGNE and CGNR
//!
//! Both start from `f = 0` and run for at most `MAX_ITERATIONS`. Numerical
//! trouble (a squared norm below `EPS_SMALL`) never fails a solve: the
//! iteration stops and the estimate reached so far is returned.

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayView1, ArrayView2};
use log::debug;

use crate::error::ReconstructionError;
use crate::model::NormalizedModel;
use crate::types::{Intensity, Matrix, Vector, EPS_SMALL, MAX_ITERATIONS, TOLERANCE};

/// The linear system `H f = g` seen by the solvers: `H` and its transpose.
#[derive(Debug, Clone, Copy)]
pub struct System<'a> {
    pub h : ArrayView2<'a, Intensity>,
    pub ht: ArrayView2<'a, Intensity>,
}

impl<'a> System<'a> {
    pub fn new(h: &'a Matrix, ht: &'a Matrix) -> Self {
        Self { h: h.view(), ht: ht.view() }
    }
}

impl<'a> From<&'a NormalizedModel> for System<'a> {
    fn from(model: &'a NormalizedModel) -> Self { Self::new(&model.h, &model.ht) }
}

/// Why a solve ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// The residual norm, or its change in the last iteration, fell below `TOLERANCE`
    Converged,
    /// A squared norm fell below `EPS_SMALL`
    Degenerate,
    /// `MAX_ITERATIONS` were performed
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub f: Vector,
    /// Number of iterations performed, in `1..=MAX_ITERATIONS`
    pub iterations: usize,
    pub stop: Stop,
}

/// State carried from one iteration of a CG variant to the next.
pub trait Iteration: Sized {
    fn start(system: System, g: ArrayView1<Intensity>) -> Self;

    /// Perform one iteration; `Some` if the solve should end here.
    fn step(&mut self, system: System) -> Option<Stop>;

    fn estimate(self) -> Vector;
}

/// Drive `I` until it stops or the iteration cap is reached.
pub fn solve<I: Iteration>(system: System, g: ArrayView1<Intensity>) -> Solution {
    let mut state = I::start(system, g);
    for i in 0..MAX_ITERATIONS {
        if let Some(stop) = state.step(system) {
            return Solution { f: state.estimate(), iterations: i + 1, stop }
        }
    }
    Solution { f: state.estimate(), iterations: MAX_ITERATIONS, stop: Stop::Exhausted }
}

#[inline]
fn norm_sq(v: &Vector) -> Intensity { v.dot(v) }

#[inline]
fn converged(norm_before: Intensity, norm_after: Intensity) -> bool {
    (norm_after - norm_before).abs() < TOLERANCE || norm_after < TOLERANCE
}

// ----- CGNE --------------------------------------------------------------------------

/// Conjugate gradient on the normal equations, error form
#[derive(Debug, Clone)]
pub struct Cgne {
    f: Vector,
    r: Vector,
    p: Vector,
    r_norm_sq: Intensity,
}

impl Iteration for Cgne {

    fn start(system: System, g: ArrayView1<Intensity>) -> Self {
        let f = Vector::zeros(system.h.ncols());
        let r = g.to_owned();
        let p = system.ht.dot(&r);
        let r_norm_sq = norm_sq(&r);
        Self { f, r, p, r_norm_sq }
    }

    fn step(&mut self, system: System) -> Option<Stop> {
        let p_norm_sq = norm_sq(&self.p);
        if p_norm_sq < EPS_SMALL { return Some(Stop::Degenerate) }

        let alpha = self.r_norm_sq / p_norm_sq;
        let f_next = &self.f + &(alpha * &self.p);
        let q = system.h.dot(&self.p);
        let r_next = &self.r - &(alpha * &q);
        let r_next_norm_sq = norm_sq(&r_next);

        if converged(self.r_norm_sq.sqrt(), r_next_norm_sq.sqrt()) {
            self.f = f_next;
            return Some(Stop::Converged)
        }
        if self.r_norm_sq < EPS_SMALL {
            self.f = f_next;
            return Some(Stop::Degenerate)
        }

        let beta = r_next_norm_sq / self.r_norm_sq;
        let p_next = system.ht.dot(&r_next) + beta * &self.p;

        self.f = f_next;
        self.r = r_next;
        self.p = p_next;
        self.r_norm_sq = r_next_norm_sq;
        None
    }

    fn estimate(self) -> Vector { self.f }
}

// ----- CGNR --------------------------------------------------------------------------

/// Conjugate gradient on the normal equations, residual form
#[derive(Debug, Clone)]
pub struct Cgnr {
    f: Vector,
    r: Vector,
    p: Vector,
    r_norm: Intensity,
    z_norm_sq: Intensity,
}

impl Iteration for Cgnr {

    fn start(system: System, g: ArrayView1<Intensity>) -> Self {
        let f = Vector::zeros(system.h.ncols());
        // r = g - H f, with f = 0
        let r = g.to_owned();
        let z = system.ht.dot(&r);
        let p = z.clone();
        let r_norm = norm_sq(&r).sqrt();
        let z_norm_sq = norm_sq(&z);
        Self { f, r, p, r_norm, z_norm_sq }
    }

    fn step(&mut self, system: System) -> Option<Stop> {
        let w = system.h.dot(&self.p);
        let w_norm_sq = norm_sq(&w);
        if w_norm_sq < EPS_SMALL { return Some(Stop::Degenerate) }

        let alpha = self.z_norm_sq / w_norm_sq;
        let f_next = &self.f + &(alpha * &self.p);
        let r_next = &self.r - &(alpha * &w);
        let r_next_norm = norm_sq(&r_next).sqrt();

        if converged(self.r_norm, r_next_norm) {
            self.f = f_next;
            return Some(Stop::Converged)
        }

        let z_next = system.ht.dot(&r_next);
        let z_next_norm_sq = norm_sq(&z_next);
        if self.z_norm_sq < EPS_SMALL {
            self.f = f_next;
            return Some(Stop::Degenerate)
        }

        let beta = z_next_norm_sq / self.z_norm_sq;
        let p_next = &z_next + &(beta * &self.p);

        self.f = f_next;
        self.r = r_next;
        self.p = p_next;
        self.r_norm = r_next_norm;
        self.z_norm_sq = z_next_norm_sq;
        None
    }

    fn estimate(self) -> Vector { self.f }
}

// ----- Algorithm selection -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm { Cgne, Cgnr }

impl Algorithm {

    pub fn solve(self, system: System, g: ArrayView1<Intensity>) -> Solution {
        let solution = match self {
            Algorithm::Cgne => solve::<Cgne>(system, g),
            Algorithm::Cgnr => solve::<Cgnr>(system, g),
        };
        debug!("{self} stopped after {} iterations: {:?}", solution.iterations, solution.stop);
        solution
    }
}

impl FromStr for Algorithm {
    type Err = ReconstructionError;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if      s.eq_ignore_ascii_case("cgne") { Ok(Algorithm::Cgne) }
        else if s.eq_ignore_ascii_case("cgnr") { Ok(Algorithm::Cgnr) }
        else { Err(ReconstructionError::UnknownAlgorithm { name: s.into() }) }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Cgne => write!(f, "CGNE"),
            Algorithm::Cgnr => write!(f, "CGNR"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use proptest::prelude::*;

    fn run(algorithm: Algorithm, h: &Matrix, g: &Vector) -> Solution {
        let ht = h.t().to_owned();
        algorithm.solve(System::new(h, &ht), g.view())
    }

    fn well_conditioned() -> Matrix {
        array![[4.0, 1.0, 0.0, 0.0],
               [1.0, 3.0, 1.0, 0.0],
               [0.0, 1.0, 2.0, 1.0],
               [0.0, 0.0, 1.0, 5.0]]
    }

    #[rstest(algorithm, case(Algorithm::Cgne), case(Algorithm::Cgnr))]
    fn recovers_noiseless_image(algorithm: Algorithm) {
        let h = well_conditioned();
        let f_true = array![1.0, 2.0, 3.0, 4.0];
        let g = h.dot(&f_true);
        let Solution { f, iterations, stop } = run(algorithm, &h, &g);
        assert_eq!(stop, Stop::Converged);
        assert!(iterations <= 4, "took {iterations} iterations");
        for (got, want) in f.iter().zip(f_true.iter()) {
            assert_float_eq!(*got, *want, abs <= 1e-6);
        }
    }

    #[rstest(algorithm, case(Algorithm::Cgne), case(Algorithm::Cgnr))]
    fn scaled_identity_in_one_step(algorithm: Algorithm) {
        let h = array![[2.0, 0.0], [0.0, 2.0]];
        let Solution { f, iterations, stop } = run(algorithm, &h, &array![4.0, 4.0]);
        assert_eq!(iterations, 1);
        assert_eq!(stop, Stop::Converged);
        assert_float_eq!(f[0], 2.0, abs <= 1e-12);
        assert_float_eq!(f[1], 2.0, abs <= 1e-12);
    }

    #[rstest(algorithm, case(Algorithm::Cgne), case(Algorithm::Cgnr))]
    fn zero_signal_stops_immediately(algorithm: Algorithm) {
        let h = well_conditioned();
        let Solution { f, iterations, stop } = run(algorithm, &h, &Vector::zeros(4));
        assert_eq!(iterations, 1);
        assert_eq!(stop, Stop::Degenerate);
        assert_eq!(f, Vector::zeros(4));
    }

    #[rstest(algorithm, case(Algorithm::Cgne), case(Algorithm::Cgnr))]
    fn zero_matrix_stops_immediately(algorithm: Algorithm) {
        let h = Matrix::zeros((3, 2));
        let Solution { f, iterations, stop } = run(algorithm, &h, &array![1.0, 2.0, 3.0]);
        assert_eq!((iterations, stop), (1, Stop::Degenerate));
        assert_eq!(f, Vector::zeros(2));
    }

    // Twelve well separated singular values: CG needs more than the cap
    #[rstest(algorithm, case(Algorithm::Cgne), case(Algorithm::Cgnr))]
    fn ill_conditioned_exhausts_cap(algorithm: Algorithm) {
        let n = 12;
        let h = Array2::from_diag(&Array1::from_shape_fn(n, |i| 10_f64.powf(3.0 * i as f64 / (n - 1) as f64)));
        let Solution { f, iterations, stop } = run(algorithm, &h, &Vector::from_elem(n, 100.0));
        assert_eq!((iterations, stop), (MAX_ITERATIONS, Stop::Exhausted));
        assert!(f.iter().all(|x| x.is_finite()));
    }

    #[rstest(/**/ name  , expected,
             case("CGNE", Algorithm::Cgne),
             case("cgne", Algorithm::Cgne),
             case("CgNr", Algorithm::Cgnr),
             case("cgnr", Algorithm::Cgnr),
    )]
    fn parse_algorithm(name: &str, expected: Algorithm) {
        assert_eq!(name.parse::<Algorithm>(), Ok(expected));
    }

    #[rstest(name, case(""), case("cg"), case("mlem"), case(" cgne"), case("cgnr2"))]
    fn reject_unknown_algorithm(name: &str) {
        assert_eq!(name.parse::<Algorithm>(),
                   Err(ReconstructionError::UnknownAlgorithm { name: name.into() }));
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for a in [Algorithm::Cgne, Algorithm::Cgnr] {
            assert_eq!(a.to_string().parse::<Algorithm>(), Ok(a));
        }
    }

    fn system_and_signal() -> impl Strategy<Value = (Matrix, Vector)> {
        (1..10_usize, 1..10_usize)
            .prop_flat_map(|(r, c)| (
                prop::collection::vec(-10.0..10.0_f64, r * c),
                prop::collection::vec(-10.0..10.0_f64, r),
                Just((r, c)),
            ))
            .prop_map(|(h, g, (r, c))| (Array2::from_shape_vec((r, c), h).unwrap(), Array1::from(g)))
    }

    proptest! {
        #[test]
        fn iterations_within_bounds((h, g) in system_and_signal()) {
            for algorithm in [Algorithm::Cgne, Algorithm::Cgnr] {
                let Solution { f, iterations, .. } = run(algorithm, &h, &g);
                prop_assert!((1..=MAX_ITERATIONS).contains(&iterations));
                prop_assert_eq!(f.len(), h.ncols());
            }
        }
    }
}
