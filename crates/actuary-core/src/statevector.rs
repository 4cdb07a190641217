//! Statevector simulation over a normalised complex vector.
//!
//! Nothing here touches real quantum hardware. A register of `n` "qubits" is
//! a unit-norm complex vector of length 2^n; gates are linear transforms on
//! that vector and every transform renormalises so the unit-norm invariant
//! holds within floating-point tolerance.

use std::f64::consts::LN_2;

use rustfft::num_complex::Complex;
use serde::Serialize;

use crate::config::{MAX_QUBITS, RotationGate};
use crate::error::{ActuaryError, Result, ensure_finite};

/// Allowed drift of the L2 norm from 1.0.
pub const NORM_TOLERANCE: f64 = 1e-6;

/// Unit-norm complex amplitude vector of length 2^n_qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantumState {
    n_qubits: usize,
    amplitudes: Vec<Complex<f64>>,
}

/// A measured basis state and its probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasisProbability {
    /// Basis index as a bit string, most significant qubit first.
    pub state: String,
    pub probability: f64,
}

impl QuantumState {
    /// Encode real features: pad or truncate to 2^n_qubits, then normalise.
    /// An all-zero input becomes the |0...0> basis state.
    ///
    /// Features are divided by their largest magnitude first, so the sum of
    /// squares neither overflows nor underflows for any finite input.
    pub fn encode(features: &[f64], n_qubits: usize) -> Result<Self> {
        if n_qubits == 0 || n_qubits > MAX_QUBITS {
            return Err(ActuaryError::Configuration(format!(
                "n_qubits must be in 1..={MAX_QUBITS}, got {n_qubits}"
            )));
        }
        ensure_finite(features, "features")?;

        let dim = 1usize << n_qubits;
        let kept = &features[..features.len().min(dim)];
        let max_abs = kept.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        let scale = if max_abs > 0.0 { max_abs } else { 1.0 };
        let mut amplitudes: Vec<Complex<f64>> = kept
            .iter()
            .map(|&x| Complex::new(x / scale, 0.0))
            .collect();
        amplitudes.resize(dim, Complex::new(0.0, 0.0));

        let mut state = Self {
            n_qubits,
            amplitudes,
        };
        if state.norm() == 0.0 {
            log::warn!("zero feature vector encoded as |0> basis state");
            state.amplitudes[0] = Complex::new(1.0, 0.0);
        }
        state.renormalize();
        Ok(state)
    }

    pub fn n_qubits(&self) -> usize {
        self.n_qubits
    }

    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn amplitudes(&self) -> &[Complex<f64>] {
        &self.amplitudes
    }

    /// L2 norm of the amplitude vector.
    pub fn norm(&self) -> f64 {
        self.amplitudes
            .iter()
            .map(|a| a.norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    fn renormalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 && (norm - 1.0).abs() > f64::EPSILON {
            for a in &mut self.amplitudes {
                *a /= norm;
            }
        }
    }

    /// Apply a single-qubit rotation by `theta` to `qubit`.
    pub fn rotate(&mut self, gate: RotationGate, qubit: usize, theta: f64) {
        debug_assert!(qubit < self.n_qubits);
        let mask = 1usize << qubit;
        match gate {
            RotationGate::Phase => {
                let phase = Complex::from_polar(1.0, theta);
                for (i, a) in self.amplitudes.iter_mut().enumerate() {
                    if i & mask != 0 {
                        *a *= phase;
                    }
                }
            }
            RotationGate::Ry => {
                let (s, c) = (theta / 2.0).sin_cos();
                for i in 0..self.amplitudes.len() {
                    if i & mask == 0 {
                        let j = i | mask;
                        let (a0, a1) = (self.amplitudes[i], self.amplitudes[j]);
                        self.amplitudes[i] = a0 * c - a1 * s;
                        self.amplitudes[j] = a0 * s + a1 * c;
                    }
                }
            }
        }
        self.renormalize();
    }

    /// Fixed entangling pattern: for each adjacent pair (q, q+1), swap the
    /// amplitudes that differ only in bit q+1 wherever bit q is set.
    pub fn entangle(&mut self) {
        for q in 0..self.n_qubits.saturating_sub(1) {
            let control = 1usize << q;
            let target = 1usize << (q + 1);
            for i in 0..self.amplitudes.len() {
                if i & control != 0 && i & target == 0 {
                    self.amplitudes.swap(i, i | target);
                }
            }
        }
        self.renormalize();
    }

    /// |amplitude|^2 per basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Basis states with probability above `floor`, most likely first.
    pub fn significant_states(&self, floor: f64) -> Vec<BasisProbability> {
        let mut states: Vec<BasisProbability> = self
            .probabilities()
            .into_iter()
            .enumerate()
            .filter(|(_, p)| *p > floor)
            .map(|(i, p)| BasisProbability {
                state: format!("{i:0width$b}", width = self.n_qubits),
                probability: p,
            })
            .collect();
        states.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        states
    }

    /// Expected basis index scaled to [0, 1].
    pub fn expectation(&self) -> f64 {
        let max_index = (self.dim() - 1) as f64;
        let expected: f64 = self
            .probabilities()
            .iter()
            .enumerate()
            .map(|(i, p)| i as f64 * p)
            .sum();
        (expected / max_index).clamp(0.0, 1.0)
    }

    /// 1 - H(p) / log2(dim), where H is the Shannon entropy in bits.
    pub fn coherence(&self) -> f64 {
        let entropy_bits: f64 = -self
            .probabilities()
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|p| p * p.ln() / LN_2)
            .sum::<f64>();
        (1.0 - entropy_bits / self.n_qubits as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unit(state: &QuantumState) {
        assert!(
            (state.norm() - 1.0).abs() < NORM_TOLERANCE,
            "norm drifted: {}",
            state.norm()
        );
    }

    #[test]
    fn encode_pads_and_normalizes() {
        let s = QuantumState::encode(&[3.0, 4.0], 3).unwrap();
        assert_eq!(s.dim(), 8);
        assert_unit(&s);
        assert!((s.amplitudes()[0].re - 0.6).abs() < 1e-12);
        assert!((s.amplitudes()[1].re - 0.8).abs() < 1e-12);
    }

    #[test]
    fn encode_truncates_long_input() {
        let features: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let s = QuantumState::encode(&features, 2).unwrap();
        assert_eq!(s.dim(), 4);
        assert_unit(&s);
    }

    #[test]
    fn zero_vector_becomes_ground_state() {
        let s = QuantumState::encode(&[0.0; 16], 4).unwrap();
        assert_unit(&s);
        assert_eq!(s.probabilities()[0], 1.0);
        assert_eq!(s.expectation(), 0.0);
        assert_eq!(s.coherence(), 1.0);
    }

    #[test]
    fn empty_features_become_ground_state() {
        let s = QuantumState::encode(&[], 2).unwrap();
        assert_unit(&s);
    }

    #[test]
    fn extreme_magnitudes_stay_unit_norm() {
        let large = QuantumState::encode(&[1e200, 1e200], 2).unwrap();
        assert_unit(&large);
        assert!((large.probabilities()[0] - 0.5).abs() < 1e-12);

        let tiny = QuantumState::encode(&[1e-200, 1e-200], 2).unwrap();
        assert_unit(&tiny);
        assert!((tiny.probabilities()[1] - 0.5).abs() < 1e-12);

        let mut features = vec![0.0; 4];
        features[3] = 1e200;
        let top = QuantumState::encode(&features, 2).unwrap();
        assert!((top.expectation() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_features_rejected() {
        let err = QuantumState::encode(&[1.0, f64::INFINITY], 2).unwrap_err();
        assert!(matches!(err, ActuaryError::NumericDomain(_)));
    }

    #[test]
    fn zero_qubits_rejected() {
        assert!(matches!(
            QuantumState::encode(&[1.0], 0),
            Err(ActuaryError::Configuration(_))
        ));
    }

    #[test]
    fn gates_preserve_norm() {
        let mut s = QuantumState::encode(&[0.3, -1.2, 2.5, 0.1, 7.0, -0.4], 3).unwrap();
        for layer in 0..20 {
            for q in 0..3 {
                let gate = if layer % 2 == 0 {
                    RotationGate::Phase
                } else {
                    RotationGate::Ry
                };
                s.rotate(gate, q, 0.37 * (layer + q) as f64);
            }
            s.entangle();
            assert_unit(&s);
        }
    }

    #[test]
    fn phase_rotation_leaves_probabilities_unchanged() {
        let mut s = QuantumState::encode(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        let before = s.probabilities();
        s.rotate(RotationGate::Phase, 1, 1.1);
        for (a, b) in before.iter().zip(s.probabilities()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn ry_pi_flips_qubit() {
        let mut s = QuantumState::encode(&[1.0], 1).unwrap();
        s.rotate(RotationGate::Ry, 0, std::f64::consts::PI);
        let p = s.probabilities();
        assert!(p[0] < 1e-12);
        assert!((p[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn entangle_swaps_controlled_pairs() {
        // Basis |01> (index 1): control bit 0 set, target bit 1 clear -> |11>.
        let mut features = vec![0.0; 4];
        features[1] = 1.0;
        let mut s = QuantumState::encode(&features, 2).unwrap();
        s.entangle();
        assert!((s.probabilities()[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn expectation_of_top_state_is_one() {
        let mut features = vec![0.0; 8];
        features[7] = 2.0;
        let s = QuantumState::encode(&features, 3).unwrap();
        assert!((s.expectation() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_state_has_zero_coherence() {
        let s = QuantumState::encode(&[1.0; 8], 3).unwrap();
        assert!(s.coherence().abs() < 1e-9);
        assert!((s.expectation() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn significant_states_filter_and_format() {
        let s = QuantumState::encode(&[0.0, 1.0, 0.0, 1.0], 2).unwrap();
        let states = s.significant_states(1e-6);
        assert_eq!(states.len(), 2);
        assert!(states.iter().any(|b| b.state == "01"));
        assert!(states.iter().any(|b| b.state == "11"));
    }
}
