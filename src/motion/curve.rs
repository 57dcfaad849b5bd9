//! Quintic Bézier velocity ramps in fixed point.
//!
//! A ramp from `V0` to `V1` over `T` timer ticks follows
//!
//! ```text
//! V(τ) = F + τ³·(C + τ·(B + τ·A)),   τ = t / T ∈ [0, 1)
//! A = 6·(V1−V0)   B = 15·(V0−V1)   C = 10·(V1−V0)   F = V0
//! ```
//!
//! which has zero acceleration and zero jerk at both ends. Coefficients are
//! stored with 7 fraction bits, τ is Q32 (`AV · t` with `AV = 2^32 / T`).
//! With rates below 2^20 every coefficient fits an `i32` and every partial
//! sum fits an `i64`.
//!
//! Two evaluators are provided. [`PortableCurve`] sums the powers of τ in
//! 64-bit arithmetic. [`WideningCurve`] uses Horner's scheme built only from
//! 32×32→64 multiplies, which map onto single `SMULL`/`UMULL` instructions
//! on 32-bit ARM. They agree within one unit.

use super::block::{period_inverse, MAX_STEP_RATE};

/// Fraction bits of the stored coefficients.
const COEFF_SHIFT: u32 = 7;

/// Which half of a block's S-curve the coefficients describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveHalf {
    /// Acceleration ramp, entry rate to cruise rate.
    #[default]
    Rising,
    /// Deceleration ramp, cruise rate to exit rate.
    Falling,
}

/// Fixed-point coefficients of one ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BezierCoeffs {
    /// `6·(V1−V0)`, scaled by 128.
    pub a: i32,
    /// `15·(V0−V1)`, scaled by 128.
    pub b: i32,
    /// `10·(V1−V0)`, scaled by 128.
    pub c: i32,
    /// `V0`, scaled by 128.
    pub f: i32,
    /// `2^32 / T`.
    pub av: u32,
    /// Ramp end rate, returned once `τ` reaches 1.
    pub end: u32,
    /// Half of the block this ramp belongs to.
    pub half: CurveHalf,
}

impl BezierCoeffs {
    /// Build coefficients for a ramp from `v0` to `v1` with `av = 2^32 / T`.
    ///
    /// Rates above [`MAX_STEP_RATE`] are clamped to it, which keeps every
    /// scaled coefficient in `i32`.
    pub fn new(v0: u32, v1: u32, av: u32, half: CurveHalf) -> Self {
        let (v0, v1) = (v0.min(MAX_STEP_RATE), v1.min(MAX_STEP_RATE));
        let delta = v1 as i32 - v0 as i32;
        Self {
            a: (6 * delta) << COEFF_SHIFT,
            b: (-15 * delta) << COEFF_SHIFT,
            c: (10 * delta) << COEFF_SHIFT,
            f: (v0 as i32) << COEFF_SHIFT,
            av,
            end: v1,
            half,
        }
    }

    /// Build coefficients for a ramp lasting `ticks` timer ticks.
    pub fn over_ticks(v0: u32, v1: u32, ticks: u32, half: CurveHalf) -> Self {
        Self::new(v0, v1, period_inverse(ticks), half)
    }

    /// Ramp start rate.
    #[inline]
    pub fn start(&self) -> u32 {
        (self.f >> COEFF_SHIFT) as u32
    }
}

/// Evaluates a ramp at a point.
///
/// Implementations must return exactly `V0` at `τ = 0` and must agree with
/// [`PortableCurve`] within one unit everywhere.
pub trait CurveEvaluator {
    /// Rate at `tau` (Q32, `0 ≤ τ < 1`).
    fn evaluate(coeffs: &BezierCoeffs, tau: u32) -> u32;

    /// Rate after `ticks` timer ticks of the ramp.
    ///
    /// Returns the ramp end rate once the ramp duration has elapsed.
    #[inline]
    fn rate_at(coeffs: &BezierCoeffs, ticks: u32) -> u32 {
        let tau = coeffs.av as u64 * ticks as u64;
        if tau >> 32 != 0 {
            coeffs.end
        } else {
            Self::evaluate(coeffs, tau as u32)
        }
    }
}

/// Power-sum evaluation in 64-bit arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableCurve;

impl CurveEvaluator for PortableCurve {
    fn evaluate(coeffs: &BezierCoeffs, tau: u32) -> u32 {
        let t = tau as u64;
        let t2 = (t * t) >> 32;
        let t3 = (t2 * t) >> 32;
        let t4 = (t3 * t) >> 32;
        let t5 = (t4 * t) >> 32;

        // Q31 powers keep every product inside i64
        let mut acc = (coeffs.f as i64) << 31;
        acc += coeffs.c as i64 * (t3 >> 1) as i64;
        acc += coeffs.b as i64 * (t4 >> 1) as i64;
        acc += coeffs.a as i64 * (t5 >> 1) as i64;

        (acc >> (31 + COEFF_SHIFT)).max(0) as u32
    }
}

/// Horner evaluation using 32×32→64 widening multiplies only.
#[derive(Debug, Clone, Copy, Default)]
pub struct WideningCurve;

#[inline(always)]
fn mul_hi(x: u32, y: u32) -> u32 {
    ((x as u64 * y as u64) >> 32) as u32
}

#[inline(always)]
fn mul_q31(h: i32, t: u32) -> i32 {
    ((h as i64 * t as i64) >> 31) as i32
}

impl CurveEvaluator for WideningCurve {
    fn evaluate(coeffs: &BezierCoeffs, tau: u32) -> u32 {
        let th = tau >> 1;

        let mut h = coeffs.a;
        h = coeffs.b.wrapping_add(mul_q31(h, th));
        h = coeffs.c.wrapping_add(mul_q31(h, th));

        let t3 = mul_hi(mul_hi(tau, tau), tau) >> 1;
        let acc = ((coeffs.f as i64) << 31) + h as i64 * t3 as i64;

        (acc >> (31 + COEFF_SHIFT)).max(0) as u32
    }
}

/// Evaluator selected for the build target.
#[cfg(target_arch = "arm")]
pub type DefaultCurve = WideningCurve;

/// Evaluator selected for the build target.
#[cfg(not(target_arch = "arm"))]
pub type DefaultCurve = PortableCurve;
