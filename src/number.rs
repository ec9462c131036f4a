use std::fmt::Debug;

use num_traits::Float;

/// How `ROUND` treats values exactly halfway between two integers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// `0.5 -> 0`, `1.5 -> 2`, `2.5 -> 2` (banker's rounding).
    #[default]
    HalfToEven,
    /// `0.5 -> 1`, `1.5 -> 2`, `2.5 -> 3`.
    HalfAwayFromZero,
}

/// The primitive operations a value type must supply to be used in
/// expressions.
///
/// Comparisons and truthiness return `bool`; the evaluator converts them back
/// into values with [`Number::from_bool`].
pub trait Number: Copy + Debug + Send + Sync + 'static {
    /// Parses a culture-invariant decimal literal such as `12.34`.
    fn parse(literal: &str) -> Option<Self>;

    fn true_value() -> Self;
    fn false_value() -> Self;

    fn from_bool(value: bool) -> Self {
        if value {
            Self::true_value()
        } else {
            Self::false_value()
        }
    }

    fn is_true(self) -> bool;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    fn div(self, rhs: Self) -> Self;
    fn rem(self, rhs: Self) -> Self;
    fn pow(self, rhs: Self) -> Self;
    fn neg(self) -> Self;

    /// Equality, possibly with a tolerance.
    fn approx_eq(self, rhs: Self) -> bool;
    fn less_than(self, rhs: Self) -> bool;
    fn less_or_equal(self, rhs: Self) -> bool;
    fn greater_than(self, rhs: Self) -> bool;
    fn greater_or_equal(self, rhs: Self) -> bool;

    fn round(self, mode: RoundingMode) -> Self;
    fn floor(self) -> Self;
    fn ceiling(self) -> Self;
    fn log10(self) -> Self;
    /// Logarithm of `self` in an arbitrary `base`.
    fn log(self, base: Self) -> Self;
}

pub trait FloatExt: Float + std::str::FromStr + Debug + Send + Sync + 'static {}
impl FloatExt for f32 {}
impl FloatExt for f64 {}

/// Relative tolerance used by [`Number::approx_eq`] for floats.
const RELATIVE_TOLERANCE: f64 = 1e-6;

/// Floats compare equal when bitwise equal, or when
/// `|a - b| < max(1e-6 * max(|a|, |b|), 8 * smallest subnormal)`.
/// Truthiness is "not approximately zero".
impl<F: FloatExt> Number for F {
    fn parse(literal: &str) -> Option<Self> {
        literal.parse().ok()
    }

    fn true_value() -> Self {
        F::one()
    }

    fn false_value() -> Self {
        F::zero()
    }

    fn is_true(self) -> bool {
        !self.approx_eq(F::zero())
    }

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    fn mul(self, rhs: Self) -> Self {
        self * rhs
    }

    fn div(self, rhs: Self) -> Self {
        self / rhs
    }

    fn rem(self, rhs: Self) -> Self {
        self % rhs
    }

    fn pow(self, rhs: Self) -> Self {
        Float::powf(self, rhs)
    }

    fn neg(self) -> Self {
        -self
    }

    fn approx_eq(self, rhs: Self) -> bool {
        if self == rhs {
            return true;
        }
        let relative = F::from(RELATIVE_TOLERANCE).unwrap_or_else(F::epsilon);
        let eight = F::from(8.0).unwrap_or_else(F::one);
        // Smallest subnormal: 2^-149 for f32, 2^-1074 for f64.
        let smallest = F::min_positive_value() * F::epsilon();
        let scale = Float::max(Float::abs(self), Float::abs(rhs));
        let tolerance = Float::max(relative * scale, smallest * eight);
        Float::abs(rhs - self) < tolerance
    }

    fn less_than(self, rhs: Self) -> bool {
        self < rhs
    }

    fn less_or_equal(self, rhs: Self) -> bool {
        self <= rhs
    }

    fn greater_than(self, rhs: Self) -> bool {
        self > rhs
    }

    fn greater_or_equal(self, rhs: Self) -> bool {
        self >= rhs
    }

    fn round(self, mode: RoundingMode) -> Self {
        let rounded = Float::round(self);
        match mode {
            RoundingMode::HalfAwayFromZero => rounded,
            RoundingMode::HalfToEven => {
                let two = F::one() + F::one();
                let half = F::one() / two;
                if Float::abs(self - Float::trunc(self)) == half {
                    two * Float::round(self / two)
                } else {
                    rounded
                }
            }
        }
    }

    fn floor(self) -> Self {
        Float::floor(self)
    }

    fn ceiling(self) -> Self {
        Float::ceil(self)
    }

    fn log10(self) -> Self {
        Float::log10(self)
    }

    fn log(self, base: Self) -> Self {
        Float::log(self, base)
    }
}
