pub mod cost;
pub mod energy;
pub mod rate;

use std::ops::{Div, Mul};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Physical quantity with the given powers of energy and currency,
/// e.g. `Quantity<1, 0>` is an energy and `Quantity<-1, 1>` is a price
/// per unit of energy.
#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
)]
#[from(i32, f64, OrderedFloat<f64>)]
#[must_use]
pub struct Quantity<const ENERGY: isize, const COST: isize>(pub OrderedFloat<f64>);

impl<const ENERGY: isize, const COST: isize> Quantity<ENERGY, COST> {
    pub const ZERO: Self = Self(OrderedFloat(0.0));

    /// Round to three decimals for presentation.
    ///
    /// Intermediate arithmetic is never rounded, only final report values.
    pub fn rounded(self) -> Self {
        Self(OrderedFloat((self.0.0 * 1000.0).round() / 1000.0))
    }
}

impl<const ENERGY: isize, const COST: isize> Mul<f64> for Quantity<ENERGY, COST> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl<const ENERGY: isize, const COST: isize> Div<f64> for Quantity<ENERGY, COST> {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl<const ENERGY: isize, const COST: isize> Div<Self> for Quantity<ENERGY, COST> {
    type Output = OrderedFloat<f64>;

    fn div(self, rhs: Self) -> Self::Output {
        self.0 / rhs.0
    }
}
