//! Rupee amounts using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12, 2)` rupees. Razorpay wants integer
//! paise, so [`Money::to_paise`] is the only way an amount leaves the
//! system toward the gateway.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors converting an amount to paise.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Negative amounts cannot be charged.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("amount has sub-paise precision")]
    SubPaise,
    /// The amount does not fit in an `i64` of paise.
    #[error("amount is too large")]
    Overflow,
}

/// An amount of Indian rupees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// ISO 4217 code sent to the payment gateway.
    pub const CURRENCY: &'static str = "INR";

    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a rupee amount.
    #[must_use]
    pub const fn new(rupees: Decimal) -> Self {
        Self(rupees)
    }

    /// Whole rupees.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// Build an amount from integer paise.
    ///
    /// ```
    /// use cradlix_core::Money;
    ///
    /// assert_eq!(Money::from_paise(123_450).to_string(), "₹1234.50");
    /// ```
    #[must_use]
    pub fn from_paise(paise: i64) -> Self {
        Self(Decimal::new(paise, 2))
    }

    /// The amount in paise, as Razorpay expects.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError`] for negative amounts, fractions of a paisa, or
    /// amounts beyond `i64`.
    pub fn to_paise(&self) -> Result<i64, MoneyError> {
        if self.0 < Decimal::ZERO {
            return Err(MoneyError::Negative);
        }
        let paise = self.0 * Decimal::ONE_HUNDRED;
        if paise.fract() != Decimal::ZERO {
            return Err(MoneyError::SubPaise);
        }
        paise.trunc().to_i64().ok_or(MoneyError::Overflow)
    }

    /// The underlying rupee amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
