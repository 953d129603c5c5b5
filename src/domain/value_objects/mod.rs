//! Value Objects for Sales

use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CURRENCY_DECIMALS: u32 = 2;

/// Alphabet for order and tracking codes. Skips I, O, 0 and 1.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Round half away from zero to currency precision.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `value` needs no more than two decimal places.
pub fn has_currency_precision(value: Decimal) -> bool { value.normalize().scale() <= CURRENCY_DECIMALS }

pub fn random_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length).map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char).collect()
}

/// Quantity value object, between one unit and [`Quantity::MAX`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity a stored line item column can hold.
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 { return Err(QuantityError::Zero); }
        if value > Self::MAX { return Err(QuantityError::TooLarge); }
        Ok(Self(value))
    }
    pub fn value(&self) -> u32 { self.0 }
    pub fn as_decimal(&self) -> Decimal { Decimal::from(self.0) }
}

#[derive(Debug, Clone)] pub enum QuantityError { Zero, TooLarge }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "Quantity must be at least 1"),
            Self::TooLarge => write!(f, "Quantity must not exceed {}", Quantity::MAX),
        }
    }
}

/// Adjustment percentage, clamped into [0, 100]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentPercent(Decimal);

impl AdjustmentPercent {
    pub const MAX: Decimal = Decimal::ONE_HUNDRED;

    pub fn clamped(value: Decimal) -> Self { Self(value.clamp(Decimal::ZERO, Self::MAX)) }
    pub fn zero() -> Self { Self(Decimal::ZERO) }
    pub fn value(&self) -> Decimal { self.0 }
    pub fn is_positive(&self) -> bool { self.0 > Decimal::ZERO }
    /// `round_currency(amount * percent / 100)`
    pub fn of(&self, amount: Decimal) -> Decimal { round_currency(amount * self.0 / Self::MAX) }
}

impl fmt::Display for AdjustmentPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0.normalize()) }
}

/// Display identifier of a sale
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub const LENGTH: usize = 8;
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self { Self(random_code(rng, Self::LENGTH)) }
    pub fn from_stored(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Shipment tracking code
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    pub const LENGTH: usize = 10;
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self { Self(random_code(rng, Self::LENGTH)) }
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}
