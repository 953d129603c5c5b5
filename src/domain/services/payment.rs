//! Payment simulation
//!
//! Stand-in for a payment gateway callback. A [`PaymentResolver`] turns the
//! requested simulation into an outcome; the outcome alone decides order
//! status, payment status and whether a tracking code is issued. A real
//! gateway only needs to replace the resolver.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::aggregates::{PaymentStatus, SaleStatus};
use crate::domain::value_objects::TrackingNumber;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentSimulation {
    Approved,
    Declined,
    Pending,
    #[default]
    Random,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Approved,
    Declined,
    Pending,
}

impl PaymentOutcome {
    pub const ALL: [PaymentOutcome; 3] = [Self::Approved, Self::Declined, Self::Pending];

    pub fn as_str(&self) -> &'static str {
        match self { Self::Approved => "APPROVED", Self::Declined => "DECLINED", Self::Pending => "PENDING" }
    }

    pub fn sale_status(&self) -> SaleStatus {
        match self { Self::Approved => SaleStatus::Sent, Self::Declined => SaleStatus::Cancelled, Self::Pending => SaleStatus::Preparing }
    }

    pub fn payment_status(&self) -> PaymentStatus {
        match self { Self::Approved => PaymentStatus::Paid, Self::Declined => PaymentStatus::Failed, Self::Pending => PaymentStatus::Pending }
    }

    pub fn issues_tracking(&self) -> bool { !matches!(self, Self::Declined) }

    /// A supplied tracking number always wins; otherwise one is generated
    /// unless the payment was declined.
    pub fn tracking_number<R: Rng + ?Sized>(&self, supplied: Option<&str>, rng: &mut R) -> Option<TrackingNumber> {
        match supplied.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Some(TrackingNumber::new(t)),
            None if self.issues_tracking() => Some(TrackingNumber::generate(rng)),
            None => None,
        }
    }
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

pub trait PaymentResolver {
    fn resolve(&mut self, requested: PaymentSimulation) -> PaymentOutcome;
}

/// Explicit requests pass through; `Random` draws uniformly from the three outcomes.
pub struct RandomPaymentResolver<R> {
    rng: R,
}

impl<R: Rng> RandomPaymentResolver<R> {
    pub fn new(rng: R) -> Self { Self { rng } }
}

impl<R: Rng> PaymentResolver for RandomPaymentResolver<R> {
    fn resolve(&mut self, requested: PaymentSimulation) -> PaymentOutcome {
        match requested {
            PaymentSimulation::Approved => PaymentOutcome::Approved,
            PaymentSimulation::Declined => PaymentOutcome::Declined,
            PaymentSimulation::Pending => PaymentOutcome::Pending,
            PaymentSimulation::Random => *PaymentOutcome::ALL.choose(&mut self.rng).unwrap_or(&PaymentOutcome::Pending),
        }
    }
}

/// Always answers with the same outcome.
pub struct FixedPaymentResolver(pub PaymentOutcome);

impl PaymentResolver for FixedPaymentResolver {
    fn resolve(&mut self, _requested: PaymentSimulation) -> PaymentOutcome { self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(PaymentOutcome::Approved.sale_status(), SaleStatus::Sent);
        assert_eq!(PaymentOutcome::Approved.payment_status(), PaymentStatus::Paid);
        assert_eq!(PaymentOutcome::Declined.sale_status(), SaleStatus::Cancelled);
        assert_eq!(PaymentOutcome::Declined.payment_status(), PaymentStatus::Failed);
        assert_eq!(PaymentOutcome::Pending.sale_status(), SaleStatus::Preparing);
        assert_eq!(PaymentOutcome::Pending.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_explicit_requests_pass_through() {
        let mut resolver = RandomPaymentResolver::new(StdRng::seed_from_u64(1));
        assert_eq!(resolver.resolve(PaymentSimulation::Approved), PaymentOutcome::Approved);
        assert_eq!(resolver.resolve(PaymentSimulation::Declined), PaymentOutcome::Declined);
        assert_eq!(resolver.resolve(PaymentSimulation::Pending), PaymentOutcome::Pending);
    }

    #[test]
    fn test_random_covers_every_outcome() {
        let mut resolver = RandomPaymentResolver::new(StdRng::seed_from_u64(42));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 { seen.insert(resolver.resolve(PaymentSimulation::Random)); }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_tracking_number_rules() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(PaymentOutcome::Approved.tracking_number(None, &mut rng).map(|t| t.as_str().len()), Some(10));
        assert_eq!(PaymentOutcome::Pending.tracking_number(None, &mut rng).map(|t| t.as_str().len()), Some(10));
        assert_eq!(PaymentOutcome::Declined.tracking_number(None, &mut rng), None);
        assert_eq!(PaymentOutcome::Declined.tracking_number(Some("AR123"), &mut rng), Some(TrackingNumber::new("AR123")));
    }
}
