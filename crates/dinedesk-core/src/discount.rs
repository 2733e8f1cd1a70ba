//! # Discount Tiers
//!
//! Order-level discounts chosen from an ordered list of tiers.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tiers are checked in LIST order. The first tier whose threshold the    │
//! │  subtotal reaches wins; later tiers are never looked at.                │
//! │                                                                         │
//! │  Default policy:                                                        │
//! │    1. subtotal ≥ €100 → 10% off (savings rounded to €0.10)              │
//! │    2. subtotal ≥ €200 → €20 off                                         │
//! │                                                                         │
//! │  Tier 2 can never match: any subtotal ≥ €200 already matched tier 1.    │
//! │  Kept as-is for parity with receipts already issued.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Rate;
use crate::validation::ValidationResult;

/// 100% in basis points.
const MAX_PERCENTAGE_BPS: i64 = 10_000;

/// What a tier's `value` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a rate in basis points.
    Percentage,
    /// `value` is an amount in cents.
    Flat,
}

/// One configurable discount tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTier {
    /// Customer-facing description.
    pub label: String,
    pub min_subtotal_cents: i64,
    pub kind: DiscountKind,
    pub value: i64,
}

impl DiscountTier {
    pub fn percentage(label: impl Into<String>, min_subtotal: Money, rate: Rate) -> Self {
        DiscountTier {
            label: label.into(),
            min_subtotal_cents: min_subtotal.cents(),
            kind: DiscountKind::Percentage,
            value: rate.bps() as i64,
        }
    }

    pub fn flat(label: impl Into<String>, min_subtotal: Money, amount: Money) -> Self {
        DiscountTier {
            label: label.into(),
            min_subtotal_cents: min_subtotal.cents(),
            kind: DiscountKind::Flat,
            value: amount.cents(),
        }
    }

    /// Rejects negative thresholds and values, and rates above 100%.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.min_subtotal_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "minSubtotalCents".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }

        let max = match self.kind {
            DiscountKind::Percentage => MAX_PERCENTAGE_BPS,
            DiscountKind::Flat => i64::MAX,
        };
        if !(0..=max).contains(&self.value) {
            return Err(ValidationError::OutOfRange {
                field: "value".to_string(),
                min: 0,
                max,
            });
        }

        Ok(())
    }

    fn applies_to(&self, subtotal: Money) -> bool {
        subtotal.cents() >= self.min_subtotal_cents
    }

    fn savings(&self, subtotal: Money) -> Money {
        match self.kind {
            DiscountKind::Percentage => {
                let bps = self.value.clamp(0, u32::MAX as i64) as u32;
                subtotal.percentage_to_tenth(Rate::from_bps(bps))
            }
            DiscountKind::Flat => Money::from_cents(self.value),
        }
    }
}

/// The discount applied to a cart, or the empty descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    /// Tier label, empty when no tier matched.
    pub label: String,
    pub kind: Option<DiscountKind>,
    /// Basis points or cents, depending on `kind`. Zero when none.
    pub value: i64,
    pub savings_cents: i64,
}

impl AppliedDiscount {
    pub fn none() -> Self {
        AppliedDiscount::default()
    }

    #[inline]
    pub fn savings(&self) -> Money {
        Money::from_cents(self.savings_cents)
    }

    pub fn is_none(&self) -> bool {
        self.kind.is_none()
    }
}

/// Ordered discount tiers, first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountPolicy {
    pub tiers: Vec<DiscountTier>,
}

impl DiscountPolicy {
    /// A policy that never discounts.
    pub fn none() -> Self {
        DiscountPolicy { tiers: Vec::new() }
    }

    /// Validates every tier, failing on the first bad one.
    pub fn validate(&self) -> ValidationResult<()> {
        self.tiers.iter().try_for_each(DiscountTier::validate)
    }

    /// Picks the first tier the subtotal reaches.
    ///
    /// Savings never exceed the subtotal, so a flat tier larger than the
    /// cart still leaves a zero total rather than a negative one.
    pub fn evaluate(&self, subtotal: Money) -> AppliedDiscount {
        self.tiers
            .iter()
            .find(|tier| tier.applies_to(subtotal))
            .map(|tier| AppliedDiscount {
                label: tier.label.clone(),
                kind: Some(tier.kind),
                value: tier.value,
                savings_cents: tier.savings(subtotal).min(subtotal.non_negative()).cents(),
            })
            .unwrap_or_default()
    }
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        DiscountPolicy {
            tiers: vec![
                DiscountTier::percentage(
                    "10% off orders over €100",
                    Money::from_major_minor(100, 0),
                    Rate::from_bps(1000),
                ),
                DiscountTier::flat(
                    "€20 off orders over €200",
                    Money::from_major_minor(200, 0),
                    Money::from_major_minor(20, 0),
                ),
            ],
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
