//! # Orders
//!
//! Checkout, pickup-code numbering and staff status changes.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart lines ─┐                                                          │
//! │              ├──► place_order()                                         │
//! │  NewOrder ───┤      ├── validate group name / notes                     │
//! │              │      ├── compute_cart_totals (never trusts caller sums)  │
//! │  Live orders ┘      ├── pickup_code(today's orders + 1)                 │
//! │                     └── Order { status: Pending, lines copied by value }│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pickup Code Race
//! The sequence is "orders seen so far today + 1". Two clients checking out
//! at the same moment can read the same count and print the same code. There
//! is no shared counter to prevent it.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::compute_cart_totals;
use crate::discount::DiscountPolicy;
use crate::error::{CoreError, CoreResult};
use crate::types::{CartLine, Order, OrderStatus};
use crate::validation::{validate_group_name, validate_notes};

// =============================================================================
// Pickup Codes
// =============================================================================

/// Pickup code for the next order placed at `now`.
///
/// Format: `YYYYMMDD` of `now` followed by a zero-padded three-digit
/// sequence, where the sequence is the number of `existing` orders created
/// on the same calendar day in `now`'s time zone, plus one.
///
/// ## Example
/// ```rust
/// use chrono::{FixedOffset, TimeZone};
/// use dinedesk_core::order::pickup_code;
///
/// let now = FixedOffset::east_opt(3600).unwrap()
///     .with_ymd_and_hms(2024, 12, 15, 9, 30, 0).unwrap();
/// assert_eq!(pickup_code(&[], &now), "20241215001");
/// ```
pub fn pickup_code<Tz: TimeZone>(existing: &[Order], now: &DateTime<Tz>) -> String {
    let today = now.date_naive();
    let sequence = orders_on_day(existing, today, &now.timezone()).len() + 1;
    format!("{}{:03}", today.format("%Y%m%d"), sequence)
}

/// [`pickup_code`] against the machine's local clock.
pub fn generate_pickup_code(existing: &[Order]) -> String {
    pickup_code(existing, &Local::now())
}

/// Orders created on `day` as seen in time zone `tz`.
pub fn orders_on_day<'a, Tz: TimeZone>(
    orders: &'a [Order],
    day: NaiveDate,
    tz: &Tz,
) -> Vec<&'a Order> {
    orders
        .iter()
        .filter(|order| order.created_at.with_timezone(tz).date_naive() == day)
        .collect()
}

// =============================================================================
// Checkout
// =============================================================================

/// Customer-supplied checkout details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub group_name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Builds a pending order from a cart snapshot.
///
/// ## Errors
/// - `CoreError::EmptyCart` when `lines` is empty
/// - `CoreError::Validation` for a blank or overlong group name or notes
pub fn place_order<Tz: TimeZone>(
    lines: Vec<CartLine>,
    policy: &DiscountPolicy,
    request: &NewOrder,
    existing: &[Order],
    now: &DateTime<Tz>,
) -> CoreResult<Order> {
    if lines.iter().all(|line| line.quantity <= 0) {
        return Err(CoreError::EmptyCart);
    }

    let group_name = validate_group_name(&request.group_name)?;
    let notes = validate_notes(request.notes.as_deref())?;

    let totals = compute_cart_totals(&lines, policy);
    let created_at = now.with_timezone(&Utc);

    Ok(Order {
        id: Uuid::new_v4().to_string(),
        items: lines,
        subtotal_cents: totals.subtotal_cents,
        discount_cents: totals.discount.savings_cents,
        total_cents: totals.total_cents,
        status: OrderStatus::Pending,
        pickup_code: pickup_code(existing, now),
        group_name,
        notes,
        created_at,
        updated_at: created_at,
    })
}

// =============================================================================
// Status Changes
// =============================================================================

/// Moves an order to `next` if the lifecycle allows it.
///
/// Setting the current status again is a no-op, since change
/// notifications can deliver the same staff action twice.
pub fn transition(order: &mut Order, next: OrderStatus, now: DateTime<Utc>) -> CoreResult<()> {
    if order.status == next {
        return Ok(());
    }

    if !order.status.can_transition_to(next) {
        return Err(CoreError::InvalidStatusTransition {
            order_id: order.id.clone(),
            from: order.status.to_string(),
            to: next.to_string(),
        });
    }

    order.status = next;
    order.updated_at = now;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
