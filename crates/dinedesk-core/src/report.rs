//! # Sales Report
//!
//! Statistics for the admin dashboard, computed from the order collection
//! on demand. Day boundaries follow the time zone of the `now` argument.
//!
//! Every order in range counts towards revenue, cancelled ones included,
//! matching the figures staff already reconcile against.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use ts_rs::TS;

use crate::money::Money;
use crate::prep::{dish_key, display_name};
use crate::pricing::resolve_unit_price;
use crate::types::{Order, OrderStatus};

const TOP_ITEMS: usize = 10;
const TOP_CUSTOMERS: usize = 8;
const DAILY_WINDOW: i64 = 7;

// =============================================================================
// Time Range
// =============================================================================

/// Reporting window, always ending at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    Today,
    /// Since Monday of the current week.
    #[default]
    Week,
    Month,
    Year,
    All,
}

impl TimeRange {
    /// First calendar day included, or `None` for [`TimeRange::All`].
    pub fn start_day(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeRange::Today => Some(today),
            TimeRange::Week => {
                Some(today - Duration::days(today.weekday().num_days_from_monday() as i64))
            }
            TimeRange::Month => today.with_day(1),
            TimeRange::Year => today.with_ordinal(1),
            TimeRange::All => None,
        }
    }

    /// Orders created inside this window.
    pub fn filter<'a, Tz: TimeZone>(&self, orders: &'a [Order], now: &DateTime<Tz>) -> Vec<&'a Order> {
        let Some(start) = self.start_day(now.date_naive()) else {
            return orders.iter().collect();
        };
        let tz = now.timezone();
        let end = now.with_timezone(&Utc);

        orders
            .iter()
            .filter(|order| {
                order.created_at.with_timezone(&tz).date_naive() >= start && order.created_at <= end
            })
            .collect()
    }
}

// =============================================================================
// Report Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemSales {
    pub key: String,
    pub display_name: String,
    pub base_item_name: String,
    pub variant: String,
    pub special: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSales {
    pub group_name: String,
    pub order_count: i64,
    pub item_count: i64,
    pub total_spent_cents: i64,
    pub average_order_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Short weekday label, `周一` .. `周日`.
    pub weekday: String,
    pub revenue_cents: i64,
}

/// Aggregated figures for one [`TimeRange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub range: TimeRange,
    pub total_revenue_cents: i64,
    pub order_count: i64,
    pub average_order_cents: i64,
    pub top_items: Vec<ItemSales>,
    pub top_customers: Vec<CustomerSales>,
    /// Last seven days ending today, oldest first. Ignores `range`.
    pub daily_sales: Vec<DailySales>,
}

/// Header cards of the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub today_revenue_cents: i64,
    pub today_orders: i64,
    pub pending_orders: i64,
    pub customers_today: i64,
}

// =============================================================================
// Builders
// =============================================================================

/// Builds the sales report for `range` as of `now`.
pub fn sales_report<Tz: TimeZone>(orders: &[Order], range: TimeRange, now: &DateTime<Tz>) -> SalesReport {
    let in_range = range.filter(orders, now);

    let total_revenue: Money = in_range.iter().map(|order| order.total()).sum();
    let order_count = in_range.len() as i64;

    SalesReport {
        range,
        total_revenue_cents: total_revenue.cents(),
        order_count,
        average_order_cents: average_cents(total_revenue.cents(), order_count),
        top_items: top_items(&in_range),
        top_customers: top_customers(&in_range),
        daily_sales: daily_sales(orders, now),
    }
}

/// Today's figures plus the number of orders still pending.
pub fn dashboard_summary<Tz: TimeZone>(orders: &[Order], now: &DateTime<Tz>) -> DashboardSummary {
    let today = TimeRange::Today.filter(orders, now);
    let customers: HashSet<&str> = today.iter().map(|o| o.group_name.as_str()).collect();

    DashboardSummary {
        today_revenue_cents: today.iter().map(|o| o.total_cents).sum(),
        today_orders: today.len() as i64,
        pending_orders: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count() as i64,
        customers_today: customers.len() as i64,
    }
}

fn top_items(orders: &[&Order]) -> Vec<ItemSales> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut items: Vec<ItemSales> = Vec::new();

    for line in orders.iter().flat_map(|order| order.items.iter()) {
        let key = dish_key(line);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            items.push(ItemSales {
                display_name: display_name(line),
                base_item_name: line.menu_item.name.clone(),
                variant: line.variant_str().to_string(),
                special: line.special_str().to_string(),
                key,
                quantity: 0,
                revenue_cents: 0,
            });
            items.len() - 1
        });

        let entry = &mut items[slot];
        entry.quantity += line.quantity;
        entry.revenue_cents += resolve_unit_price(line)
            .multiply_quantity(line.quantity)
            .cents();
    }

    items.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    items.truncate(TOP_ITEMS);
    items
}

fn top_customers(orders: &[&Order]) -> Vec<CustomerSales> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut customers: Vec<CustomerSales> = Vec::new();

    for order in orders {
        let slot = *index.entry(order.group_name.as_str()).or_insert_with(|| {
            customers.push(CustomerSales {
                group_name: order.group_name.clone(),
                order_count: 0,
                item_count: 0,
                total_spent_cents: 0,
                average_order_cents: 0,
            });
            customers.len() - 1
        });

        let entry = &mut customers[slot];
        entry.order_count += 1;
        entry.item_count += order.items.iter().map(|line| line.quantity).sum::<i64>();
        entry.total_spent_cents += order.total_cents;
    }

    for entry in &mut customers {
        entry.average_order_cents = average_cents(entry.total_spent_cents, entry.order_count);
    }

    customers.sort_by(|a, b| b.order_count.cmp(&a.order_count));
    customers.truncate(TOP_CUSTOMERS);
    customers
}

fn daily_sales<Tz: TimeZone>(orders: &[Order], now: &DateTime<Tz>) -> Vec<DailySales> {
    let today = now.date_naive();
    let tz = now.timezone();

    (0..DAILY_WINDOW)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let revenue_cents = orders
                .iter()
                .filter(|o| o.created_at.with_timezone(&tz).date_naive() == date)
                .map(|o| o.total_cents)
                .sum();
            DailySales {
                date,
                weekday: weekday_label(date.weekday()).to_string(),
                revenue_cents,
            }
        })
        .collect()
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "周一",
        Weekday::Tue => "周二",
        Weekday::Wed => "周三",
        Weekday::Thu => "周四",
        Weekday::Fri => "周五",
        Weekday::Sat => "周六",
        Weekday::Sun => "周日",
    }
}

/// Integer mean, half away from zero. Zero when `count` is zero.
fn average_cents(total: i64, count: i64) -> i64 {
    if count == 0 {
        return 0;
    }
    let half = count / 2;
    if total >= 0 {
        (total + half) / count
    } else {
        (total - half) / count
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
