//! Server-side order totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::{DomainError, DomainResult, round_money};

use crate::order::{OrderLine, OrderType};

/// Values read from settings at the moment an order is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Percent, e.g. `8.5` for 8.5%.
    pub tax_rate: Decimal,
    pub delivery_fee: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

pub fn price_order(
    lines: &[OrderLine],
    order_type: OrderType,
    settings: PricingSettings,
) -> DomainResult<OrderTotals> {
    if settings.tax_rate < Decimal::ZERO || settings.delivery_fee < Decimal::ZERO {
        return Err(DomainError::validation(
            "tax rate and delivery fee cannot be negative",
        ));
    }
    let subtotal = round_money(lines.iter().map(OrderLine::line_total).sum());
    let tax = round_money(subtotal * settings.tax_rate / Decimal::ONE_HUNDRED);
    let delivery_fee = match order_type {
        OrderType::Delivery => round_money(settings.delivery_fee),
        OrderType::DineIn | OrderType::Takeaway => Decimal::ZERO,
    };
    Ok(OrderTotals {
        subtotal,
        tax,
        delivery_fee,
        total: subtotal + tax + delivery_fee,
    })
}
