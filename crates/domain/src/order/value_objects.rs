//! Value objects for the order domain.

use common::{Money, ProductId, UserId};
use serde::{Deserialize, Serialize};

use super::OrderError;

/// Largest quantity a single line may carry.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// A line of an order.
///
/// The unit price is a snapshot taken when the order was created, so later
/// catalog price changes never affect the order total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The product ordered.
    pub product_id: ProductId,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit at order time.
    pub unit_price: Money,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns quantity * unit_price, or None on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A validated order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    user_id: UserId,
    lines: Vec<OrderLine>,
    total: Money,
}

impl NewOrder {
    /// Validates the lines and freezes the total.
    pub fn new(user_id: UserId, lines: Vec<OrderLine>) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::NoLines);
        }
        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: line.quantity,
                });
            }
            if line.quantity > MAX_LINE_QUANTITY {
                return Err(OrderError::QuantityTooLarge {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    max: MAX_LINE_QUANTITY,
                });
            }
            if !line.unit_price.is_positive() {
                return Err(OrderError::InvalidPrice {
                    product_id: line.product_id,
                    price: line.unit_price.minor_units(),
                });
            }
        }
        let total = lines
            .iter()
            .map(OrderLine::line_total)
            .try_fold(Money::zero(), |acc, line_total| acc.checked_add(line_total?))
            .ok_or(OrderError::TotalOverflow)?;
        Ok(Self {
            user_id,
            lines,
            total,
        })
    }

    /// Returns the owning user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the order lines.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the frozen total.
    pub fn total(&self) -> Money {
        self.total
    }

    pub(crate) fn into_parts(self) -> (UserId, Vec<OrderLine>, Money) {
        (self.user_id, self.lines, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let line = OrderLine::new(1, 3, Money::new(1000));
        assert_eq!(line.line_total(), Some(Money::new(3000)));
    }

    #[test]
    fn test_new_order_freezes_total() {
        let order = NewOrder::new(
            UserId::new(1),
            vec![
                OrderLine::new(1, 2, Money::new(10_000)),
                OrderLine::new(2, 1, Money::new(2_500)),
            ],
        )
        .unwrap();
        assert_eq!(order.total().minor_units(), 22_500);
        assert_eq!(order.lines().len(), 2);
    }

    #[test]
    fn test_new_order_requires_lines() {
        let result = NewOrder::new(UserId::new(1), vec![]);
        assert!(matches!(result, Err(OrderError::NoLines)));
    }

    #[test]
    fn test_new_order_rejects_zero_quantity() {
        let result = NewOrder::new(UserId::new(1), vec![OrderLine::new(4, 0, Money::new(100))]);
        assert!(matches!(
            result,
            Err(OrderError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn test_new_order_rejects_free_items() {
        let result = NewOrder::new(UserId::new(1), vec![OrderLine::new(4, 1, Money::zero())]);
        assert!(matches!(result, Err(OrderError::InvalidPrice { .. })));
    }

    #[test]
    fn test_new_order_rejects_quantity_above_limit() {
        let result = NewOrder::new(
            UserId::new(1),
            vec![OrderLine::new(4, MAX_LINE_QUANTITY + 1, Money::new(1))],
        );
        assert!(matches!(
            result,
            Err(OrderError::QuantityTooLarge { max: MAX_LINE_QUANTITY, .. })
        ));

        let at_limit = NewOrder::new(
            UserId::new(1),
            vec![OrderLine::new(4, MAX_LINE_QUANTITY, Money::new(1))],
        )
        .unwrap();
        assert_eq!(at_limit.total(), Money::new(i64::from(MAX_LINE_QUANTITY)));
    }

    #[test]
    fn test_new_order_rejects_line_total_overflow() {
        let result = NewOrder::new(
            UserId::new(1),
            vec![OrderLine::new(4, 3, Money::new(i64::MAX / 2))],
        );
        assert!(matches!(result, Err(OrderError::TotalOverflow)));
    }

    #[test]
    fn test_new_order_rejects_sum_overflow() {
        let result = NewOrder::new(
            UserId::new(1),
            vec![
                OrderLine::new(4, 1, Money::new(i64::MAX)),
                OrderLine::new(5, 1, Money::new(1)),
            ],
        );
        assert!(matches!(result, Err(OrderError::TotalOverflow)));
    }
}
