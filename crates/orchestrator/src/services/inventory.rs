//! Stock validation, debit and restore on top of a product catalog.

use common::ProductId;
use domain::OrderLine;

use crate::error::{OrchestratorError, Result};
use crate::services::catalog::{Product, ProductCatalog, StockLevel};

/// Per-product stock counters.
///
/// Mutations are compare-and-swap loops, so concurrent debits on the same
/// product never lose an update.
#[derive(Debug, Clone)]
pub struct InventoryLedger<P> {
    catalog: P,
}

impl<P: ProductCatalog> InventoryLedger<P> {
    pub fn new(catalog: P) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &P {
        &self.catalog
    }

    async fn load(&self, product_id: ProductId) -> Result<Product> {
        self.catalog
            .get(product_id)
            .await?
            .ok_or(OrchestratorError::ProductNotFound(product_id))
    }

    /// Checks that `quantity` is available without touching stock.
    pub async fn reserve_check(&self, product_id: ProductId, quantity: u32) -> Result<Product> {
        let product = self.load(product_id).await?;
        if quantity > product.stock {
            return Err(OrchestratorError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            });
        }
        Ok(product)
    }

    /// Takes `quantity` out of stock.
    ///
    /// Fails with `StockExhausted` if the stock read at debit time is below
    /// `quantity`; nothing is changed in that case.
    pub async fn debit(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel> {
        loop {
            let current = self.load(product_id).await?.stock;
            if current < quantity {
                metrics::counter!("inventory_conflicts_total").increment(1);
                return Err(OrchestratorError::StockExhausted {
                    product_id,
                    requested: quantity,
                    available: current,
                });
            }

            let next = StockLevel::new(current.saturating_sub(quantity));
            if self
                .catalog
                .compare_and_swap_stock(product_id, current, next)
                .await?
            {
                return Ok(next);
            }
            tracing::debug!(%product_id, "stock changed during debit, retrying");
        }
    }

    /// Puts `quantity` back into stock.
    pub async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel> {
        loop {
            let current = self.load(product_id).await?.stock;
            let next = StockLevel::new(current.saturating_add(quantity));
            if self
                .catalog
                .compare_and_swap_stock(product_id, current, next)
                .await?
            {
                return Ok(next);
            }
            tracing::debug!(%product_id, "stock changed during restore, retrying");
        }
    }

    /// Debits every line, or none of them.
    ///
    /// Lines already debited when one fails are restored before the error is
    /// returned.
    pub async fn debit_lines(&self, lines: &[OrderLine]) -> Result<()> {
        for (done, line) in lines.iter().enumerate() {
            if let Err(err) = self.debit(line.product_id, line.quantity).await {
                if let Err(rollback) = self.restore_lines(&lines[..done]).await {
                    tracing::error!(error = %rollback, "failed to roll back partial debit");
                }
                return Err(err);
            }
        }
        Ok(())
    }

    pub async fn restore_lines(&self, lines: &[OrderLine]) -> Result<()> {
        for line in lines {
            self.restore(line.product_id, line.quantity).await?;
        }
        Ok(())
    }
}
