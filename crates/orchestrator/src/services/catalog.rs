//! Product catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{Money, ProductId};

use crate::error::{OrchestratorError, Result};

/// A product as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub sold_out: bool,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            sold_out: stock == 0,
        }
    }

    pub fn stock_level(&self) -> StockLevel {
        StockLevel {
            stock: self.stock,
            sold_out: self.sold_out,
        }
    }
}

/// The two inventory fields of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub stock: u32,
    pub sold_out: bool,
}

impl StockLevel {
    /// Builds a level whose sold-out flag follows the counter.
    pub fn new(stock: u32) -> Self {
        Self {
            stock,
            sold_out: stock == 0,
        }
    }
}

/// Product lookup and atomic stock updates.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Replaces the stock level only if the current counter equals `expected`.
    ///
    /// Returns false when the counter moved, or when the product is unknown.
    async fn compare_and_swap_stock(
        &self,
        product_id: ProductId,
        expected: u32,
        new: StockLevel,
    ) -> Result<bool>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, Product>,
    fail_on_get: bool,
    cas_attempts: u64,
}

/// In-memory catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub fn add_product(&self, product: Product) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .insert(product.id, product);
    }

    /// Returns the current stock, or None for an unknown product.
    pub fn stock(&self, product_id: impl Into<ProductId>) -> Option<u32> {
        let product_id = product_id.into();
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    /// Returns true if the product is marked sold out.
    pub fn is_sold_out(&self, product_id: impl Into<ProductId>) -> bool {
        let product_id = product_id.into();
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .get(&product_id)
            .is_some_and(|p| p.sold_out)
    }

    /// Overwrites stock outside the ledger (restocking, other channels).
    pub fn set_stock(&self, product_id: impl Into<ProductId>, stock: u32) {
        let product_id = product_id.into();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(product) = state.products.get_mut(&product_id) {
            product.stock = stock;
            product.sold_out = stock == 0;
        }
    }

    /// Returns how many compare-and-swap calls were made.
    pub fn cas_attempts(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).cas_attempts
    }

    /// Configures the catalog to fail on lookups.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).fail_on_get = fail;
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get(&self, product_id: ProductId) -> Result<Option<Product>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_get {
            return Err(OrchestratorError::Collaborator {
                service: "catalog",
                reason: "lookup failed".to_string(),
            });
        }
        Ok(state.products.get(&product_id).cloned())
    }

    async fn compare_and_swap_stock(
        &self,
        product_id: ProductId,
        expected: u32,
        new: StockLevel,
    ) -> Result<bool> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.cas_attempts += 1;
        let Some(product) = state.products.get_mut(&product_id) else {
            return Ok(false);
        };
        if product.stock != expected {
            return Ok(false);
        }
        product.stock = new.stock;
        product.sold_out = new.sold_out;
        Ok(true)
    }
}
