//! Cart provider trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{ProductId, UserId};

use crate::error::{OrchestratorError, Result};

/// One product line in a user's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Read/clear access to users' carts.
#[async_trait]
pub trait CartProvider: Send + Sync {
    /// Returns the user's cart lines. An unknown user has an empty cart.
    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>>;

    /// Empties the user's cart.
    async fn clear(&self, user_id: UserId) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<UserId, Vec<CartLine>>,
    fail_on_read: bool,
}

/// In-memory carts for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCart {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line, merging quantities for a product already in the cart.
    pub fn add_item(&self, user_id: UserId, product_id: impl Into<ProductId>, quantity: u32) {
        let product_id = product_id.into();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let lines = state.carts.entry(user_id).or_default();
        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity += quantity,
            None => lines.push(CartLine::new(product_id, quantity)),
        }
    }

    /// Returns a snapshot of the user's cart.
    pub fn items(&self, user_id: UserId) -> Vec<CartLine> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .carts
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_empty(&self, user_id: UserId) -> bool {
        self.items(user_id).is_empty()
    }

    /// Configures the provider to fail on reads.
    pub fn set_fail_on_read(&self, fail: bool) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).fail_on_read = fail;
    }
}

#[async_trait]
impl CartProvider for InMemoryCart {
    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.fail_on_read {
            return Err(OrchestratorError::Collaborator {
                service: "cart",
                reason: "read failed".to_string(),
            });
        }
        Ok(state.carts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn clear(&self, user_id: UserId) -> Result<()> {
        self.state.write().unwrap_or_else(PoisonError::into_inner).carts.remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_clear() {
        let cart = InMemoryCart::new();
        let user = UserId::new(1);
        cart.add_item(user, 10, 2);
        cart.add_item(user, 11, 1);

        let items = cart.cart_items(user).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], CartLine::new(10, 2));

        cart.clear(user).await.unwrap();
        assert!(cart.is_empty(user));
    }

    #[tokio::test]
    async fn test_same_product_is_merged() {
        let cart = InMemoryCart::new();
        let user = UserId::new(2);
        cart.add_item(user, 10, 2);
        cart.add_item(user, 10, 3);
        assert_eq!(cart.items(user), vec![CartLine::new(10, 5)]);
    }

    #[tokio::test]
    async fn test_unknown_user_has_empty_cart() {
        let cart = InMemoryCart::new();
        assert!(cart.cart_items(UserId::new(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fail_on_read() {
        let cart = InMemoryCart::new();
        cart.set_fail_on_read(true);
        let result = cart.cart_items(UserId::new(1)).await;
        assert!(matches!(result, Err(OrchestratorError::Collaborator { .. })));
    }

    #[tokio::test]
    async fn test_poisoned_lock_keeps_serving() {
        let cart = InMemoryCart::new();
        let user = UserId::new(1);
        cart.add_item(user, 10, 1);

        let shared = cart.clone();
        let panicked = std::thread::spawn(move || {
            let _guard = shared.state.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(panicked.is_err());
        assert!(cart.state.is_poisoned());

        cart.add_item(user, 10, 1);
        assert_eq!(cart.cart_items(user).await.unwrap(), vec![CartLine::new(10, 2)]);
        cart.clear(user).await.unwrap();
        assert!(cart.is_empty(user));
    }
}
