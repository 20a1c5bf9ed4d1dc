//! In-memory stock and order book.

use std::collections::HashMap;

use parking_lot::Mutex;

/// Errors raised by the [`Inventory`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// The SKU is not stocked at all.
    #[error("unknown SKU `{sku}`")]
    UnknownSku {
        /// The requested SKU.
        sku: String,
    },

    /// Not enough units are left.
    #[error("only {available} of `{sku}` left")]
    Insufficient {
        /// The requested SKU.
        sku: String,
        /// Units still available.
        available: u32,
    },
}

#[derive(Debug, Default)]
struct Books {
    stock: HashMap<String, u32>,
    next_order: u64,
}

/// Shared stock levels plus an order counter.
#[derive(Debug, Default)]
pub struct Inventory {
    books: Mutex<Books>,
}

impl Inventory {
    /// Creates an inventory seeded with `(sku, units)` pairs.
    #[must_use]
    pub fn with_stock<'a>(items: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let stock = items
            .into_iter()
            .map(|(sku, units)| (sku.to_owned(), units))
            .collect();
        Self {
            books: Mutex::new(Books {
                stock,
                next_order: 1000,
            }),
        }
    }

    /// Returns the units left for `sku`.
    #[must_use]
    pub fn available(&self, sku: &str) -> Option<u32> {
        self.books.lock().stock.get(sku).copied()
    }

    /// Takes `quantity` units of `sku` and returns what is left.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError`] if the SKU is unknown or understocked.
    pub fn reserve(&self, sku: &str, quantity: u32) -> Result<u32, InventoryError> {
        let mut books = self.books.lock();
        let units = books
            .stock
            .get_mut(sku)
            .ok_or_else(|| InventoryError::UnknownSku { sku: sku.to_owned() })?;
        if *units < quantity {
            return Err(InventoryError::Insufficient {
                sku: sku.to_owned(),
                available: *units,
            });
        }
        *units -= quantity;
        Ok(*units)
    }

    /// Puts `quantity` units of `sku` back.
    pub fn release(&self, sku: &str, quantity: u32) {
        if let Some(units) = self.books.lock().stock.get_mut(sku) {
            *units += quantity;
        }
    }

    /// Allocates the next order number.
    pub fn next_order(&self) -> u64 {
        let mut books = self.books.lock();
        books.next_order += 1;
        books.next_order
    }
}
