//! Multi-symbol book routing.
//!
//! Grounded on the teacher crate's `orderbook::manager::BookManager`, which
//! owns a collection of books and routes calls to the right one by symbol.
//! This version drops the teacher's shared trade-listener plumbing (there is
//! no cross-book event fan-out requirement here) and keeps only what a
//! single market-making process needs: one [`super::OrderBook`] per traded
//! symbol, each still governed by the single-writer discipline of §5.

use std::collections::HashMap;

use super::OrderBook;
use crate::error::CoreError;

/// Owns one [`OrderBook`] per symbol.
pub struct BookManager {
    books: HashMap<String, OrderBook>,
    max_orders_per_book: usize,
}

impl BookManager {
    /// Creates an empty manager; every book it creates gets
    /// `max_orders_per_book` pool capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ZeroPoolCapacity`] if `max_orders_per_book` is zero.
    pub fn new(max_orders_per_book: usize) -> Result<Self, CoreError> {
        if max_orders_per_book == 0 {
            return Err(CoreError::ZeroPoolCapacity);
        }
        Ok(BookManager {
            books: HashMap::new(),
            max_orders_per_book,
        })
    }

    /// Returns the book for `symbol`, creating it on first access.
    pub fn book_mut(&mut self, symbol: &str) -> &mut OrderBook {
        self.books.entry(symbol.to_string()).or_insert_with(|| {
            OrderBook::new(self.max_orders_per_book)
                .expect("max_orders_per_book validated non-zero in BookManager::new")
        })
    }

    /// Returns the book for `symbol` if it has been created.
    pub fn book(&self, symbol: &str) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Number of symbols currently tracked.
    pub fn symbol_count(&self) -> usize {
        self.books.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Side;

    #[test]
    fn routes_orders_to_independent_per_symbol_books() {
        let mut manager = BookManager::new(1024).unwrap();
        manager.book_mut("BTC-USD").add_order(1, 100, 10, Side::Buy, 0);
        manager.book_mut("ETH-USD").add_order(2, 50, 5, Side::Buy, 0);

        assert_eq!(manager.book("BTC-USD").unwrap().best_bid(), 100);
        assert_eq!(manager.book("ETH-USD").unwrap().best_bid(), 50);
        assert_eq!(manager.symbol_count(), 2);
    }

    #[test]
    fn unknown_symbol_returns_none_until_first_access() {
        let manager = BookManager::new(1024).unwrap();
        assert!(manager.book("BTC-USD").is_none());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(BookManager::new(0), Err(CoreError::ZeroPoolCapacity)));
    }
}
