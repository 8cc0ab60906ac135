//! Per-customer receipts.

use crate::{
    catalog::ProductRecord,
    types::{Barcode, TargetId},
};
use serde::{Deserialize, Serialize};

/// One receipt line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    pub product: ProductRecord,
    pub quantity: u32,
}

/// Items attributed to one customer, in first-purchase order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerReceipt {
    pub customer_id: TargetId,
    pub purchases: Vec<PurchaseEntry>,
}

impl CustomerReceipt {
    pub fn new(customer_id: TargetId) -> Self {
        Self {
            customer_id,
            purchases: Vec::new(),
        }
    }

    pub fn purchase(&mut self, product: &ProductRecord, quantity: u32) {
        match self.entry_mut(&product.barcode) {
            Some(entry) => entry.quantity += quantity,
            None => self.purchases.push(PurchaseEntry {
                product: product.clone(),
                quantity,
            }),
        }
    }

    /// Return `quantity` items of `barcode`. The line disappears once its
    /// quantity would drop to zero or below; unknown products are ignored.
    pub fn putback(&mut self, barcode: &Barcode, quantity: u32) {
        let Some(idx) = self.purchases.iter().position(|e| &e.product.barcode == barcode) else {
            return;
        };
        if self.purchases[idx].quantity > quantity {
            self.purchases[idx].quantity -= quantity;
        } else {
            self.purchases.remove(idx);
        }
    }

    pub fn quantity_of(&self, barcode: &Barcode) -> u32 {
        self.purchases
            .iter()
            .find(|e| &e.product.barcode == barcode)
            .map_or(0, |e| e.quantity)
    }

    pub fn total_items(&self) -> u32 {
        self.purchases.iter().map(|e| e.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }

    fn entry_mut(&mut self, barcode: &Barcode) -> Option<&mut PurchaseEntry> {
        self.purchases.iter_mut().find(|e| &e.product.barcode == barcode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchases_accumulate_per_product() {
        let chips = ProductRecord::new("1", "Chips", 48.0);
        let soda = ProductRecord::new("2", "Soda", 355.0);
        let mut r = CustomerReceipt::new("7".into());
        r.purchase(&chips, 1);
        r.purchase(&soda, 2);
        r.purchase(&chips, 2);
        assert_eq!(r.quantity_of(&"1".into()), 3);
        assert_eq!(r.total_items(), 5);
        assert_eq!(r.purchases[0].product.barcode.as_str(), "1");
    }

    #[test]
    fn putback_decrements_then_removes() {
        let chips = ProductRecord::new("1", "Chips", 48.0);
        let mut r = CustomerReceipt::new("7".into());
        r.purchase(&chips, 3);
        r.putback(&"1".into(), 1);
        assert_eq!(r.quantity_of(&"1".into()), 2);
        r.putback(&"1".into(), 5);
        assert!(r.is_empty());
        r.putback(&"unknown".into(), 1);
        assert_eq!(r.total_items(), 0);
    }
}
