//! Receipt evaluation against ground truth: precision, recall, F1.

use crate::{
    receipt::CustomerReceipt,
    types::{Barcode, TargetId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One labelled shopping action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthEvent {
    pub customer: TargetId,
    /// One entry per item moved
    pub products: Vec<Barcode>,
    pub putback: bool,
}

/// Net ground truth: every putback cancels the earliest matching pickup of the
/// same customer and product (compared on the first product of each event).
pub fn remove_putbacks(events: &[GroundTruthEvent]) -> Vec<GroundTruthEvent> {
    let mut net: Vec<GroundTruthEvent> = Vec::new();
    for event in events {
        if !event.putback {
            net.push(event.clone());
            continue;
        }
        let matching = net.iter().position(|e| {
            e.customer == event.customer && e.products.first() == event.products.first()
        });
        if let Some(i) = matching {
            net.remove(i);
        }
    }
    net
}

/// Accumulated item-level statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReceiptMetrics {
    /// Number of sessions evaluated
    pub n_sessions: u64,
    /// Ground-truth items found on the right customer's receipt
    pub true_positives: u64,
    /// Receipt items left unmatched
    pub false_positives: u64,
    /// Ground-truth items missing from receipts
    pub false_negatives: u64,
}

impl ReceiptMetrics {
    /// Precision = TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        let denom = (self.true_positives + self.false_positives) as f64;
        if denom == 0.0 {
            0.0
        } else {
            self.true_positives as f64 / denom
        }
    }

    /// Recall = TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        let denom = (self.true_positives + self.false_negatives) as f64;
        if denom == 0.0 {
            0.0
        } else {
            self.true_positives as f64 / denom
        }
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Accumulate one session. `ground_truth` is the raw labelled list; putbacks
    /// are netted out first.
    pub fn accumulate(
        &mut self,
        receipts: &BTreeMap<TargetId, CustomerReceipt>,
        ground_truth: &[GroundTruthEvent],
    ) {
        self.n_sessions += 1;

        let mut remaining: HashMap<(TargetId, Barcode), u32> = HashMap::new();
        for (id, receipt) in receipts {
            for entry in &receipt.purchases {
                *remaining
                    .entry((id.clone(), entry.product.barcode.clone()))
                    .or_default() += entry.quantity;
            }
        }

        let mut tp = 0u64;
        let mut n_gt = 0u64;
        for event in remove_putbacks(ground_truth) {
            for barcode in event.products {
                n_gt += 1;
                if let Some(q) = remaining.get_mut(&(event.customer.clone(), barcode)) {
                    if *q > 0 {
                        *q -= 1;
                        tp += 1;
                    }
                }
            }
        }

        self.true_positives += tp;
        self.false_positives += remaining.values().map(|&q| q as u64).sum::<u64>();
        self.false_negatives += n_gt - tp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductRecord;
    use approx::assert_abs_diff_eq;

    fn gt(customer: &str, product: &str, putback: bool) -> GroundTruthEvent {
        GroundTruthEvent {
            customer: customer.into(),
            products: vec![product.into()],
            putback,
        }
    }

    fn receipts(items: &[(&str, &str, u32)]) -> BTreeMap<TargetId, CustomerReceipt> {
        let mut out: BTreeMap<TargetId, CustomerReceipt> = BTreeMap::new();
        for &(customer, product, qty) in items {
            out.entry(customer.into())
                .or_insert_with(|| CustomerReceipt::new(customer.into()))
                .purchase(&ProductRecord::new(product, product, 10.0), qty);
        }
        out
    }

    #[test]
    fn putback_cancels_matching_pickup_only() {
        let net = remove_putbacks(&[
            gt("1", "a", false),
            gt("2", "a", false),
            gt("1", "b", false),
            gt("1", "a", true),
        ]);
        assert_eq!(net, vec![gt("2", "a", false), gt("1", "b", false)]);
    }

    #[test]
    fn counts_items_per_customer() {
        let r = receipts(&[("1", "a", 2), ("2", "b", 1)]);
        let truth = [gt("1", "a", false), gt("2", "a", false), gt("2", "b", false)];
        let mut m = ReceiptMetrics::default();
        m.accumulate(&r, &truth);
        assert_eq!(m.true_positives, 2);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.false_negatives, 1);
        assert_abs_diff_eq!(m.precision(), 2.0 / 3.0);
        assert_abs_diff_eq!(m.recall(), 2.0 / 3.0);
        assert_abs_diff_eq!(m.f1(), 2.0 / 3.0);
    }

    #[test]
    fn accumulates_across_sessions() {
        let mut m = ReceiptMetrics::default();
        m.accumulate(&receipts(&[("1", "a", 1)]), &[gt("1", "a", false)]);
        m.accumulate(&BTreeMap::new(), &[gt("1", "a", false)]);
        assert_eq!(m.n_sessions, 2);
        assert_abs_diff_eq!(m.precision(), 1.0);
        assert_abs_diff_eq!(m.recall(), 0.5);
    }

    #[test]
    fn empty_session_scores_zero() {
        let m = ReceiptMetrics::default();
        assert_eq!(m.precision(), 0.0);
        assert_eq!(m.f1(), 0.0);
    }
}
