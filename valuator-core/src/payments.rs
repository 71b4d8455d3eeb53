//! Payment schedule and buy-back analysis for the linear model.
//!
//! The base price is paid in two halves (T0, T1); whatever the valuation
//! exceeds the base price by is paid as an earnout in two halves (T1, T2).
//! The buy-back table compares the buyer's cumulative earnings from the
//! company with the cumulative payments made to the seller.

use serde::{Deserialize, Serialize};

/// Split of the purchase price over periods T0..T2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub base_price: i64,
    pub valuation: i64,
    pub base_t0: i64,
    pub base_t1: i64,
    pub earnout_t1: i64,
    pub earnout_t2: i64,
    /// Valuation minus base price (negative when below the base price)
    pub difference: i64,
}

impl PaymentBreakdown {
    /// Column headers of the payment table.
    pub const HEADERS: [&'static str; 5] = ["Item", "T0", "T1", "T2", "Total"];

    /// Split a valuation against a base price. Halves truncate toward zero.
    ///
    /// Both amounts are expected within `[0, MAX_AMOUNT]`, as the linear model
    /// configuration guarantees; the difference saturates outside that range.
    pub fn calculate(base_price: i64, valuation: i64) -> Self {
        let difference = valuation.saturating_sub(base_price);
        Self {
            base_price,
            valuation,
            base_t0: base_price / 2,
            base_t1: base_price / 2,
            earnout_t1: difference / 2,
            earnout_t2: difference / 2,
            difference,
        }
    }

    /// `[T0, T1, T2, Total]` of the base price row.
    pub fn base_row(&self) -> [i64; 4] {
        [self.base_t0, self.base_t1, 0, self.base_price]
    }

    /// `[T0, T1, T2, Total]` of the earnout row.
    pub fn earnout_row(&self) -> [i64; 4] {
        [0, self.earnout_t1, self.earnout_t2, self.difference]
    }

    /// `[T0, T1, T2, Total]` of the total row.
    pub fn total_row(&self) -> [i64; 4] {
        [
            self.base_t0,
            self.base_t1 + self.earnout_t1,
            self.earnout_t2,
            self.valuation,
        ]
    }

    /// Payment made in each period T0..T3 (nothing is paid in T3).
    pub fn period_payments(&self) -> [i64; 4] {
        let total = self.total_row();
        [total[0], total[1], total[2], 0]
    }

    /// Labelled rows for display.
    pub fn rows(&self) -> Vec<(&'static str, [i64; 4])> {
        vec![
            ("Base price", self.base_row()),
            ("Earnout", self.earnout_row()),
            ("Total", self.total_row()),
        ]
    }
}

/// Earnings versus payments over periods T0..T3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyBackTable {
    pub earnings: [f64; 4],
    pub payments: [f64; 4],
    pub difference: [f64; 4],
    pub cumulative_earnings: [f64; 4],
    pub cumulative_payments: [f64; 4],
    pub cumulative_difference: [f64; 4],
}

fn cumulative(values: &[f64; 4]) -> [f64; 4] {
    let mut out = [0.0; 4];
    let mut running = 0.0;
    for (slot, value) in out.iter_mut().zip(values) {
        running += value;
        *slot = running;
    }
    out
}

impl BuyBackTable {
    /// Column headers of the buy-back table.
    pub const HEADERS: [&'static str; 5] = ["Item", "T0", "T1", "T2", "T3"];

    /// Earnings start at zero, reach EBIT in T1, and EBIT plus the seller's
    /// former income from T2 onward.
    pub fn build(ebit: f64, seller_income: f64, payments: &PaymentBreakdown) -> Self {
        let earnings = [0.0, ebit, ebit + seller_income, ebit + seller_income];
        let paid = payments.period_payments().map(|p| p as f64);

        let mut difference = [0.0; 4];
        for (i, slot) in difference.iter_mut().enumerate() {
            *slot = earnings[i] - paid[i];
        }

        Self {
            cumulative_earnings: cumulative(&earnings),
            cumulative_payments: cumulative(&paid),
            cumulative_difference: cumulative(&difference),
            earnings,
            payments: paid,
            difference,
        }
    }

    /// Period in which cumulative earnings first cover cumulative payments.
    pub fn payback_period(&self) -> Option<usize> {
        self.cumulative_difference.iter().position(|d| *d >= 0.0)
    }

    /// Labelled rows for display.
    pub fn rows(&self) -> Vec<(&'static str, [f64; 4])> {
        vec![
            ("Earnings", self.earnings),
            ("Payments", self.payments),
            ("Difference", self.difference),
            ("Cumulative Earnings", self.cumulative_earnings),
            ("Cumulative Payments", self.cumulative_payments),
            ("Cumulative Difference", self.cumulative_difference),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_above_base() {
        let b = PaymentBreakdown::calculate(800, 1121);
        assert_eq!(b.difference, 321);
        assert_eq!(b.base_row(), [400, 400, 0, 800]);
        assert_eq!(b.earnout_row(), [0, 160, 160, 321]);
        assert_eq!(b.total_row(), [400, 560, 160, 1121]);
    }

    #[test]
    fn test_breakdown_below_base_truncates_toward_zero() {
        let b = PaymentBreakdown::calculate(800, 749);
        assert_eq!(b.difference, -51);
        assert_eq!(b.earnout_t1, -25);
        assert_eq!(b.earnout_t2, -25);
    }

    #[test]
    fn test_buy_back_table() {
        let payments = PaymentBreakdown::calculate(800, 1121);
        let table = BuyBackTable::build(300.0, 220.0, &payments);

        assert_eq!(table.earnings, [0.0, 300.0, 520.0, 520.0]);
        assert_eq!(table.payments, [400.0, 560.0, 160.0, 0.0]);
        assert_eq!(table.difference, [-400.0, -260.0, 360.0, 520.0]);
        assert_eq!(table.cumulative_earnings, [0.0, 300.0, 820.0, 1340.0]);
        assert_eq!(table.cumulative_payments, [400.0, 960.0, 1120.0, 1120.0]);
        assert_eq!(table.cumulative_difference, [-400.0, -660.0, -300.0, 220.0]);
        assert_eq!(table.payback_period(), Some(3));
        assert_eq!(table.rows().len(), 6);
    }

    #[test]
    fn test_no_payback_within_horizon() {
        let payments = PaymentBreakdown::calculate(800, 2020);
        let table = BuyBackTable::build(10.0, 0.0, &payments);
        assert_eq!(table.payback_period(), None);
    }
}
