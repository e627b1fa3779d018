//! Plain-text financial summary embedded in the advisor's instruction

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Aggregates, Debt, Payment};

/// Number of payments listed under "Recent Payments"
pub const RECENT_PAYMENT_LIMIT: usize = 5;

/// Serializable snapshot of a user's finances
///
/// Built from a ledger, or accepted from a client as `financialContext` on
/// the stateless chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FinancialContext {
    pub total_debt: f64,
    pub total_paid: f64,
    pub total_monthly_payments: f64,
    #[serde(default)]
    pub debts: Vec<DebtSummary>,
    #[serde(default)]
    pub recent_payments: Vec<PaymentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DebtSummary {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub interest_rate: f64,
    pub monthly_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentSummary {
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

impl FinancialContext {
    /// Snapshot with the most recent payments first, at most
    /// [`RECENT_PAYMENT_LIMIT`] of them. Payments on the same date keep their
    /// input order.
    pub fn new(aggregates: &Aggregates, debts: &[Debt], payments: &[Payment]) -> Self {
        let mut recent: Vec<&Payment> = payments.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(RECENT_PAYMENT_LIMIT);

        Self {
            total_debt: aggregates.total_debt,
            total_paid: aggregates.total_paid,
            total_monthly_payments: aggregates.total_monthly_payments,
            debts: debts
                .iter()
                .map(|d| DebtSummary {
                    name: d.name.clone(),
                    amount: d.amount,
                    interest_rate: d.interest_rate,
                    monthly_payment: d.monthly_payment,
                })
                .collect(),
            recent_payments: recent
                .into_iter()
                .map(|p| PaymentSummary {
                    amount: p.amount,
                    date: p.date,
                    note: p.note.clone(),
                })
                .collect(),
        }
    }

    /// Render the summary text
    pub fn render(&self) -> String {
        let mut out = String::from("Current Financial Situation:\n");
        out.push_str(&format!("- Total Debt: ${:.2}\n", self.total_debt));
        out.push_str(&format!("- Total Paid: ${:.2}\n", self.total_paid));
        out.push_str(&format!(
            "- Total Monthly Payments: ${:.2}\n\n",
            self.total_monthly_payments
        ));

        out.push_str("Current Debts:\n");
        for debt in &self.debts {
            out.push_str(&format!(
                "- {}: ${:.2} ({}% interest, ${:.2}/month)\n",
                debt.name, debt.amount, debt.interest_rate, debt.monthly_payment
            ));
        }

        if !self.recent_payments.is_empty() {
            out.push_str("\nRecent Payments:\n");
            for payment in &self.recent_payments {
                out.push_str(&format!(
                    "- ${:.2} on {}",
                    payment.amount,
                    payment.date.format("%-m/%-d/%Y")
                ));
                match payment.note.as_deref().filter(|n| !n.is_empty()) {
                    Some(note) => out.push_str(&format!(" ({})\n", note)),
                    None => out.push('\n'),
                }
            }
        }

        out
    }
}

/// Render a ledger snapshot as advisor context text
pub fn format_financial_context(
    aggregates: &Aggregates,
    debts: &[Debt],
    payments: &[Payment],
) -> String {
    FinancialContext::new(aggregates, debts, payments).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::compute_aggregates;
    use chrono::Utc;

    fn debt(name: &str, amount: f64, rate: f64, monthly: f64) -> Debt {
        Debt {
            id: 1,
            name: name.into(),
            amount,
            monthly_payment: monthly,
            interest_rate: rate,
            created_at: Utc::now(),
        }
    }

    fn payment(id: i64, amount: f64, date: (i32, u32, u32), note: Option<&str>) -> Payment {
        Payment {
            id,
            debt_id: 1,
            amount,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            note: note.map(str::to_string),
            interest_amount: 0.0,
            capital_amount: amount,
            idempotency_key: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_context() {
        let text = format_financial_context(&Aggregates::default(), &[], &[]);
        assert_eq!(
            text,
            "Current Financial Situation:\n\
             - Total Debt: $0.00\n\
             - Total Paid: $0.00\n\
             - Total Monthly Payments: $0.00\n\
             \n\
             Current Debts:\n"
        );
        assert!(!text.contains("Recent Payments"));
    }

    #[test]
    fn test_empty_ledger_context_has_no_negative_zero() {
        let text = format_financial_context(&compute_aggregates(&[], &[]), &[], &[]);
        assert!(text.contains("- Total Debt: $0.00\n"));
        assert!(text.contains("- Total Paid: $0.00\n"));
        assert!(text.contains("- Total Monthly Payments: $0.00\n"));
        assert!(!text.contains("$-0.00"));
    }

    #[test]
    fn test_full_context() {
        let debts = vec![
            debt("Visa", 910.0, 12.0, 100.0),
            debt("Car loan", 8000.5, 5.5, 250.0),
        ];
        let payments = vec![payment(1, 100.0, (2024, 2, 1), Some("February"))];
        let text = format_financial_context(
            &compute_aggregates(&debts, &payments),
            &debts,
            &payments,
        );

        assert!(text.contains("- Total Debt: $8910.50\n"));
        assert!(text.contains("- Total Paid: $100.00\n"));
        assert!(text.contains("- Total Monthly Payments: $350.00\n\n"));
        assert!(text.contains("- Visa: $910.00 (12% interest, $100.00/month)\n"));
        assert!(text.contains("- Car loan: $8000.50 (5.5% interest, $250.00/month)\n"));
        assert!(text.ends_with("\nRecent Payments:\n- $100.00 on 2/1/2024 (February)\n"));
    }

    #[test]
    fn test_recent_payments_sorted_and_limited() {
        let payments = vec![
            payment(1, 1.0, (2024, 1, 1), None),
            payment(2, 2.0, (2024, 3, 1), None),
            payment(3, 3.0, (2024, 2, 1), None),
            payment(4, 4.0, (2024, 5, 1), None),
            payment(5, 5.0, (2024, 4, 1), None),
            payment(6, 6.0, (2024, 3, 1), None),
            payment(7, 7.0, (2023, 12, 1), None),
        ];

        let context = FinancialContext::new(&Aggregates::default(), &[], &payments);
        let amounts: Vec<f64> = context.recent_payments.iter().map(|p| p.amount).collect();

        // Ties on 2024-03-01 keep input order
        assert_eq!(amounts, vec![4.0, 5.0, 2.0, 6.0, 3.0]);
    }

    #[test]
    fn test_blank_note_omitted() {
        let payments = vec![payment(1, 20.0, (2024, 11, 30), Some(""))];
        let text = format_financial_context(&Aggregates::default(), &[], &payments);
        assert!(text.contains("- $20.00 on 11/30/2024\n"));
    }

    #[test]
    fn test_context_json_is_camel_case() {
        let json = r#"{
            "totalDebt": 1000,
            "totalPaid": 0,
            "totalMonthlyPayments": 100,
            "debts": [{"name": "Visa", "amount": 1000, "interestRate": 12, "monthlyPayment": 100}],
            "recentPayments": []
        }"#;
        let context: FinancialContext = serde_json::from_str(json).unwrap();
        assert_eq!(context.debts[0].interest_rate, 12.0);
        assert!(context
            .render()
            .contains("- Visa: $1000.00 (12% interest, $100.00/month)"));
    }

    #[test]
    fn test_context_rejects_unknown_fields() {
        let json = r#"{"totalDebt":0,"totalPaid":0,"totalMonthlyPayments":0,"extra":1}"#;
        assert!(serde_json::from_str::<FinancialContext>(json).is_err());
    }
}
