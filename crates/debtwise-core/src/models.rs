//! Domain models for Debtwise

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A debt being paid down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub name: String,
    /// Outstanding principal balance. Only ever reduced by payments and
    /// may go negative on overpayment.
    pub amount: f64,
    /// Scheduled monthly payment (informational, not enforced)
    pub monthly_payment: f64,
    /// Nominal annual percentage rate, e.g. 12.0 for 12%
    pub interest_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl Debt {
    /// Monthly rate as a fraction (`interest_rate / 100 / 12`)
    pub fn monthly_interest_rate(&self) -> f64 {
        self.interest_rate / 100.0 / 12.0
    }

    /// Interest accrued on the current balance for one month
    pub fn interest_due(&self) -> f64 {
        self.amount * self.monthly_interest_rate()
    }

    /// Cumulative principal payments exceeded the original balance
    pub fn is_overpaid(&self) -> bool {
        self.amount < 0.0
    }
}

/// A new debt to be created (before DB insertion)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewDebt {
    pub name: String,
    pub amount: f64,
    pub monthly_payment: f64,
    #[serde(default)]
    pub interest_rate: f64,
}

impl NewDebt {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("debt name is required".into()));
        }
        non_negative("amount", self.amount)?;
        non_negative("monthly_payment", self.monthly_payment)?;
        non_negative("interest_rate", self.interest_rate)?;
        Ok(())
    }
}

/// Editable debt fields. The balance is not editable; it only moves
/// through recorded payments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebtUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub monthly_payment: Option<f64>,
    #[serde(default)]
    pub interest_rate: Option<f64>,
}

impl DebtUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("debt name is required".into()));
            }
        }
        if let Some(monthly) = self.monthly_payment {
            non_negative("monthly_payment", monthly)?;
        }
        if let Some(rate) = self.interest_rate {
            non_negative("interest_rate", rate)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.monthly_payment.is_none() && self.interest_rate.is_none()
    }
}

/// A payment applied to a debt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub debt_id: i64,
    /// Total cash paid (`interest_amount + capital_amount`)
    pub amount: f64,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub interest_amount: f64,
    pub capital_amount: f64,
    /// Client-supplied token used to detect resubmissions
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A payment as submitted by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPayment {
    pub debt_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl NewPayment {
    pub fn new(debt_id: i64, amount: f64, date: NaiveDate) -> Self {
        Self {
            debt_id,
            amount,
            date,
            note: None,
            idempotency_key: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::Validation(format!(
                "payment amount must be a positive number, got {}",
                self.amount
            )));
        }
        if let Some(ref key) = self.idempotency_key {
            if key.trim().is_empty() {
                return Err(Error::Validation("idempotency_key must not be blank".into()));
            }
        }
        Ok(())
    }

    /// Note with surrounding whitespace removed; blank notes become `None`
    pub fn normalized_note(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Validation(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(())
}

/// Interest/principal split of a single payment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub interest_amount: f64,
    pub capital_amount: f64,
}

impl PaymentAllocation {
    pub fn total(&self) -> f64 {
        self.interest_amount + self.capital_amount
    }
}

/// Dashboard totals across a user's debts and payments
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub total_debt: f64,
    pub total_paid: f64,
    pub total_monthly_payments: f64,
}

/// Sum of payments made in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    /// Short month name ("Jan")
    pub label: String,
    pub total: f64,
}

/// Author of a chat log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    /// Locally generated notices, e.g. advisor failures
    System,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            _ => Err(format!("Unknown chat role: {}", s)),
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry in a user's advisor conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debt(amount: f64, rate: f64) -> Debt {
        Debt {
            id: 1,
            name: "Card".into(),
            amount,
            monthly_payment: 50.0,
            interest_rate: rate,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_interest_due() {
        let d = debt(1000.0, 12.0);
        assert!((d.monthly_interest_rate() - 0.01).abs() < 1e-12);
        assert!((d.interest_due() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_rate_has_no_interest() {
        assert_eq!(debt(500.0, 0.0).interest_due(), 0.0);
    }

    #[test]
    fn test_new_debt_validation() {
        let ok = NewDebt {
            name: "Car loan".into(),
            amount: 8000.0,
            monthly_payment: 250.0,
            interest_rate: 5.5,
        };
        assert!(ok.validate().is_ok());

        let blank = NewDebt {
            name: "  ".into(),
            ..ok.clone()
        };
        assert!(matches!(blank.validate(), Err(Error::Validation(_))));

        let negative = NewDebt {
            amount: -1.0,
            ..ok.clone()
        };
        assert!(matches!(negative.validate(), Err(Error::Validation(_))));

        let nan_rate = NewDebt {
            interest_rate: f64::NAN,
            ..ok
        };
        assert!(matches!(nan_rate.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_new_payment_validation() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(NewPayment::new(1, 25.0, date).validate().is_ok());
        assert!(NewPayment::new(1, 0.0, date).validate().is_err());
        assert!(NewPayment::new(1, -5.0, date).validate().is_err());
        assert!(NewPayment::new(1, f64::INFINITY, date).validate().is_err());
        assert!(NewPayment::new(1, 5.0, date)
            .with_idempotency_key(" ")
            .validate()
            .is_err());
    }

    #[test]
    fn test_new_debt_rejects_unknown_fields() {
        let json = r#"{"name":"Card","amount":10,"monthly_payment":1,"color":"red"}"#;
        assert!(serde_json::from_str::<NewDebt>(json).is_err());
    }

    #[test]
    fn test_new_debt_interest_rate_defaults_to_zero() {
        let json = r#"{"name":"Card","amount":10,"monthly_payment":1}"#;
        let debt: NewDebt = serde_json::from_str(json).unwrap();
        assert_eq!(debt.interest_rate, 0.0);
    }

    #[test]
    fn test_normalized_note() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(NewPayment::new(1, 5.0, date).normalized_note(), None);
        assert_eq!(
            NewPayment::new(1, 5.0, date).with_note("   ").normalized_note(),
            None
        );
        assert_eq!(
            NewPayment::new(1, 5.0, date)
                .with_note(" extra ")
                .normalized_note()
                .as_deref(),
            Some("extra")
        );
    }

    #[test]
    fn test_debt_update_rejects_amount() {
        let json = r#"{"amount": 0}"#;
        assert!(serde_json::from_str::<DebtUpdate>(json).is_err());

        let update: DebtUpdate = serde_json::from_str(r#"{"interest_rate": 3.5}"#).unwrap();
        assert!(update.validate().is_ok());
        assert!(!update.is_empty());
        assert!(DebtUpdate::default().is_empty());
        assert!(DebtUpdate {
            name: Some(String::new()),
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_chat_role_round_trip() {
        for role in [ChatRole::User, ChatRole::Assistant, ChatRole::System] {
            assert_eq!(role.as_str().parse::<ChatRole>().unwrap(), role);
        }
        assert!("tool".parse::<ChatRole>().is_err());
    }
}
