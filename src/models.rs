//! Tracker entities
//!
//! Shapes decoded from the backend plus the client-side input types for
//! the mutation screens.
//!
//! Expense vs income is carried by an explicit [`TransactionKind`]. The
//! sign of `amount` never encodes it; amounts are magnitudes.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::client::{ClientError, ClientResult};

/// Categories offered for expenses
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food",
    "Transport",
    "Rent",
    "Entertainment",
    "Bills",
    "Shopping",
    "Health",
];

/// Categories offered for income
pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Investments",
    "Business",
    "Gift",
    "Other",
];

/// Whether money went out or came in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    /// Categories valid for this kind
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            TransactionKind::Expense => EXPENSE_CATEGORIES,
            TransactionKind::Income => INCOME_CATEGORIES,
        }
    }

    /// Kind implied by a category name, when the backend did not send one
    pub fn from_category(category: &str) -> Self {
        if INCOME_CATEGORIES
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
        {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        }
    }

    /// Collection path used when creating a transaction of this kind
    pub fn create_path(self) -> &'static str {
        match self {
            TransactionKind::Expense => "/expenses",
            TransactionKind::Income => "/income",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Expense => write!(f, "expense"),
            TransactionKind::Income => write!(f, "income"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" | "expenses" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            other => Err(format!("Unknown transaction type: {}", other)),
        }
    }
}

/// A transaction as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    /// Date as sent by the backend (ISO 8601, possibly with a time part)
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
}

impl Transaction {
    /// Explicit type if the backend sent one, otherwise derived from the category
    pub fn kind(&self) -> TransactionKind {
        self.kind
            .unwrap_or_else(|| TransactionKind::from_category(&self.category))
    }

    /// Unsigned amount
    pub fn magnitude(&self) -> f64 {
        self.amount.abs()
    }

    /// Calendar day of the transaction
    pub fn day(&self) -> Option<NaiveDate> {
        let day = self.date.get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Pre-filled input for the edit screen
    pub fn to_input(&self) -> Option<TransactionInput> {
        Some(TransactionInput {
            title: self.title.clone(),
            amount: self.magnitude(),
            kind: self.kind(),
            category: self.category.clone(),
            date: self.day()?,
            description: self.description.clone(),
        })
    }
}

// Form-backed clients have been seen to store amounts as strings.
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n.as_f64().unwrap_or_default()),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!(
            "invalid amount: {}",
            other
        ))),
    }
}

/// Input for creating or updating a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionInput {
    pub title: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub description: Option<String>,
}

impl TransactionInput {
    /// Check the input before it is sent anywhere
    pub fn validate(&self) -> ClientResult<()> {
        if self.title.trim().is_empty() {
            return Err(ClientError::validation("Title is required"));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ClientError::validation("Amount must be a positive number"));
        }
        if !self.kind.categories().contains(&self.category.as_str()) {
            return Err(ClientError::validation(format!(
                "Category '{}' is not valid for {}; choose one of: {}",
                self.category,
                self.kind,
                self.kind.categories().join(", ")
            )));
        }
        Ok(())
    }

    /// JSON request body
    pub fn to_body(&self) -> Value {
        json!({
            "title": self.title.trim(),
            "amount": self.amount,
            "category": self.category,
            "date": self.date.format("%Y-%m-%d").to_string(),
            "description": self.description.clone().unwrap_or_default(),
            "type": self.kind,
        })
    }
}

/// Income and expense totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub income: f64,
    #[serde(rename = "totalExpense", default, deserialize_with = "lenient_amount")]
    pub total_expense: f64,
}

impl Summary {
    pub fn balance(&self) -> f64 {
        self.income - self.total_expense
    }
}

/// Spending total for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde(rename = "_id")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: f64,
}

/// Account profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}
