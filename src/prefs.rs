//! Display preferences
//!
//! Theme and currency, each stored on its own key in the local store.
//! They only affect how amounts are shown and are never sent to the backend.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::store::{LocalStore, StoreResult};

const THEME_KEY: &str = "theme";
const CURRENCY_KEY: &str = "currency";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

/// Currency symbol used when rendering amounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Currency {
    #[default]
    Rupee,
    Dollar,
    Euro,
    Pound,
    Yen,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Rupee,
        Currency::Dollar,
        Currency::Euro,
        Currency::Pound,
        Currency::Yen,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Rupee => "₹",
            Currency::Dollar => "$",
            Currency::Euro => "€",
            Currency::Pound => "£",
            Currency::Yen => "¥",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Rupee => "INR",
            Currency::Dollar => "USD",
            Currency::Euro => "EUR",
            Currency::Pound => "GBP",
            Currency::Yen => "JPY",
        }
    }

    /// Render an amount, e.g. `₹1,23,456` or `-$1,200.50`
    pub fn format(self, amount: f64) -> String {
        let sign = if amount < 0.0 { "-" } else { "" };
        let cents = (amount.abs() * 100.0).round() as u64;
        let (whole, frac) = (cents / 100, cents % 100);

        let grouped = match self {
            Currency::Rupee => group_indian(whole),
            _ => group_thousands(whole),
        };

        if frac == 0 {
            format!("{}{}{}", sign, self.symbol(), grouped)
        } else {
            format!("{}{}{}.{:02}", sign, self.symbol(), grouped, frac)
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.symbol() == s || c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown currency: {}", s))
    }
}

// 1234567 -> "1,234,567"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// 1234567 -> "12,34,567"
fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut out = String::new();
    for (i, ch) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push(',');
    out.push_str(tail);
    out
}

/// Persisted theme and currency
#[derive(Debug, Clone)]
pub struct Preferences {
    store: Arc<LocalStore>,
}

impl Preferences {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    /// Stored theme; unset or unreadable values fall back to light
    pub fn theme(&self) -> Theme {
        self.read(THEME_KEY)
    }

    pub fn set_theme(&self, theme: Theme) -> StoreResult<()> {
        self.store.set(THEME_KEY, &theme.to_string())
    }

    pub fn toggle_theme(&self) -> StoreResult<Theme> {
        let next = self.theme().toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Stored currency; unset or unreadable values fall back to ₹
    pub fn currency(&self) -> Currency {
        self.read(CURRENCY_KEY)
    }

    pub fn set_currency(&self, currency: Currency) -> StoreResult<()> {
        self.store.set(CURRENCY_KEY, currency.symbol())
    }

    fn read<T: FromStr + Default>(&self, key: &str) -> T {
        self.store
            .get(key)
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}
