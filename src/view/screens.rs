//! Typed projections of the aggregate-backed screens

use crate::fetch::Endpoint;
use crate::models::{CategoryTotal, Profile, Summary, Transaction};

use super::ViewModel;

/// Dashboard: greeting, totals, category breakdown and recent activity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub profile: Profile,
    pub summary: Summary,
    pub recent: Vec<Transaction>,
    pub categories: Vec<CategoryTotal>,
    pub error: Option<String>,
}

impl DashboardView {
    /// Sub-requests making up one dashboard refresh
    pub fn endpoints() -> Vec<Endpoint> {
        vec![
            Endpoint::object("profile", "/auth/profile"),
            Endpoint::object("summary", "/expenses/summary"),
            Endpoint::list("recent", "/expenses/recent"),
            Endpoint::list("categories", "/expenses/categories"),
        ]
    }

    pub fn from_view(view: &ViewModel) -> Self {
        Self {
            profile: view.decode("profile"),
            summary: view.decode("summary"),
            recent: view.decode_list("recent"),
            categories: view.decode_list("categories"),
            error: view.error().map(str::to_string),
        }
    }

    /// Name to greet the user with
    pub fn greeting_name(&self) -> &str {
        if self.profile.username.is_empty() {
            "User"
        } else {
            &self.profile.username
        }
    }
}

/// Analytics: income vs expenses and the category breakdown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsView {
    pub summary: Summary,
    pub categories: Vec<CategoryTotal>,
    pub error: Option<String>,
}

impl AnalyticsView {
    pub fn endpoints() -> Vec<Endpoint> {
        vec![
            Endpoint::object("summary", "/expenses/summary"),
            Endpoint::list("categories", "/expenses/categories"),
        ]
    }

    pub fn from_view(view: &ViewModel) -> Self {
        Self {
            summary: view.decode("summary"),
            categories: view.decode_list("categories"),
            error: view.error().map(str::to_string),
        }
    }

    /// Share of total spending per category, largest first
    pub fn category_shares(&self) -> Vec<(String, f64)> {
        let total: f64 = self.categories.iter().map(|c| c.total).sum();
        let mut shares: Vec<_> = self
            .categories
            .iter()
            .map(|c| {
                let share = if total > 0.0 { c.total / total } else { 0.0 };
                (c.name.clone(), share)
            })
            .collect();
        shares.sort_by(|a, b| b.1.total_cmp(&a.1));
        shares
    }
}
