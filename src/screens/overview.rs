//! One-shot loads of the aggregate-backed screens
//!
//! For a live view use [`crate::poll::PollHandle`] with the same endpoints.

use crate::client::{ClientError, ClientResult};
use crate::fetch::{AggregateSource, Endpoint};
use crate::view::{AnalyticsView, DashboardView, ViewModel};

async fn load(source: &dyn AggregateSource, endpoints: &[Endpoint]) -> ClientResult<ViewModel> {
    let mut view = ViewModel::with_defaults(endpoints);
    view.begin_loading();

    match source.fetch_all(endpoints).await {
        Ok(aggregate) => {
            view.apply(1, endpoints, aggregate);
        }
        Err(ClientError::Unauthorized) => return Err(ClientError::Unauthorized),
        Err(e) => {
            view.fail(1, &e);
        }
    }
    Ok(view)
}

/// Load the dashboard. Only `Unauthorized` is returned as an error; other
/// failures end up in [`DashboardView::error`].
pub async fn load_dashboard(source: &dyn AggregateSource) -> ClientResult<DashboardView> {
    let view = load(source, &DashboardView::endpoints()).await?;
    Ok(DashboardView::from_view(&view))
}

pub async fn load_analytics(source: &dyn AggregateSource) -> ClientResult<AnalyticsView> {
    let view = load(source, &AnalyticsView::endpoints()).await?;
    Ok(AnalyticsView::from_view(&view))
}
