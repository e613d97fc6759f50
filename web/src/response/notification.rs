//! Listing response for `POST /notifications/search`.

use domain::notification::NotificationPage;
use domain::notifications::Model as NotificationModel;
use serde::Serialize;
use utoipa::ToSchema;

/// One page of a subscriber's notifications, newest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationPageResponse {
    pub notifications: Vec<NotificationModel>,
    /// Number of notifications matching the search across all pages
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl From<NotificationPage> for NotificationPageResponse {
    fn from(page: NotificationPage) -> Self {
        Self {
            notifications: page.notifications,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}
