use serde::{Deserialize, Serialize};

use super::RecentActivity;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub completed_items: u64,
    pub total_items: u64,
    /// Whole percent, 0 to 100
    pub progress: u32,
    /// Consecutive days with at least one activity
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: UserStats,
    pub recent_activities: Vec<RecentActivity>,
}
