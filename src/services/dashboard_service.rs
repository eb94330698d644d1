use crate::{
    database::{MongoDB, ROADMAP_ITEMS},
    models::{DashboardData, RecentActivity, RoadmapItemDocument, UserStats},
    utils::AppResult,
};
use chrono::{Duration, NaiveDate, Utc};
use mongodb::bson::doc;
use std::collections::BTreeSet;

use super::activity_service;

pub fn progress_percent(completed: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed.min(total) * 100 + total / 2) / total) as u32
}

/// Number of consecutive days with activity, counted back from `today`.
///
/// A streak survives until the end of the day after its last activity, so a
/// run ending yesterday still counts.
pub fn streak_days<I>(active_days: I, today: NaiveDate) -> u32
where
    I: IntoIterator<Item = NaiveDate>,
{
    let days: BTreeSet<NaiveDate> = active_days.into_iter().collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

pub async fn get_stats(db: &MongoDB, user_id: &str) -> AppResult<UserStats> {
    let items = db.collection::<RoadmapItemDocument>(ROADMAP_ITEMS);
    let total_items = items.count_documents(doc! { "user_id": user_id }).await?;
    let completed_items = items
        .count_documents(doc! { "user_id": user_id, "completed": true })
        .await?;

    let days = activity_service::active_days(db, user_id).await?;
    let streak = streak_days(days, Utc::now().date_naive());

    Ok(UserStats {
        completed_items,
        total_items,
        progress: progress_percent(completed_items, total_items),
        streak,
    })
}

pub async fn get_dashboard(db: &MongoDB, user_id: &str) -> AppResult<DashboardData> {
    let stats = get_stats(db, user_id).await?;
    let recent_activities: Vec<RecentActivity> =
        activity_service::recent(db, user_id, None).await?;

    Ok(DashboardData {
        stats,
        recent_activities,
    })
}
