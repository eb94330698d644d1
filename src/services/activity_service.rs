use crate::{
    database::{MongoDB, ACTIVITIES},
    models::{ActivityDocument, ActivityType, RecentActivity},
    utils::AppResult,
};
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};

pub const DEFAULT_RECENT_LIMIT: i64 = 5;
pub const MAX_RECENT_LIMIT: i64 = 50;

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT)
}

pub async fn record(
    db: &MongoDB,
    user_id: &str,
    activity_type: ActivityType,
    title: String,
    details: Option<String>,
) -> AppResult<()> {
    let activity = ActivityDocument {
        id: ObjectId::new(),
        user_id: user_id.to_string(),
        activity_type,
        title,
        details,
        timestamp: BsonDateTime::now(),
    };

    db.collection::<ActivityDocument>(ACTIVITIES)
        .insert_one(&activity)
        .await?;
    log::debug!("📝 Recorded {:?} activity for user {}", activity_type, user_id);
    Ok(())
}

/// Newest first.
pub async fn list_documents(db: &MongoDB, user_id: &str, limit: i64) -> AppResult<Vec<ActivityDocument>> {
    let cursor = db
        .collection::<ActivityDocument>(ACTIVITIES)
        .find(doc! { "user_id": user_id })
        .sort(doc! { "timestamp": -1 })
        .limit(limit)
        .await?;

    let documents: Vec<ActivityDocument> = cursor.try_collect().await?;
    Ok(documents)
}

/// Distinct UTC calendar days with at least one activity, one row per day.
pub async fn active_days(db: &MongoDB, user_id: &str) -> AppResult<Vec<NaiveDate>> {
    let pipeline = vec![
        doc! { "$match": { "user_id": user_id } },
        doc! { "$group": { "_id": {
            "$dateToString": { "format": "%Y-%m-%d", "date": "$timestamp", "timezone": "UTC" }
        } } },
    ];

    let rows: Vec<Document> = db
        .collection::<ActivityDocument>(ACTIVITIES)
        .aggregate(pipeline)
        .await?
        .try_collect()
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| row.get_str("_id").ok())
        .filter_map(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .collect())
}

pub async fn recent(db: &MongoDB, user_id: &str, limit: Option<i64>) -> AppResult<Vec<RecentActivity>> {
    let documents = list_documents(db, user_id, clamp_limit(limit)).await?;
    Ok(documents.into_iter().map(RecentActivity::from).collect())
}
