use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Completion,
    Practice,
    Exam,
}

/// Activity as stored in the `activities` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<String>,
    pub timestamp: BsonDateTime,
}

impl ActivityDocument {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp.timestamp_millis()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RecentActivity {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<String>,
}

impl From<ActivityDocument> for RecentActivity {
    fn from(doc: ActivityDocument) -> Self {
        let timestamp = doc.occurred_at().to_rfc3339();
        Self {
            id: doc.id.to_hex(),
            activity_type: doc.activity_type,
            title: doc.title,
            timestamp,
            details: doc.details,
        }
    }
}
