use crate::{
    database::MongoDB,
    models::{DashboardData, RecentActivity},
    services::{activity_service, auth_service::Claims, dashboard_service},
    utils::AppResult,
};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RecentActivitiesQuery {
    /// Number of activities to return (default 5, at most 50).
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Progress stats and latest activities", body = DashboardData),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_dashboard(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
) -> AppResult<HttpResponse> {
    log::debug!("📊 GET /api/dashboard - user: {}", claims.sub);
    let dashboard = dashboard_service::get_dashboard(&db, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/activities/recent",
    tag = "Dashboard",
    params(RecentActivitiesQuery),
    responses(
        (status = 200, description = "Newest activities first", body = [RecentActivity]),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn recent_activities(
    db: web::Data<MongoDB>,
    claims: web::ReqData<Claims>,
    query: web::Query<RecentActivitiesQuery>,
) -> AppResult<HttpResponse> {
    let activities = activity_service::recent(&db, &claims.sub, query.limit).await?;
    Ok(HttpResponse::Ok().json(activities))
}
