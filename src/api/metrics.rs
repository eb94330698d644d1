use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static LOGINS: AtomicU64 = AtomicU64::new(0);
static SIGNUPS: AtomicU64 = AtomicU64::new(0);
static ROADMAPS_GENERATED: AtomicU64 = AtomicU64::new(0);
static GENERATION_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn increment_logins() {
    LOGINS.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_signups() {
    SIGNUPS.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_roadmaps_generated() {
    ROADMAPS_GENERATED.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_generation_failures() {
    GENERATION_FAILURES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub auth_logins_total: u64,
    pub auth_signups_total: u64,
    pub roadmaps_generated_total: u64,
    pub roadmap_generation_failures_total: u64,
}

impl MetricsResponse {
    fn snapshot() -> Self {
        Self {
            auth_logins_total: LOGINS.load(Ordering::Relaxed),
            auth_signups_total: SIGNUPS.load(Ordering::Relaxed),
            roadmaps_generated_total: ROADMAPS_GENERATED.load(Ordering::Relaxed),
            roadmap_generation_failures_total: GENERATION_FAILURES.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition.
    fn render(&self) -> String {
        let counters = [
            ("auth_logins_total", "Successful logins", self.auth_logins_total),
            ("auth_signups_total", "Accounts created", self.auth_signups_total),
            ("roadmaps_generated_total", "Roadmaps generated", self.roadmaps_generated_total),
            (
                "roadmap_generation_failures_total",
                "Roadmap generations that failed",
                self.roadmap_generation_failures_total,
            ),
        ];

        counters
            .iter()
            .map(|(name, help, value)| {
                format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "Counters in Prometheus text format", body = MetricsResponse)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::snapshot().render())
}
