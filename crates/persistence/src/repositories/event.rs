//! Repository for course event database operations.

use chrono::NaiveDate;
use domain::models::{MultiDayPricing, PricingTier};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CourseEventEntity;
use crate::metrics::QueryTimer;

const EVENT_COLUMNS: &str = "id, slug, title, location, starts_on, duration_days, base_price, \
     multi_day_pricing, pricing_tiers, capacity, is_published, created_at, updated_at";

/// Input for creating a course event.
#[derive(Debug, Clone)]
pub struct NewCourseEvent {
    pub slug: String,
    pub title: String,
    pub location: String,
    pub starts_on: NaiveDate,
    pub duration_days: i32,
    pub base_price: Option<f64>,
    pub multi_day_pricing: Option<MultiDayPricing>,
    pub pricing_tiers: Vec<PricingTier>,
    pub capacity: Option<i32>,
    pub is_published: bool,
}

/// Repository for course event operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists published events, soonest first.
    pub async fn list_published(&self) -> Result<Vec<CourseEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_published_events");
        let result = sqlx::query_as::<_, CourseEventEntity>(&format!(
            "SELECT {} FROM course_events WHERE is_published = true ORDER BY starts_on ASC",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Finds a published event by slug.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<CourseEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_slug");
        let result = sqlx::query_as::<_, CourseEventEntity>(&format!(
            "SELECT {} FROM course_events WHERE slug = $1 AND is_published = true",
            EVENT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Finds an event by ID, published or not.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CourseEventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, CourseEventEntity>(&format!(
            "SELECT {} FROM course_events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Creates an event.
    pub async fn create(&self, event: &NewCourseEvent) -> Result<CourseEventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let result = sqlx::query_as::<_, CourseEventEntity>(&format!(
            r#"
            INSERT INTO course_events (
                slug, title, location, starts_on, duration_days, base_price,
                multi_day_pricing, pricing_tiers, capacity, is_published
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(&event.slug)
        .bind(&event.title)
        .bind(&event.location)
        .bind(event.starts_on)
        .bind(event.duration_days)
        .bind(event.base_price)
        .bind(event.multi_day_pricing.as_ref().map(Json))
        .bind(Json(&event.pricing_tiers))
        .bind(event.capacity)
        .bind(event.is_published)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}
