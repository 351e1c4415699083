//! Course event entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{CourseEvent, MultiDayPricing, PricingTier};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the course_events table.
#[derive(Debug, Clone, FromRow)]
pub struct CourseEventEntity {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub location: String,
    pub starts_on: NaiveDate,
    pub duration_days: i32,
    pub base_price: Option<f64>,
    pub multi_day_pricing: Option<Json<MultiDayPricing>>,
    pub pricing_tiers: Json<Vec<PricingTier>>,
    pub capacity: Option<i32>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CourseEventEntity> for CourseEvent {
    fn from(entity: CourseEventEntity) -> Self {
        Self {
            id: entity.id,
            slug: entity.slug,
            title: entity.title,
            location: entity.location,
            starts_on: entity.starts_on,
            duration_days: entity.duration_days,
            base_price: entity.base_price,
            multi_day_pricing: entity.multi_day_pricing.map(|Json(table)| table),
            pricing_tiers: entity.pricing_tiers.0,
            capacity: entity.capacity,
            is_published: entity.is_published,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_to_domain() {
        let now = Utc::now();
        let entity = CourseEventEntity {
            id: Uuid::new_v4(),
            slug: "implantology".to_string(),
            title: "Implantology Essentials".to_string(),
            location: "Leeds".to_string(),
            starts_on: NaiveDate::from_ymd_opt(2026, 11, 14).unwrap(),
            duration_days: 2,
            base_price: Some(1200.0),
            multi_day_pricing: Some(Json(MultiDayPricing {
                one: Some(700.0),
                two: None,
                three: None,
            })),
            pricing_tiers: Json(vec![]),
            capacity: Some(40),
            is_published: true,
            created_at: now,
            updated_at: now,
        };

        let event: CourseEvent = entity.into();
        assert_eq!(event.slug, "implantology");
        assert_eq!(event.multi_day_pricing.unwrap().one, Some(700.0));
        assert!(event.pricing_tiers.is_empty());
    }
}
