use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_RATING: f64 = 5.0;

/// A listed offer of skill or labor, priced in Trueqqs.
///
/// `provider_name` is a snapshot taken when the listing was created; renaming
/// the provider later does not rewrite it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub trueqq_price: i64,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub community_id: Uuid,
    pub is_active: bool,
    pub rating: f64,
    pub reviews_count: i64,
    pub times_requested: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Case-insensitive substring match over title and description.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }

    pub fn matches(&self, filter: &ServiceFilter) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(category) = &filter.category {
            if &self.category != category {
                return false;
            }
        }
        if let Some(community) = filter.community_id {
            if self.community_id != community {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            if !self.matches_text(search) {
                return false;
            }
        }
        if let Some(min) = filter.min_price {
            if self.trueqq_price < min {
                return false;
            }
        }
        if let Some(max) = filter.max_price {
            if self.trueqq_price > max {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: Uuid,
    pub title: String,
    pub trueqq_price: i64,
}

impl From<&Service> for ServiceSummary {
    fn from(s: &Service) -> Self {
        Self {
            id: s.id,
            title: s.title.clone(),
            trueqq_price: s.trueqq_price,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub trueqq_price: i64,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub community_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl NewService {
    pub fn into_service(self) -> Service {
        Service {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            trueqq_price: self.trueqq_price,
            provider_id: self.provider_id,
            provider_name: self.provider_name,
            community_id: self.community_id,
            is_active: true,
            rating: DEFAULT_RATING,
            reviews_count: 0,
            times_requested: 0,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Partial edit of a listing. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ServiceUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub trueqq_price: Option<i64>,
}

impl ServiceUpdate {
    pub fn apply(&self, service: &mut Service) {
        if let Some(title) = &self.title {
            service.title = title.clone();
        }
        if let Some(description) = &self.description {
            service.description = description.clone();
        }
        if let Some(category) = &self.category {
            service.category = category.clone();
        }
        if let Some(price) = self.trueqq_price {
            service.trueqq_price = price;
        }
        service.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub category: Option<String>,
    pub community_id: Option<Uuid>,
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Service {
        NewService {
            id: Uuid::new_v4(),
            title: "Clases de guitarra".to_string(),
            description: "Acústica y eléctrica".to_string(),
            category: "Música".to_string(),
            trueqq_price: 120,
            provider_id: Uuid::new_v4(),
            provider_name: "Bea".to_string(),
            community_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
        .into_service()
    }

    #[test]
    fn test_new_listing_defaults() {
        let service = sample();
        assert!(service.is_active);
        assert_eq!(service.rating, DEFAULT_RATING);
        assert_eq!(service.times_requested, 0);
    }

    #[test]
    fn test_filter_text_is_case_insensitive() {
        let service = sample();
        let filter = ServiceFilter {
            search: Some("GUITARRA".to_string()),
            ..Default::default()
        };
        assert!(service.matches(&filter));
    }

    #[test]
    fn test_filter_price_bounds_are_inclusive() {
        let service = sample();
        let filter = ServiceFilter {
            min_price: Some(120),
            max_price: Some(120),
            ..Default::default()
        };
        assert!(service.matches(&filter));

        let filter = ServiceFilter {
            max_price: Some(119),
            ..Default::default()
        };
        assert!(!service.matches(&filter));
    }

    #[test]
    fn test_inactive_listing_never_matches() {
        let mut service = sample();
        service.is_active = false;
        assert!(!service.matches(&ServiceFilter::default()));
    }

    #[test]
    fn test_partial_update_keeps_untouched_fields() {
        let mut service = sample();
        let update = ServiceUpdate {
            trueqq_price: Some(80),
            ..Default::default()
        };
        update.apply(&mut service);
        assert_eq!(service.trueqq_price, 80);
        assert_eq!(service.title, "Clases de guitarra");
    }
}
