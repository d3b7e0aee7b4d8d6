use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_ICON: &str = "🏘️";
pub const DEFAULT_COLOR: &str = "#8B5CF6";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub members_count: i64,
    pub services_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySummary {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
}

impl From<&Community> for CommunitySummary {
    fn from(c: &Community) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            icon: c.icon.clone(),
            color: c.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
}

impl NewCommunity {
    pub fn new(name: &str, description: &str, icon: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            icon: if icon.is_empty() { DEFAULT_ICON } else { icon }.to_string(),
            color: if color.is_empty() { DEFAULT_COLOR } else { color }.to_string(),
        }
    }
}

/// The communities every fresh deployment starts with.
pub fn default_communities() -> Vec<NewCommunity> {
    vec![
        NewCommunity::new("Deportes & Fitness", "Clases, entrenamiento, coaching deportivo", "💪", "#EF4444"),
        NewCommunity::new("Tecnología", "Reparaciones, desarrollo, soporte técnico", "💻", "#3B82F6"),
        NewCommunity::new("Arte & Creatividad", "Diseño, ilustración, fotografía, manualidades", "🎨", "#EC4899"),
        NewCommunity::new("Educación", "Clases, tutorías, mentorías", "📚", "#8B5CF6"),
        NewCommunity::new("Música", "Clases de instrumentos, producción, composición", "🎵", "#F59E0B"),
        NewCommunity::new("Hogar & Reparaciones", "Plomería, electricidad, carpintería", "🔧", "#10B981"),
        NewCommunity::new("Idiomas", "Clases y práctica de idiomas", "🗣️", "#06B6D4"),
        NewCommunity::new("Bienestar", "Yoga, meditación, terapias alternativas", "🧘", "#A855F7"),
    ]
}
