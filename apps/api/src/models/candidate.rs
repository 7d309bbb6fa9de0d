use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::matching::types::{CandidateProfile, Location};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    pub skills: Vec<String>,
    pub total_experience_months: Option<i32>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateProfile {
    fn from(row: CandidateRow) -> Self {
        let location = match (row.city, row.country) {
            (None, None) => None,
            (city, country) => Some(Location {
                city: city.unwrap_or_default(),
                country: country.unwrap_or_default(),
            }),
        };

        CandidateProfile {
            id: Some(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            current_title: row.current_title.unwrap_or_default(),
            current_company: row.current_company.unwrap_or_default(),
            skills: row.skills,
            total_experience_months: row.total_experience_months,
            location,
            embedding: row.embedding,
        }
    }
}
