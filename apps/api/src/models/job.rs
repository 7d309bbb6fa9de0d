use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::matching::types::JobDescriptor;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: String,
    /// `REAL[]`; NULL when the embedding call failed or never ran.
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl From<JobRow> for JobDescriptor {
    fn from(row: JobRow) -> Self {
        JobDescriptor {
            title: row.title,
            description: row.description,
            embedding: row.embedding,
        }
    }
}
