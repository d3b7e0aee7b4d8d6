use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Community, MemberSummary, Service, ServiceFilter};
use crate::error::{AppError, AppResult};
use crate::ports::Store;

const COMMUNITY_NOT_FOUND: &str = "Comunidad no encontrada";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityDetail {
    #[serde(flatten)]
    pub community: Community,
    pub members: Vec<MemberSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinOutcome {
    pub community_id: Uuid,
    pub community_name: String,
    pub members_count: i64,
}

#[derive(Clone)]
pub struct CommunityService {
    store: Arc<dyn Store>,
}

impl CommunityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<Community>> {
        Ok(self.store.list_communities().await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<CommunityDetail> {
        let community = self
            .store
            .find_community(id)
            .await?
            .ok_or_else(|| AppError::NotFound(COMMUNITY_NOT_FOUND.to_string()))?;
        let members = self.store.community_members(id).await?;
        Ok(CommunityDetail { community, members })
    }

    pub async fn join(&self, id: Uuid, user_id: Uuid) -> AppResult<JoinOutcome> {
        let community = self
            .store
            .find_community(id)
            .await?
            .ok_or_else(|| AppError::NotFound(COMMUNITY_NOT_FOUND.to_string()))?;
        let members_count = self.store.join_community(id, user_id).await?;

        tracing::info!(community_id = %id, user_id = %user_id, members_count, "user joined community");

        Ok(JoinOutcome {
            community_id: community.id,
            community_name: community.name,
            members_count,
        })
    }

    /// Active listings of the community, newest first. Unknown ids yield an empty list.
    pub async fn services(&self, id: Uuid) -> AppResult<Vec<Service>> {
        let filter = ServiceFilter {
            community_id: Some(id),
            ..ServiceFilter::default()
        };
        Ok(self.store.search_services(&filter).await?)
    }
}
