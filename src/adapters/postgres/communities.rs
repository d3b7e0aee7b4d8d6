use async_trait::async_trait;
use uuid::Uuid;

use super::rows::{CommunityRow, COMMUNITY_COLUMNS};
use super::{is_foreign_key_violation, is_unique_violation, PostgresStore};
use crate::domain::{Community, MemberSummary, NewCommunity, RuleViolation};
use crate::ports::{CommunityRepository, RepositoryError, RepositoryResult};

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    name: String,
    email: String,
}

#[async_trait]
impl CommunityRepository for PostgresStore {
    async fn list_communities(&self) -> RepositoryResult<Vec<Community>> {
        let rows = sqlx::query_as::<_, CommunityRow>(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities c WHERE c.is_active = TRUE ORDER BY c.name"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(CommunityRow::into_domain).collect())
    }

    async fn find_community(&self, id: Uuid) -> RepositoryResult<Option<Community>> {
        let row = sqlx::query_as::<_, CommunityRow>(&format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(CommunityRow::into_domain))
    }

    async fn community_members(&self, id: Uuid) -> RepositoryResult<Vec<MemberSummary>> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT u.id, u.name, u.email
            FROM community_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.community_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MemberSummary {
                id: r.id,
                name: r.name,
                email: r.email,
            })
            .collect())
    }

    async fn join_community(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<i64> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("INSERT INTO community_members (community_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Rule(RuleViolation::AlreadyMember)
                } else if is_foreign_key_violation(&e) {
                    RepositoryError::NotFound(format!("community {}", id))
                } else {
                    RepositoryError::from(e)
                }
            })?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM community_members WHERE community_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(count)
    }

    async fn communities_of_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Community>> {
        let rows = sqlx::query_as::<_, CommunityRow>(&format!(
            r#"
            SELECT {COMMUNITY_COLUMNS}
            FROM communities c
            JOIN community_members cm ON cm.community_id = c.id
            WHERE cm.user_id = $1
            ORDER BY cm.joined_at
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(CommunityRow::into_domain).collect())
    }

    async fn upsert_community(&self, community: &NewCommunity) -> RepositoryResult<Community> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO communities (id, name, description, icon, color)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE
                SET description = EXCLUDED.description,
                    icon = EXCLUDED.icon,
                    color = EXCLUDED.color
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&community.name)
        .bind(&community.description)
        .bind(&community.icon)
        .bind(&community.color)
        .fetch_one(self.pool())
        .await?;

        self.find_community(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("community {}", id)))
    }
}
