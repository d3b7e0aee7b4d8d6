use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::rows::{ServiceRow, SERVICE_COLUMNS};
use super::{is_foreign_key_violation, like_pattern, PostgresStore};
use crate::domain::{NewService, Service, ServiceFilter, ServiceUpdate};
use crate::ports::{RepositoryError, RepositoryResult, ServiceRepository};

fn service_not_found(id: Uuid) -> RepositoryError {
    RepositoryError::NotFound(format!("service {}", id))
}

#[async_trait]
impl ServiceRepository for PostgresStore {
    async fn insert_service(&self, service: &NewService) -> RepositoryResult<Service> {
        let mut tx = self.pool().begin().await?;

        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            r#"
            INSERT INTO services (
                id, title, description, category, trueqq_price,
                provider_id, provider_name, community_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service.id)
        .bind(&service.title)
        .bind(&service.description)
        .bind(&service.category)
        .bind(service.trueqq_price)
        .bind(service.provider_id)
        .bind(&service.provider_name)
        .bind(service.community_id)
        .bind(service.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                RepositoryError::NotFound(format!("community {}", service.community_id))
            } else {
                RepositoryError::from(e)
            }
        })?;

        sqlx::query("UPDATE communities SET services_count = services_count + 1 WHERE id = $1")
            .bind(service.community_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into_domain())
    }

    async fn find_service(&self, id: Uuid) -> RepositoryResult<Option<Service>> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(ServiceRow::into_domain))
    }

    async fn search_services(&self, filter: &ServiceFilter) -> RepositoryResult<Vec<Service>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active = TRUE"
        ));

        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(community_id) = filter.community_id {
            query.push(" AND community_id = ").push_bind(community_id);
        }
        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(min) = filter.min_price {
            query.push(" AND trueqq_price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            query.push(" AND trueqq_price <= ").push_bind(max);
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<ServiceRow>()
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(ServiceRow::into_domain).collect())
    }

    async fn update_service(&self, id: Uuid, update: &ServiceUpdate) -> RepositoryResult<Service> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            r#"
            UPDATE services SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                trueqq_price = COALESCE($5, trueqq_price),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.category)
        .bind(update.trueqq_price)
        .fetch_optional(self.pool())
        .await?;

        row.map(ServiceRow::into_domain)
            .ok_or_else(|| service_not_found(id))
    }

    async fn deactivate_service(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE services SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(service_not_found(id));
        }
        Ok(())
    }

    async fn set_service_rating(&self, id: Uuid, rating: f64, reviews_count: i64) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE services SET rating = $2, reviews_count = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(rating)
        .bind(reviews_count)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(service_not_found(id));
        }
        Ok(())
    }

    async fn services_of_provider(&self, provider_id: Uuid) -> RepositoryResult<Vec<Service>> {
        let rows = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE provider_id = $1 ORDER BY created_at"
        ))
        .bind(provider_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(ServiceRow::into_domain).collect())
    }
}
