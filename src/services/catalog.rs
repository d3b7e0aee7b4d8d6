//! Service listings: create, search, read, edit and soft-delete.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{NewService, Service, ServiceFilter, ServiceUpdate, User};
use crate::error::{AppError, AppResult};
use crate::ports::Store;
use crate::validation::{
    validate_max_len, validate_price, validate_required, CATEGORY_MAX_LEN, DESCRIPTION_MAX_LEN,
    TITLE_MAX_LEN,
};

const SERVICE_NOT_FOUND: &str = "Servicio no encontrado";

#[derive(Debug, Clone, Default)]
pub struct CreateServiceInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub trueqq_price: Option<i64>,
    pub community_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, provider: &User, input: CreateServiceInput) -> AppResult<Service> {
        let missing = || AppError::Validation("Por favor completa todos los campos".to_string());

        validate_required("title", &input.title)?;
        validate_required("description", &input.description)?;
        validate_required("category", &input.category)?;
        let trueqq_price = input.trueqq_price.ok_or_else(missing)?;
        let community_id = input.community_id.ok_or_else(missing)?;

        let title = input.title.trim().to_string();
        let description = input.description.trim().to_string();
        let category = input.category.trim().to_string();
        validate_max_len("title", &title, TITLE_MAX_LEN)?;
        validate_max_len("description", &description, DESCRIPTION_MAX_LEN)?;
        validate_max_len("category", &category, CATEGORY_MAX_LEN)?;
        validate_price(trueqq_price)?;

        if self.store.find_community(community_id).await?.is_none() {
            return Err(AppError::NotFound("Comunidad no encontrada".to_string()));
        }

        let service = self
            .store
            .insert_service(&NewService {
                id: Uuid::new_v4(),
                title,
                description,
                category,
                trueqq_price,
                provider_id: provider.id,
                provider_name: provider.name.clone(),
                community_id,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            service_id = %service.id,
            provider_id = %provider.id,
            price = service.trueqq_price,
            "service created"
        );
        Ok(service)
    }

    pub async fn search(&self, filter: &ServiceFilter) -> AppResult<Vec<Service>> {
        Ok(self.store.search_services(filter).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Service> {
        self.store
            .find_service(id)
            .await?
            .ok_or_else(|| AppError::NotFound(SERVICE_NOT_FOUND.to_string()))
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, update: ServiceUpdate) -> AppResult<Service> {
        let service = self.get(id).await?;
        if service.provider_id != user_id {
            return Err(AppError::Forbidden(
                "No tienes permiso para editar este servicio".to_string(),
            ));
        }

        let update = normalize_update(update)?;
        Ok(self.store.update_service(id, &update).await?)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let service = self.get(id).await?;
        if service.provider_id != user_id {
            return Err(AppError::Forbidden(
                "No tienes permiso para eliminar este servicio".to_string(),
            ));
        }

        self.store.deactivate_service(id).await?;
        tracing::info!(service_id = %id, "service deactivated");
        Ok(())
    }
}

/// Trims provided text fields and checks them like creation does.
fn normalize_update(update: ServiceUpdate) -> AppResult<ServiceUpdate> {
    fn text(
        field: &'static str,
        value: Option<String>,
        max_len: usize,
    ) -> AppResult<Option<String>> {
        match value {
            None => Ok(None),
            Some(raw) => {
                let trimmed = raw.trim().to_string();
                validate_required(field, &trimmed)?;
                validate_max_len(field, &trimmed, max_len)?;
                Ok(Some(trimmed))
            }
        }
    }

    if let Some(price) = update.trueqq_price {
        validate_price(price)?;
    }

    Ok(ServiceUpdate {
        title: text("title", update.title, TITLE_MAX_LEN)?,
        description: text("description", update.description, DESCRIPTION_MAX_LEN)?,
        category: text("category", update.category, CATEGORY_MAX_LEN)?,
        trueqq_price: update.trueqq_price,
    })
}
