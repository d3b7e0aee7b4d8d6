use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{ServiceFilter, ServiceUpdate};
use crate::error::{AppError, AppResult};
use crate::handlers::{data_response, list_response, message_response, mutation_response, ApiJson, ApiPath};
use crate::middleware::auth::AuthUser;
use crate::services::catalog::CreateServiceInput;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub trueqq_price: Option<i64>,
    #[serde(alias = "communityId")]
    pub community: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub trueqq_price: Option<i64>,
}

/// Raw query string values; parsed by [`ServiceQuery::into_filter`] so bad
/// input gets the error envelope instead of a bare rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceQuery {
    pub category: Option<String>,
    pub community: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServiceQuery {
    pub fn into_filter(self) -> AppResult<ServiceFilter> {
        let community_id = non_empty(self.community)
            .map(|raw| {
                raw.parse::<Uuid>()
                    .map_err(|_| AppError::Validation("Comunidad inválida".to_string()))
            })
            .transpose()?;

        let price = |raw: Option<String>| -> AppResult<Option<i64>> {
            non_empty(raw)
                .map(|v| {
                    v.parse::<i64>()
                        .map_err(|_| AppError::Validation("Rango de precio inválido".to_string()))
                })
                .transpose()
        };

        Ok(ServiceFilter {
            category: non_empty(self.category),
            community_id,
            search: non_empty(self.search),
            min_price: price(self.min_price)?,
            max_price: price(self.max_price)?,
        })
    }
}

pub async fn create_service(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CreateServiceRequest>,
) -> AppResult<Response> {
    let service = state
        .services
        .catalog
        .create(
            &user,
            CreateServiceInput {
                title: body.title,
                description: body.description,
                category: body.category,
                trueqq_price: body.trueqq_price,
                community_id: body.community,
            },
        )
        .await?;

    Ok(mutation_response(
        StatusCode::CREATED,
        "Servicio creado exitosamente",
        service,
    ))
}

pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> AppResult<Json<Value>> {
    let filter = query.into_filter()?;
    let services = state.services.catalog.search(&filter).await?;
    Ok(list_response(&services))
}

pub async fn get_service(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let service = state.services.catalog.get(id).await?;
    Ok(data_response(service))
}

pub async fn update_service(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateServiceRequest>,
) -> AppResult<Response> {
    let update = ServiceUpdate {
        title: body.title,
        description: body.description,
        category: body.category,
        trueqq_price: body.trueqq_price,
    };
    let service = state.services.catalog.update(user.id, id, update).await?;

    Ok(mutation_response(
        StatusCode::OK,
        "Servicio actualizado exitosamente",
        service,
    ))
}

pub async fn delete_service(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    state.services.catalog.delete(user.id, id).await?;
    Ok(message_response("Servicio eliminado exitosamente"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_values_are_ignored() {
        let filter = ServiceQuery {
            category: Some("  ".to_string()),
            search: Some("".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();

        assert!(filter.category.is_none());
        assert!(filter.search.is_none());
        assert!(filter.min_price.is_none());
    }

    #[test]
    fn test_query_parses_prices_and_community() {
        let community = Uuid::new_v4();
        let filter = ServiceQuery {
            community: Some(community.to_string()),
            min_price: Some("10".to_string()),
            max_price: Some("200".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();

        assert_eq!(filter.community_id, Some(community));
        assert_eq!(filter.min_price, Some(10));
        assert_eq!(filter.max_price, Some(200));
    }

    #[test]
    fn test_query_rejects_bad_values() {
        let bad_price = ServiceQuery {
            min_price: Some("mucho".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_price.into_filter(), Err(AppError::Validation(_))));

        let bad_community = ServiceQuery {
            community: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(bad_community.into_filter(), Err(AppError::Validation(_))));
    }
}
