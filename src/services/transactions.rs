//! Service requests (the balance transfer), transaction reads, completion
//! and per-user statistics.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    Message, NewNotification, HISTORY_LIMIT, NotificationType, RuleViolation, Transaction,
    TransactionDirection, TransactionStatus, User,
};
use crate::error::{AppError, AppResult};
use crate::ports::{RepositoryError, Store};
use crate::services::notifications::Notifier;

const TRANSACTION_NOT_FOUND: &str = "Transacción no encontrada";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutcome {
    pub transaction: Transaction,
    pub new_balance: i64,
    pub trueqqs_transferred: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub total_sent: i64,
    pub total_received: i64,
    pub sent_count: i64,
    pub received_count: i64,
    pub current_balance: i64,
}

#[derive(Clone)]
pub struct TransactionService {
    store: Arc<dyn Store>,
    notifier: Notifier,
}

impl TransactionService {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Charges `client` the listing's current price and credits its provider.
    /// Every rule is re-checked inside the store's atomic unit.
    pub async fn request_service(&self, client: &User, service_id: Uuid) -> AppResult<RequestOutcome> {
        let settlement = self
            .store
            .settle_service_request(service_id, client.id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => {
                    AppError::NotFound("Servicio no encontrado".to_string())
                }
                other => other.into(),
            })?;

        let tx = &settlement.transaction;
        tracing::info!(
            transaction_id = %tx.id,
            service_id = %tx.service_id,
            client_id = %tx.client_id,
            provider_id = %tx.provider_id,
            amount = tx.trueqq_amount,
            "service requested"
        );

        self.notifier.emit(
            NewNotification::new(
                tx.provider_id,
                NotificationType::ServiceRequest,
                "Nueva solicitud de servicio",
                format!("{} solicitó tu servicio \"{}\"", tx.client_name, tx.service_title),
            )
            .with_service(tx.service_id)
            .with_transaction(tx.id),
        );

        Ok(RequestOutcome {
            new_balance: settlement.client_balance,
            trueqqs_transferred: tx.trueqq_amount,
            transaction: settlement.transaction,
        })
    }

    async fn find(&self, id: Uuid) -> AppResult<Transaction> {
        self.store
            .find_transaction(id)
            .await?
            .ok_or_else(|| AppError::NotFound(TRANSACTION_NOT_FOUND.to_string()))
    }

    /// Participants only.
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> AppResult<Transaction> {
        let tx = self.find(id).await?;
        if !tx.is_participant(user_id) {
            return Err(AppError::Forbidden(
                "No tienes permiso para ver esta transacción".to_string(),
            ));
        }
        Ok(tx)
    }

    pub async fn list(&self, user_id: Uuid, direction: TransactionDirection) -> AppResult<Vec<Transaction>> {
        Ok(self.store.list_transactions(user_id, direction).await?)
    }

    /// Provider only. Completing twice is a rule violation.
    pub async fn complete(&self, user_id: Uuid, id: Uuid) -> AppResult<Transaction> {
        let tx = self.find(id).await?;
        if tx.provider_id != user_id {
            return Err(AppError::Forbidden(
                "Solo el proveedor puede marcar la transacción como completada".to_string(),
            ));
        }
        if tx.status == TransactionStatus::Completed {
            return Err(RuleViolation::AlreadyCompleted.into());
        }

        let tx = self.store.complete_transaction(id, Utc::now()).await?;
        tracing::info!(transaction_id = %tx.id, "transaction completed");

        self.notifier.emit(
            NewNotification::new(
                tx.client_id,
                NotificationType::TransactionComplete,
                "Transacción completada",
                format!("{} marcó \"{}\" como completado", tx.provider_name, tx.service_title),
            )
            .with_service(tx.service_id)
            .with_transaction(tx.id),
        );

        Ok(tx)
    }

    pub async fn summary(&self, user_id: Uuid) -> AppResult<TransactionSummary> {
        let totals = self.store.transaction_totals(user_id).await?;
        let current_balance = self
            .store
            .find_user(user_id)
            .await?
            .map(|u| u.trueqq_balance)
            .ok_or_else(|| AppError::NotFound("Usuario no encontrado".to_string()))?;

        Ok(TransactionSummary {
            total_sent: totals.total_sent,
            total_received: totals.total_received,
            sent_count: totals.sent_count,
            received_count: totals.received_count,
            current_balance,
        })
    }

    /// Last 100 chat messages of a transaction, oldest first. Participants only.
    pub async fn message_history(&self, user_id: Uuid, id: Uuid) -> AppResult<Vec<Message>> {
        let tx = self.find(id).await?;
        if !tx.is_participant(user_id) {
            return Err(AppError::Forbidden(
                "No tienes permiso para ver estos mensajes".to_string(),
            ));
        }
        Ok(self.store.recent_messages(id, HISTORY_LIMIT).await?)
    }
}
