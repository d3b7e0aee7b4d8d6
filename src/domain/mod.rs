//! Framework-agnostic marketplace entities and the business rules that
//! guard them.

pub mod community;
pub mod message;
pub mod notification;
pub mod review;
pub mod service;
pub mod transaction;
pub mod user;

pub use community::{Community, CommunitySummary, MemberSummary, NewCommunity};
pub use message::{Message, NewMessage, HISTORY_LIMIT, MAX_MESSAGE_LEN};
pub use notification::{NewNotification, Notification, NotificationType};
pub use review::{average_rating, NewReview, Review};
pub use service::{NewService, Service, ServiceFilter, ServiceSummary, ServiceUpdate};
pub use transaction::{
    check_service_request, NewTransaction, Settlement, Transaction, TransactionDirection,
    TransactionStatus, TransactionTotals,
};
pub use user::{AccountType, NewUser, User};

use thiserror::Error;

/// A business rule refused the operation. Displayed text is user-facing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Este servicio no está disponible")]
    ServiceUnavailable,

    #[error("No puedes solicitar tu propio servicio")]
    SelfTransaction,

    #[error("No tienes suficientes Trueqqs. Necesitas {required} pero solo tienes {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Esta transacción ya está completada")]
    AlreadyCompleted,

    #[error("Solo puedes calificar transacciones completadas")]
    TransactionNotCompleted,

    #[error("Ya has calificado esta transacción")]
    DuplicateReview,

    #[error("Ya eres miembro de esta comunidad")]
    AlreadyMember,

    #[error("El email ya está registrado")]
    EmailTaken,
}

impl RuleViolation {
    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            RuleViolation::ServiceUnavailable => "service_unavailable",
            RuleViolation::SelfTransaction => "self_transaction",
            RuleViolation::InsufficientFunds { .. } => "insufficient_funds",
            RuleViolation::AlreadyCompleted => "already_completed",
            RuleViolation::TransactionNotCompleted => "transaction_not_completed",
            RuleViolation::DuplicateReview => "duplicate_review",
            RuleViolation::AlreadyMember => "already_member",
            RuleViolation::EmailTaken => "email_taken",
        }
    }
}
