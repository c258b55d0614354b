use crate::{
    entities::{user, User},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Input for account registration. The password is persisted as given;
/// credential hardening is outside this service's scope.
#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Account registration and credential checks
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Registers an account; duplicate email addresses are rejected
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::ValidationError(
                "A valid email address is required".to_string(),
            ));
        }
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Name is required".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(ServiceError::ValidationError(
                "Password is required".to_string(),
            ));
        }

        let existing = User::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict("User already exists".to_string()));
        }

        let user_id = Uuid::new_v4();
        let row = user::ActiveModel {
            id: Set(user_id),
            name: Set(input.name.trim().to_string()),
            email: Set(email),
            password: Set(input.password),
            phone: Set(input.phone.unwrap_or_default()),
            address: Set(input.address.unwrap_or_default()),
            created_at: Set(Utc::now()),
        };
        let model = row.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserRegistered(user_id))
            .await;

        info!("Registered user: {}", user_id);
        Ok(model)
    }

    /// Verifies credentials by direct comparison. Both unknown accounts and
    /// wrong passwords collapse into the same rejection.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<user::Model, ServiceError> {
        let user = User::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(&*self.db)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if user.password != password {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }
}
