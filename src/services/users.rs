//! # User Service
//!
//! Account management: signup with hashed credentials, the self-service
//! profile operations and the password flows (change, forgot, reset).
//! Plaintext passwords exist only transiently inside these calls; the
//! store only ever sees the Argon2 hash.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::auth::{
    generate_reset_token, hash_password, hash_token, reset_token_expiry, token_matches,
    verify_password, AuthError, PasswordPolicy,
};
use crate::mailer::{EmailSender, OutgoingEmail};
use crate::models::user::{
    ACTIVE_FIELD, EMAIL_FIELD, PASSWORD_CHANGED_AT_FIELD, PASSWORD_HASH_FIELD,
    RESET_EXPIRES_FIELD, RESET_TOKEN_FIELD,
};
use crate::models::{Model, User, ValidationError};
use crate::query::{Predicate, RequestParams};
use crate::resource::{CrudService, DeleteEnvelope, DocEnvelope, ListEnvelope, ResourceError};
use crate::services::errors::{ServiceError, ServiceResult};
use crate::store::{Database, ID_FIELD};

/// Fields a user may change on their own profile
const SELF_SERVICE_FIELDS: [&str; 3] = ["name", "email", "photo"];

/// Account operations over the users collection
pub struct UserService {
    crud: CrudService<User>,
    db: Arc<Database>,
    mailer: Arc<dyn EmailSender>,
    policy: PasswordPolicy,
}

impl UserService {
    pub fn new(db: Arc<Database>, mailer: Arc<dyn EmailSender>) -> ServiceResult<Self> {
        Ok(Self {
            crud: CrudService::new(Arc::clone(&db))?,
            db,
            mailer,
            policy: PasswordPolicy::default(),
        })
    }

    pub fn list(&self, params: &RequestParams) -> ServiceResult<ListEnvelope> {
        Ok(self.crud.list(params)?)
    }

    pub fn get(&self, id: &str) -> ServiceResult<DocEnvelope> {
        Ok(self.crud.get(id)?)
    }

    pub fn update(&self, id: &str, patch: Value) -> ServiceResult<DocEnvelope> {
        Ok(self.crud.update(id, patch)?)
    }

    pub fn remove(&self, id: &str) -> ServiceResult<DeleteEnvelope> {
        Ok(self.crud.remove(id)?)
    }

    /// Creates an account. The body carries `password` and
    /// `password_confirm`; both are removed before anything is stored
    /// and only the hash is kept. Sends the welcome mail; a failed send
    /// does not fail the signup, the account already exists.
    pub async fn signup(&self, body: Value) -> ServiceResult<DocEnvelope> {
        let mut body = match body {
            Value::Object(map) => map,
            _ => return Err(ValidationError::single("body", "must be a JSON object").into()),
        };
        let password = take_string(&mut body, "password")
            .ok_or_else(|| ValidationError::single("password", "is required"))?;
        let confirm = take_string(&mut body, "password_confirm")
            .ok_or_else(|| ValidationError::single("password_confirm", "is required"))?;
        if password != confirm {
            return Err(AuthError::PasswordMismatch.into());
        }
        self.policy.validate(&password)?;
        body.insert(
            PASSWORD_HASH_FIELD.to_string(),
            Value::String(hash_password(&password)?),
        );

        let envelope = self.crud.create(Value::Object(body))?;

        if let Some(email) = envelope.document().get(EMAIL_FIELD).and_then(Value::as_str) {
            let name = envelope
                .document()
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let welcome = OutgoingEmail::Welcome {
                user_email: email.to_string(),
                user_name: name.to_string(),
            };
            if let Err(error) = self.mailer.send(welcome).await {
                warn!(%error, "welcome email failed");
            }
        }
        Ok(envelope)
    }

    /// Self-service profile update, restricted to name, email and
    /// photo. Password changes must go through `update_password`.
    pub fn update_me(&self, id: &str, body: Value) -> ServiceResult<DocEnvelope> {
        let body = match body {
            Value::Object(map) => map,
            _ => return Err(ValidationError::single("body", "must be a JSON object").into()),
        };
        if body.contains_key("password") || body.contains_key("password_confirm") {
            return Err(ServiceError::PasswordUpdateNotAllowed);
        }
        let mut patch = Map::new();
        for field in SELF_SERVICE_FIELDS {
            if let Some(value) = body.get(field) {
                patch.insert(field.to_string(), value.clone());
            }
        }
        Ok(self.crud.update(id, Value::Object(patch))?)
    }

    /// Soft-deletes the account: it stays stored but disappears from
    /// every ordinary read.
    pub fn deactivate_me(&self, id: &str) -> ServiceResult<DeleteEnvelope> {
        self.crud.get(id)?;
        let mut patch = Map::new();
        patch.insert(ACTIVE_FIELD.to_string(), Value::Bool(false));
        self.db
            .update(User::COLLECTION, id, &patch)?
            .ok_or(ResourceError::NotFound)?;
        Ok(DeleteEnvelope::new())
    }

    /// Changes the password of a live account after verifying the
    /// current one.
    pub async fn update_password(
        &self,
        id: &str,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> ServiceResult<DocEnvelope> {
        let doc = self
            .db
            .collection(User::COLLECTION)?
            .find_by_id(id)?
            .ok_or(ResourceError::NotFound)?;
        if !User::read_scope().iter().all(|p| p.matches(&doc)) {
            return Err(ResourceError::NotFound.into());
        }
        let stored = doc
            .get(PASSWORD_HASH_FIELD)
            .and_then(Value::as_str)
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(current, stored)? {
            return Err(AuthError::InvalidCredentials.into());
        }
        if new_password != confirm {
            return Err(AuthError::PasswordMismatch.into());
        }
        self.policy.validate(new_password)?;

        let envelope = self.crud.update(id, Value::Object(password_patch(new_password)?))?;
        self.notify_password_changed(envelope.document()).await;
        Ok(envelope)
    }

    /// Starts the forgot-password flow: issues a single-use token,
    /// stores its digest with a short expiry and mails the raw token. A
    /// failed send clears the token again and surfaces the error.
    pub async fn request_password_reset(&self, email: &str) -> ServiceResult<()> {
        let normalized = email.trim().to_lowercase();
        let users = self.db.collection(User::COLLECTION)?;
        let account = users
            .scan(&[Predicate::eq(EMAIL_FIELD, Value::String(normalized.clone()))])?
            .into_iter()
            .find(|doc| User::read_scope().iter().all(|p| p.matches(doc)))
            .ok_or(ServiceError::UnknownEmail)?;
        let id = document_id(&account)?;

        let token = generate_reset_token();
        let mut patch = Map::new();
        patch.insert(
            RESET_TOKEN_FIELD.to_string(),
            Value::String(hash_token(&token)),
        );
        patch.insert(
            RESET_EXPIRES_FIELD.to_string(),
            Value::String(reset_token_expiry().to_rfc3339()),
        );
        self.db
            .update(User::COLLECTION, &id, &patch)?
            .ok_or(ResourceError::NotFound)?;

        let mail = OutgoingEmail::PasswordReset {
            token,
            user_email: normalized,
        };
        if let Err(error) = self.mailer.send(mail).await {
            let mut clear = Map::new();
            clear.insert(RESET_TOKEN_FIELD.to_string(), Value::Null);
            clear.insert(RESET_EXPIRES_FIELD.to_string(), Value::Null);
            let _ = self.db.update(User::COLLECTION, &id, &clear);
            return Err(error.into());
        }
        Ok(())
    }

    /// Completes the forgot-password flow. The presented token is
    /// compared against stored digests in constant time; unknown and
    /// expired tokens fail with the same error.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm: &str,
    ) -> ServiceResult<DocEnvelope> {
        let users = self.db.collection(User::COLLECTION)?;
        let account = users
            .scan(&[])?
            .into_iter()
            .find(|doc| {
                doc.get(RESET_TOKEN_FIELD)
                    .and_then(Value::as_str)
                    .map(|digest| token_matches(token, digest))
                    .unwrap_or(false)
            })
            .ok_or(AuthError::InvalidToken)?;

        let expires = account
            .get(RESET_EXPIRES_FIELD)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok());
        match expires {
            Some(when) if when.with_timezone(&Utc) > Utc::now() => {}
            _ => return Err(AuthError::InvalidToken.into()),
        }

        if new_password != confirm {
            return Err(AuthError::PasswordMismatch.into());
        }
        self.policy.validate(new_password)?;

        let id = document_id(&account)?;
        let mut patch = password_patch(new_password)?;
        patch.insert(RESET_TOKEN_FIELD.to_string(), Value::Null);
        patch.insert(RESET_EXPIRES_FIELD.to_string(), Value::Null);
        let envelope = self.crud.update(&id, Value::Object(patch))?;
        self.notify_password_changed(envelope.document()).await;
        Ok(envelope)
    }

    async fn notify_password_changed(&self, doc: &Value) {
        if let Some(email) = doc.get(EMAIL_FIELD).and_then(Value::as_str) {
            let note = OutgoingEmail::PasswordChanged {
                user_email: email.to_string(),
            };
            if let Err(error) = self.mailer.send(note).await {
                warn!(%error, "password change notification failed");
            }
        }
    }
}

fn password_patch(new_password: &str) -> ServiceResult<Map<String, Value>> {
    let mut patch = Map::new();
    patch.insert(
        PASSWORD_HASH_FIELD.to_string(),
        Value::String(hash_password(new_password)?),
    );
    patch.insert(
        PASSWORD_CHANGED_AT_FIELD.to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    Ok(patch)
}

fn document_id(doc: &Value) -> ServiceResult<String> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| ResourceError::NotFound.into())
}

fn take_string(body: &mut Map<String, Value>, field: &str) -> Option<String> {
    match body.remove(field) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
