//! Register User Use Case
//!
//! Creates a principal with exactly one role. Creation and role grant are a
//! single commit, so a user never exists without the role the caller asked for.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::events::UserRegistered;
use super::{load_manager_tier, FAILED_TO_ASSIGN_ROLE};
use crate::auth::PasswordService;
use crate::details;
use crate::principal::{Principal, PrincipalRepository};
use crate::role::Role;
use crate::store::StoreRepository;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};

pub const EMAIL_REQUIRED: &str = "Email address is required.";
pub const EMAIL_FORMAT: &str = "Invalid email address format.";
pub const FIRST_NAME_REQUIRED: &str = "First name is required.";
pub const LAST_NAME_REQUIRED: &str = "Last name is required.";
pub const USER_NAME_REQUIRED: &str = "Username is required.";
pub const PASSWORDS_DIFFER: &str = "Password and confirmation password do not match.";
pub const STORE_ID_REQUIRED: &str = "Store ID is required to fill for staff";
pub const STORE_ID_NOT_ZERO: &str = "StoreId cannot be 0";
pub const USER_REGISTERED: &str = "User was registered!";
pub const ROLE_DEFAULTED: &str = "The selected role does not exist, the default role was assigned: Customer";

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
}

fn is_valid_email(email: &str) -> bool {
    email_pattern().is_some_and(|p| p.is_match(email))
}

fn default_selected_role() -> String {
    Role::Customer.name().to_string()
}

/// Registration request body. Passwords never reach the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserCommand {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub store_id: Option<i32>,
    /// Role name; unknown names fall back to Customer
    #[serde(default = "default_selected_role")]
    pub selected_role: String,
}

impl RegisterUserCommand {
    /// Field rules, every failure collected in rule order.
    pub fn validate(&self, password_service: &PasswordService) -> Vec<String> {
        let mut errors = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(EMAIL_REQUIRED.to_string());
        } else if !is_valid_email(email) {
            errors.push(EMAIL_FORMAT.to_string());
        }

        if self.first_name.trim().is_empty() {
            errors.push(FIRST_NAME_REQUIRED.to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.push(LAST_NAME_REQUIRED.to_string());
        }

        if let Err(password_errors) = password_service.policy().validate(&self.password) {
            errors.extend(password_errors);
        }
        if !self.password.is_empty() && self.confirm_password != self.password {
            errors.push(PASSWORDS_DIFFER.to_string());
        }

        if self.user_name.trim().is_empty() {
            errors.push(USER_NAME_REQUIRED.to_string());
        }

        if Role::from_name(&self.selected_role) == Some(Role::Staff) {
            match self.store_id {
                None => errors.push(STORE_ID_REQUIRED.to_string()),
                Some(0) => errors.push(STORE_ID_NOT_ZERO.to_string()),
                Some(_) => {}
            }
        }

        errors
    }
}

impl UserRegistered {
    /// Response text for the caller. A defaulted role is only recorded on the event.
    pub fn message(&self) -> &'static str {
        USER_REGISTERED
    }
}

pub struct RegisterUserUseCase {
    principals: Arc<dyn PrincipalRepository>,
    stores: Arc<dyn StoreRepository>,
    password_service: Arc<PasswordService>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl RegisterUserUseCase {
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        stores: Arc<dyn StoreRepository>,
        password_service: Arc<PasswordService>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            principals,
            stores,
            password_service,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: RegisterUserCommand, ctx: ExecutionContext) -> UseCaseResult<UserRegistered> {
        let errors = command.validate(&self.password_service);
        if !errors.is_empty() {
            return UseCaseResult::failure(invalid_registration(errors));
        }

        // A store link is only kept when the store exists
        let store_id = match command.store_id {
            Some(id) if id != 0 => match self.stores.exists(id).await {
                Ok(true) => Some(id),
                Ok(false) => {
                    warn!(store_id = id, "Registering user without unknown store");
                    None
                }
                Err(e) => return UseCaseResult::failure(UseCaseError::commit(format!("Failed to fetch store: {}", e))),
            },
            _ => None,
        };

        let mut identity_errors = Vec::new();
        match self.principals.find_by_email(&command.email).await {
            Ok(Some(_)) => identity_errors.push(format!("Email '{}' is already taken.", command.email.trim())),
            Ok(None) => {}
            Err(e) => return UseCaseResult::failure(UseCaseError::commit(format!("Failed to fetch user: {}", e))),
        }
        match self.principals.find_by_user_name(&command.user_name).await {
            Ok(Some(_)) => identity_errors.push(format!("Username '{}' is already taken.", command.user_name.trim())),
            Ok(None) => {}
            Err(e) => return UseCaseResult::failure(UseCaseError::commit(format!("Failed to fetch user: {}", e))),
        }
        if !identity_errors.is_empty() {
            return UseCaseResult::failure(invalid_registration(identity_errors));
        }

        let (role, role_defaulted) = match Role::from_name(&command.selected_role) {
            Some(role) => (role, false),
            None => {
                warn!(selected_role = %command.selected_role, "{}", ROLE_DEFAULTED);
                (Role::Customer, true)
            }
        };

        let may_grant = match load_manager_tier(self.principals.as_ref(), &ctx.principal_id).await {
            Ok(tier) => tier.may_grant(role),
            Err(UseCaseError::AuthorizationError { .. }) => false,
            Err(e) => return UseCaseResult::failure(e),
        };
        if !may_grant {
            return UseCaseResult::failure(UseCaseError::business_rule("ROLE_GRANT_DENIED", FAILED_TO_ASSIGN_ROLE));
        }

        let password_hash = match self.password_service.hash_password(&command.password) {
            Ok(hash) => hash,
            Err(e) => return UseCaseResult::failure(UseCaseError::commit(format!("Failed to hash password: {}", e))),
        };

        let mut principal = Principal::new(
            command.user_name.trim(),
            command.email.trim(),
            command.first_name.trim(),
            command.last_name.trim(),
            password_hash,
        )
        .with_role(role);
        principal.store_id = store_id;

        info!(
            principal_id = %principal.id,
            role = %role,
            role_defaulted,
            caller_id = %ctx.principal_id,
            "Registering user"
        );

        let event = UserRegistered::new(&ctx, &principal, role, role_defaulted);
        self.unit_of_work.commit(&principal, event, &command).await
    }
}

fn invalid_registration(errors: Vec<String>) -> UseCaseError {
    UseCaseError::validation_with_details("INVALID_REGISTRATION", errors.join(" "), details! { "errors" => errors })
}
