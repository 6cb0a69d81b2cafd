use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{ADMIN_ROLE, AuthError, AuthenticatedUser, PasswordHasher, TokenService};
use crate::core::CRUDResource;
use crate::entities::{role, user};
use crate::errors::ApiError;
use crate::filtering::{AllowList, FieldType, FilterOperator, SortDirection};
use crate::seed::DEFAULT_ROLE;
use crate::validation::{Validatable, ValidationErrors, validators};

/// Public view of an account; the password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role_id: Uuid,
    /// Role name, filled in when the role is loaded alongside the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role_id: model.role_id,
            role: None,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Role to join instead of the default `user` role
    #[serde(default, alias = "role")]
    pub role_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: LoginUser,
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Only admins may change roles
    pub role_id: Option<Uuid>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Validatable for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validators::validate_username("username", self.username.trim()));
        errors.check(validators::validate_email("email", &normalize_email(&self.email)));
        errors.check(validators::validate_password("password", &self.password));
        errors.result()
    }
}

impl Validatable for UserUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(username) = &self.username {
            errors.check(validators::validate_username("username", username.trim()));
        }
        if let Some(email) = &self.email {
            errors.check(validators::validate_email("email", &normalize_email(email)));
        }
        errors.result()
    }
}

#[async_trait]
impl CRUDResource for User {
    type EntityType = user::Entity;

    const RESOURCE_NAME_SINGULAR: &'static str = "User";
    const RESOURCE_NAME_PLURAL: &'static str = "users";

    fn allow_list() -> AllowList<user::Column> {
        AllowList::new(user::Column::CreatedAt, SortDirection::Desc)
            .search(
                "username",
                user::Column::Username,
                FieldType::String,
                "Username",
                FilterOperator::TEXT,
            )
            .search(
                "email",
                user::Column::Email,
                FieldType::String,
                "Email address",
                FilterOperator::TEXT,
            )
            .search(
                "role_id",
                user::Column::RoleId,
                FieldType::Uuid,
                "Role identifier",
                FilterOperator::IDENTITY,
            )
            .search(
                "created_at",
                user::Column::CreatedAt,
                FieldType::Date,
                "Creation date",
                FilterOperator::COMPARISON,
            )
            .sort("username", user::Column::Username, "Order by username")
            .sort("email", user::Column::Email, "Order by email")
            .sort("created_at", user::Column::CreatedAt, "Order by creation date")
    }

    async fn hydrate(
        db: &DatabaseConnection,
        models: Vec<user::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let role_ids: Vec<Uuid> = models.iter().map(|model| model.role_id).collect();
        let names: HashMap<Uuid, String> = role::Entity::find()
            .filter(role::Column::Id.is_in(role_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|role| (role.id, role.name))
            .collect();

        Ok(models
            .into_iter()
            .map(|model| {
                let role = names.get(&model.role_id).cloned();
                User {
                    role,
                    ..User::from(model)
                }
            })
            .collect())
    }
}

async fn find_model(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, ApiError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(User::RESOURCE_NAME_SINGULAR, Some(id.to_string())))
}

async fn with_role(db: &DatabaseConnection, model: user::Model) -> Result<User, ApiError> {
    let mut users = User::hydrate(db, vec![model]).await?;
    users
        .pop()
        .ok_or_else(|| ApiError::internal("Failed to load user", None))
}

/// 409 when another account already uses the username or email.
async fn ensure_identity_free(
    db: &DatabaseConnection,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    if username.is_none() && email.is_none() {
        return Ok(());
    }
    let clash = Condition::any()
        .add_option(username.map(|username| user::Column::Username.eq(username)))
        .add_option(email.map(|email| user::Column::Email.eq(email)));

    let mut query = user::Entity::find().filter(clash);
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(ApiError::conflict("Username or email already in use"));
    }
    Ok(())
}

async fn role_by_name(db: &DatabaseConnection, name: &str) -> Result<role::Model, ApiError> {
    role::Entity::find()
        .filter(role::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::internal("Default role missing", Some(format!("role '{name}'"))))
}

/// Create an account with a hashed password.
///
/// # Errors
///
/// 422 on invalid input, 400 for an unknown role, 403 when asking for the
/// admin role and 409 for a taken username or email.
pub async fn register(
    db: &DatabaseConnection,
    passwords: &PasswordHasher,
    input: RegisterRequest,
) -> Result<User, ApiError> {
    input.validate()?;
    let username = input.username.trim().to_string();
    let email = normalize_email(&input.email);

    let role = match input.role_id {
        Some(role_id) => role::Entity::find_by_id(role_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::bad_request("The requested role does not exist"))?,
        None => role_by_name(db, DEFAULT_ROLE).await?,
    };
    if role.name == ADMIN_ROLE {
        return Err(ApiError::forbidden("The admin role cannot be self-assigned"));
    }

    ensure_identity_free(db, Some(&username), Some(&email), None).await?;

    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(passwords.hash(&input.password)?),
        role_id: Set(role.id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = %model.id, role = %role.name, "User registered");
    Ok(User {
        role: Some(role.name),
        ..User::from(model)
    })
}

/// Check credentials and issue an access token.
///
/// # Errors
///
/// 401 for an unknown email or a wrong password.
pub async fn login(
    db: &DatabaseConnection,
    passwords: &PasswordHasher,
    tokens: &TokenService,
    input: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let email = normalize_email(&input.email);
    let found = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .find_also_related(role::Entity)
        .one(db)
        .await?;

    let Some((model, Some(role))) = found else {
        tracing::warn!(email = %email, "Login for unknown account");
        return Err(AuthError::InvalidCredentials.into());
    };
    if !passwords.verify(&input.password, &model.password_hash)? {
        tracing::warn!(user_id = %model.id, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = tokens.issue(model.id, &role.name)?;
    tracing::info!(user_id = %model.id, "User logged in");

    Ok(LoginResponse {
        user: LoginUser {
            id: model.id,
            username: model.username,
            email: model.email,
            role: role.name,
        },
        token,
    })
}

/// # Errors
///
/// 404 when no user has this id.
pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> Result<User, ApiError> {
    let model = find_model(db, id).await?;
    with_role(db, model).await
}

/// Users may edit themselves; admins may edit anyone and change roles.
///
/// # Errors
///
/// 403 for anyone else, plus the errors of [`register`] for the new values.
pub async fn update_user(
    db: &DatabaseConnection,
    caller: &AuthenticatedUser,
    id: Uuid,
    input: UserUpdate,
) -> Result<User, ApiError> {
    if caller.id != id && !caller.is_admin() {
        return Err(ApiError::forbidden("You may only update your own account"));
    }
    if input.role_id.is_some() && !caller.is_admin() {
        return Err(ApiError::forbidden("Only admins may change roles"));
    }
    input.validate()?;

    let username = input.username.map(|username| username.trim().to_string());
    let email = input.email.as_deref().map(normalize_email);
    ensure_identity_free(db, username.as_deref(), email.as_deref(), Some(id)).await?;

    let mut active = find_model(db, id).await?.into_active_model();
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(role_id) = input.role_id {
        role::Entity::find_by_id(role_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::bad_request("The requested role does not exist"))?;
        active.role_id = Set(role_id);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(db).await?;
    tracing::info!(user_id = %id, updated_by = %caller.id, "User updated");
    with_role(db, model).await
}

/// Delete an account and, through the foreign key, its posts.
///
/// # Errors
///
/// 404 when no user has this id.
pub async fn delete_user(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
    let result = user::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found(
            User::RESOURCE_NAME_SINGULAR,
            Some(id.to_string()),
        ));
    }
    tracing::info!(user_id = %id, "User deleted");
    Ok(())
}
