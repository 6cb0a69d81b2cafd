use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::CRUDResource;
use crate::entities::{role, user};
use crate::errors::ApiError;
use crate::filtering::{AllowList, FieldType, FilterOperator, SortDirection};
use crate::validation::{Validatable, ValidationErrors, validators};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<role::Model> for Role {
    fn from(model: role::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoleCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    errors.check(validators::validate_required("name", name));
    errors.check(validators::validate_length("name", name.trim(), None, Some(50)));
}

impl Validatable for RoleCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &self.name);
        errors.check(validators::validate_length(
            "description",
            &self.description,
            None,
            Some(255),
        ));
        errors.result()
    }
}

impl Validatable for RoleUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            check_name(&mut errors, name);
        }
        if let Some(description) = &self.description {
            errors.check(validators::validate_length(
                "description",
                description,
                None,
                Some(255),
            ));
        }
        errors.result()
    }
}

#[async_trait]
impl CRUDResource for Role {
    type EntityType = role::Entity;

    const RESOURCE_NAME_SINGULAR: &'static str = "Role";
    const RESOURCE_NAME_PLURAL: &'static str = "roles";

    fn allow_list() -> AllowList<role::Column> {
        AllowList::new(role::Column::Name, SortDirection::Asc)
            .search(
                "name",
                role::Column::Name,
                FieldType::String,
                "Role name",
                FilterOperator::TEXT,
            )
            .search(
                "description",
                role::Column::Description,
                FieldType::String,
                "Role description",
                &[FilterOperator::Like, FilterOperator::Nlike],
            )
            .search(
                "created_at",
                role::Column::CreatedAt,
                FieldType::Date,
                "Creation date",
                FilterOperator::COMPARISON,
            )
            .sort("name", role::Column::Name, "Order by name")
            .sort("created_at", role::Column::CreatedAt, "Order by creation date")
    }
}

async fn find_model(db: &DatabaseConnection, id: Uuid) -> Result<role::Model, ApiError> {
    role::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(Role::RESOURCE_NAME_SINGULAR, Some(id.to_string())))
}

async fn ensure_name_free(
    db: &DatabaseConnection,
    name: &str,
    except: Option<Uuid>,
) -> Result<(), ApiError> {
    let mut query = role::Entity::find().filter(role::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(role::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(ApiError::conflict(format!("Role '{name}' already exists")));
    }
    Ok(())
}

/// # Errors
///
/// 404 when no role has this id.
pub async fn get_role(db: &DatabaseConnection, id: Uuid) -> Result<Role, ApiError> {
    find_model(db, id).await.map(Role::from)
}

/// # Errors
///
/// 422 on invalid input, 409 when the name is taken.
pub async fn create_role(db: &DatabaseConnection, input: RoleCreate) -> Result<Role, ApiError> {
    input.validate()?;
    let name = input.name.trim().to_string();
    ensure_name_free(db, &name, None).await?;

    let now = Utc::now();
    let model = role::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(input.description.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    tracing::info!(role_id = %model.id, name = %model.name, "Role created");
    Ok(Role::from(model))
}

/// # Errors
///
/// 404, 409 or 422 as for create.
pub async fn update_role(
    db: &DatabaseConnection,
    id: Uuid,
    input: RoleUpdate,
) -> Result<Role, ApiError> {
    input.validate()?;
    let mut active = find_model(db, id).await?.into_active_model();

    if let Some(name) = input.name {
        let name = name.trim().to_string();
        ensure_name_free(db, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = input.description {
        active.description = Set(description.trim().to_string());
    }
    active.updated_at = Set(Utc::now());

    Ok(Role::from(active.update(db).await?))
}

/// # Errors
///
/// 404 for an unknown role, 409 while users still hold it.
pub async fn delete_role(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
    let model = find_model(db, id).await?;

    let holders = user::Entity::find()
        .filter(user::Column::RoleId.eq(id))
        .count(db)
        .await?;
    if holders > 0 {
        return Err(ApiError::conflict(format!(
            "Role '{}' is assigned to {holders} user(s)",
            model.name
        )));
    }

    role::Entity::delete_by_id(id).exec(db).await?;
    tracing::info!(role_id = %id, "Role deleted");
    Ok(())
}
