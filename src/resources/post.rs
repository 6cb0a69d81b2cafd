use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::core::CRUDResource;
use crate::entities::post;
use crate::errors::ApiError;
use crate::filtering::{AllowList, FieldType, FilterOperator, SortDirection};
use crate::slug::{ensure_unique, generate_slug, validate_slug};
use crate::validation::{Validatable, ValidationError, ValidationErrors, validators};

/// Attempts at inserting a generated slug before reporting a conflict.
const MAX_INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub author_id: Uuid,
    /// Incremented on every update
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<post::Model> for Post {
    fn from(model: post::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            author_id: model.author_id,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PostCreate {
    pub title: String,
    pub content: String,
    /// Generated from the title when omitted
    #[serde(default)]
    pub slug: Option<String>,
}

/// Omitted fields keep their value. Changing the title without passing a
/// slug regenerates the slug.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
}

fn check_title(errors: &mut ValidationErrors, title: &str) {
    errors.check(validators::validate_required("title", title));
    errors.check(validators::validate_length("title", title, None, Some(255)));
}

impl Validatable for PostCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&mut errors, &self.title);
        errors.check(validators::validate_required("content", &self.content));
        errors.result()
    }
}

impl Validatable for PostUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            check_title(&mut errors, title);
        }
        if let Some(content) = &self.content {
            errors.check(validators::validate_required("content", content));
        }
        errors.result()
    }
}

#[async_trait]
impl CRUDResource for Post {
    type EntityType = post::Entity;

    const RESOURCE_NAME_SINGULAR: &'static str = "Post";
    const RESOURCE_NAME_PLURAL: &'static str = "posts";

    fn allow_list() -> AllowList<post::Column> {
        AllowList::new(post::Column::CreatedAt, SortDirection::Desc)
            .search(
                "title",
                post::Column::Title,
                FieldType::String,
                "Post title",
                FilterOperator::TEXT,
            )
            .search(
                "slug",
                post::Column::Slug,
                FieldType::String,
                "Post slug",
                &[FilterOperator::Eq],
            )
            .search(
                "author_id",
                post::Column::AuthorId,
                FieldType::Uuid,
                "Author identifier",
                FilterOperator::IDENTITY,
            )
            .search(
                "created_at",
                post::Column::CreatedAt,
                FieldType::Date,
                "Creation date",
                FilterOperator::COMPARISON,
            )
            .sort("title", post::Column::Title, "Order by title")
            .sort("created_at", post::Column::CreatedAt, "Order by creation date")
            .sort("updated_at", post::Column::UpdatedAt, "Order by last update")
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn not_found(slug: &str) -> ApiError {
    ApiError::not_found(Post::RESOURCE_NAME_SINGULAR, Some(slug.to_string()))
}

async fn find_model(db: &DatabaseConnection, slug: &str) -> Result<post::Model, ApiError> {
    post::Entity::find()
        .filter(post::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| not_found(slug))
}

/// Existence probe for the slug generator, ignoring the post being edited.
async fn slug_taken(
    db: &DatabaseConnection,
    candidate: String,
    except: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query = post::Entity::find().filter(post::Column::Slug.eq(candidate));
    if let Some(id) = except {
        query = query.filter(post::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

fn base_slug(title: &str) -> Result<String, ApiError> {
    let base = generate_slug(title);
    if base.is_empty() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new(
            "title",
            "Title must contain at least one letter or digit",
        ));
        return Err(errors.into());
    }
    Ok(base)
}

async fn unique_slug(
    db: &DatabaseConnection,
    base: &str,
    except: Option<Uuid>,
) -> Result<String, ApiError> {
    Ok(ensure_unique(base, |candidate| slug_taken(db, candidate, except)).await?)
}

/// Validate a caller-chosen slug and make sure nobody else holds it.
async fn explicit_slug(
    db: &DatabaseConnection,
    slug: &str,
    except: Option<Uuid>,
) -> Result<String, ApiError> {
    validate_slug(slug)?;
    if slug_taken(db, slug.to_string(), except).await? {
        return Err(ApiError::conflict(format!("Slug '{slug}' is already in use")));
    }
    Ok(slug.to_string())
}

fn new_post(author_id: Uuid, title: &str, content: &str, slug: String) -> post::ActiveModel {
    let now = Utc::now();
    post::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        slug: Set(slug),
        content: Set(content.to_string()),
        author_id: Set(author_id),
        version: Set(1),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// # Errors
///
/// 404 when no post has this slug.
pub async fn get_post(db: &DatabaseConnection, slug: &str) -> Result<Post, ApiError> {
    find_model(db, slug).await.map(Post::from)
}

/// Create a post owned by `author`.
///
/// A generated slug is probed for uniqueness and the insert is retried when a
/// concurrent writer takes the same slug first. An explicit slug that is
/// already taken is a conflict.
///
/// # Errors
///
/// 422 for invalid input or slug shape, 409 on slug conflicts.
pub async fn create_post(
    db: &DatabaseConnection,
    author: &AuthenticatedUser,
    input: PostCreate,
) -> Result<Post, ApiError> {
    input.validate()?;
    let title = input.title.trim();

    if let Some(slug) = input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let slug = explicit_slug(db, slug, None).await?;
        let model = new_post(author.id, title, &input.content, slug).insert(db).await?;
        tracing::info!(post_id = %model.id, slug = %model.slug, "Post created");
        return Ok(Post::from(model));
    }

    let base = base_slug(title)?;
    for attempt in 1..=MAX_INSERT_ATTEMPTS {
        let slug = unique_slug(db, &base, None).await?;
        match new_post(author.id, title, &input.content, slug.clone())
            .insert(db)
            .await
        {
            Ok(model) => {
                tracing::info!(post_id = %model.id, slug = %model.slug, "Post created");
                return Ok(Post::from(model));
            }
            Err(err) if is_unique_violation(&err) => {
                tracing::warn!(slug = %slug, attempt, "Slug taken by a concurrent insert, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(ApiError::conflict(format!(
        "Could not reserve a slug for '{title}', please retry"
    )))
}

fn ensure_can_modify(caller: &AuthenticatedUser, model: &post::Model) -> Result<(), ApiError> {
    if caller.id == model.author_id || caller.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only the author or an admin may modify this post"))
    }
}

/// Apply a partial update.
///
/// The slug is recomputed when the title changes and no slug is supplied.
/// The write only succeeds if the post's `version` is unchanged since it was
/// read, so two concurrent edits cannot both re-slug the same post.
///
/// # Errors
///
/// 404, 403, 422, and 409 for slug conflicts or a concurrent modification.
pub async fn update_post(
    db: &DatabaseConnection,
    caller: &AuthenticatedUser,
    slug: &str,
    input: PostUpdate,
) -> Result<Post, ApiError> {
    let existing = find_model(db, slug).await?;
    ensure_can_modify(caller, &existing)?;
    input.validate()?;

    let title = input
        .title
        .as_deref()
        .map_or(existing.title.as_str(), str::trim)
        .to_string();
    let requested_slug = input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let new_slug = match requested_slug {
        Some(requested) if requested == existing.slug => existing.slug.clone(),
        Some(requested) => explicit_slug(db, requested, Some(existing.id)).await?,
        None if title != existing.title => {
            let base = base_slug(&title)?;
            unique_slug(db, &base, Some(existing.id)).await?
        }
        None => existing.slug.clone(),
    };

    let changes = post::ActiveModel {
        title: Set(title),
        slug: Set(new_slug),
        content: Set(input.content.unwrap_or_else(|| existing.content.clone())),
        version: Set(existing.version + 1),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = post::Entity::update_many()
        .set(changes)
        .filter(post::Column::Id.eq(existing.id))
        .filter(post::Column::Version.eq(existing.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(post_id = %existing.id, version = existing.version, "Stale post update rejected");
        return Err(ApiError::conflict(
            "The post was modified by another request, reload and retry",
        ));
    }

    let updated = post::Entity::find_by_id(existing.id)
        .one(db)
        .await?
        .ok_or_else(|| not_found(slug))?;
    tracing::info!(post_id = %updated.id, slug = %updated.slug, version = updated.version, "Post updated");
    Ok(Post::from(updated))
}

/// # Errors
///
/// 404 when no post has this slug, 403 for anyone but the author or an admin.
pub async fn delete_post(
    db: &DatabaseConnection,
    caller: &AuthenticatedUser,
    slug: &str,
) -> Result<(), ApiError> {
    let existing = find_model(db, slug).await?;
    ensure_can_modify(caller, &existing)?;

    post::Entity::delete_by_id(existing.id).exec(db).await?;
    tracing::info!(post_id = %existing.id, slug, "Post deleted");
    Ok(())
}
