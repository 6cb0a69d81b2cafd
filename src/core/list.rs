use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use super::traits::CRUDResource;
use crate::errors::ApiError;
use crate::filtering::{
    ListQuery, PaginationResponse, apply_sort, build_condition, paginate,
};
use crate::response::{ListResponse, MetadataResponse, ResponseFlags};

/// Run the list pipeline for one resource: validate and compose the search
/// and sort directives, count matches, fetch the requested page and wrap it
/// in the response envelope.
///
/// # Errors
///
/// 400 for directives outside the allow-list, 500 for database failures.
pub async fn list_resources<R>(
    db: &DatabaseConnection,
    query: &ListQuery,
    flags: ResponseFlags,
) -> Result<ListResponse<R>, ApiError>
where
    R: CRUDResource,
    <R::EntityType as EntityTrait>::Model: Send + Sync,
{
    let allow_list = R::allow_list();
    let condition = build_condition(&allow_list, &query.search)?;
    let select = apply_sort(
        R::EntityType::find().filter(condition.clone()),
        &allow_list,
        &query.sort,
    )?;

    let total = R::total_count(db, &condition).await?;
    let window = paginate(total, query.page, query.limit);

    tracing::debug!(
        resource = R::RESOURCE_NAME_PLURAL,
        search = query.search.len(),
        sort = query.sort.len(),
        total,
        page = query.page,
        "Listing resources"
    );

    let models = if window.is_past_end(query.page) {
        Vec::new()
    } else {
        select
            .offset(window.offset)
            .limit(window.limit)
            .all(db)
            .await?
    };
    let data = R::hydrate(db, models).await?;

    let metadata = MetadataResponse {
        allowed_search: allow_list.describe_search(),
        allowed_sort: allow_list.describe_sort(),
        applied_search: query.search.clone(),
        applied_sort: query.sort.clone(),
    };
    let pagination = PaginationResponse::new(&query.path, query.page, total, window);

    Ok(ListResponse::build(data, metadata, pagination, flags))
}
