use async_trait::async_trait;
use sea_orm::{
    Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
};
use serde::Serialize;

use crate::filtering::AllowList;

/// API representation of a stored entity that can be listed through the
/// shared search, sort and pagination pipeline.
#[async_trait]
pub trait CRUDResource: Sized + Send + Sync + Serialize
where
    Self: From<<Self::EntityType as EntityTrait>::Model>,
    <Self::EntityType as EntityTrait>::Model: Send + Sync,
{
    type EntityType: EntityTrait + Sync;

    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;

    /// Fields clients may search and sort by, with the default ordering.
    fn allow_list() -> AllowList<<Self::EntityType as EntityTrait>::Column>;

    async fn total_count(db: &DatabaseConnection, condition: &Condition) -> Result<u64, DbErr> {
        Self::EntityType::find()
            .filter(condition.clone())
            .count(db)
            .await
    }

    /// Turn one page of rows into API values. Override to attach related data.
    async fn hydrate(
        _db: &DatabaseConnection,
        models: Vec<<Self::EntityType as EntityTrait>::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        Ok(models.into_iter().map(Self::from).collect())
    }
}
