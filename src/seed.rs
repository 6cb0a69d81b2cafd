//! Default roles inserted at startup.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::role;

/// Role assigned to new registrations when none is requested.
pub const DEFAULT_ROLE: &str = "user";

pub const DEFAULT_ROLES: &[(&str, &str)] = &[
    ("admin", "Full access to every resource"),
    ("user", "Registered reader and author"),
    ("editor", "Manages content"),
];

/// Insert missing default roles. Safe to run on every start.
///
/// # Errors
///
/// Propagates database errors.
pub async fn seed_roles(db: &DatabaseConnection) -> Result<(), DbErr> {
    for &(name, description) in DEFAULT_ROLES {
        let existing = role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let now = Utc::now();
        role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        tracing::info!(role = name, "Seeded default role");
    }
    Ok(())
}
