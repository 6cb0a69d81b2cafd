use sea_orm::ColumnTrait;
use serde::Serialize;
use utoipa::ToSchema;

use super::parser::{FilterOperator, SortDirection};

/// How a raw filter value is converted before it reaches the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Uuid,
    Date,
}

#[derive(Debug, Clone)]
pub struct SearchField<C> {
    pub name: &'static str,
    pub column: C,
    pub field_type: FieldType,
    pub description: &'static str,
    pub operators: &'static [FilterOperator],
}

impl<C> SearchField<C> {
    #[must_use]
    pub fn allows(&self, operator: FilterOperator) -> bool {
        self.operators.contains(&operator)
    }
}

#[derive(Debug, Clone)]
pub struct SortField<C> {
    pub name: &'static str,
    pub column: C,
    pub description: &'static str,
}

/// Public description of a searchable field, reported in list metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SearchFieldInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub description: &'static str,
    pub operators: Vec<FilterOperator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SortFieldInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Fields of one resource that clients may filter and order by.
///
/// Anything not registered here is rejected by the query composer, so column
/// names never come from the request.
#[derive(Debug, Clone)]
pub struct AllowList<C> {
    search: Vec<SearchField<C>>,
    sort: Vec<SortField<C>>,
    default_sort: (C, SortDirection),
}

impl<C: ColumnTrait> AllowList<C> {
    #[must_use]
    pub fn new(default_column: C, default_direction: SortDirection) -> Self {
        Self {
            search: Vec::new(),
            sort: Vec::new(),
            default_sort: (default_column, default_direction),
        }
    }

    #[must_use]
    pub fn search(
        mut self,
        name: &'static str,
        column: C,
        field_type: FieldType,
        description: &'static str,
        operators: &'static [FilterOperator],
    ) -> Self {
        self.search.push(SearchField {
            name,
            column,
            field_type,
            description,
            operators,
        });
        self
    }

    #[must_use]
    pub fn sort(mut self, name: &'static str, column: C, description: &'static str) -> Self {
        self.sort.push(SortField {
            name,
            column,
            description,
        });
        self
    }

    #[must_use]
    pub fn search_field(&self, name: &str) -> Option<&SearchField<C>> {
        self.search.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn sort_field(&self, name: &str) -> Option<&SortField<C>> {
        self.sort.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn default_sort(&self) -> (C, SortDirection) {
        self.default_sort
    }

    #[must_use]
    pub fn describe_search(&self) -> Vec<SearchFieldInfo> {
        self.search
            .iter()
            .map(|field| SearchFieldInfo {
                name: field.name,
                field_type: field.field_type,
                description: field.description,
                operators: field.operators.to_vec(),
            })
            .collect()
    }

    #[must_use]
    pub fn describe_sort(&self) -> Vec<SortFieldInfo> {
        self.sort
            .iter()
            .map(|field| SortFieldInfo {
                name: field.name,
                description: field.description,
            })
            .collect()
    }
}
