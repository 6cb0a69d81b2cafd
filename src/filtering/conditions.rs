use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select, Value,
    sea_query::{BinOper, Expr, Func, SimpleExpr},
};
use uuid::Uuid;

use super::allow_list::{AllowList, FieldType, SearchField};
use super::parser::{FilterOperator, SearchDirective, SortDirection, SortDirective};

// Basic safety limits
const MAX_FIELD_VALUE_LENGTH: usize = 10_000;
const MAX_LIST_VALUES: usize = 100;

/// Directive rejected against a resource's allow-list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Field '{0}' cannot be used for search")]
    InvalidFilterField(String),
    #[error("Operator '{operator}' is not allowed for field '{field}'")]
    InvalidOperatorForField { field: String, operator: String },
    #[error("Field '{0}' cannot be used for sorting")]
    InvalidSortField(String),
    #[error("Value '{value}' is not valid for field '{field}'")]
    InvalidFilterValue { field: String, value: String },
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Convert one raw value into the database type declared for the field.
fn typed_value<C>(field: &SearchField<C>, raw: &str) -> Result<Value, FilterError> {
    let invalid = || FilterError::InvalidFilterValue {
        field: field.name.to_string(),
        value: raw.to_string(),
    };

    if raw.len() > MAX_FIELD_VALUE_LENGTH {
        return Err(invalid());
    }

    match field.field_type {
        FieldType::String => Ok(Value::from(raw.to_string())),
        FieldType::Uuid => Uuid::parse_str(raw.trim())
            .map(Value::from)
            .map_err(|_| invalid()),
        FieldType::Date => parse_date(raw.trim()).map(Value::from).ok_or_else(invalid),
    }
}

fn typed_values<C>(field: &SearchField<C>, raw: &str) -> Result<Vec<Value>, FilterError> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .take(MAX_LIST_VALUES)
        .map(|item| typed_value(field, item))
        .collect()
}

/// Build `UPPER(column) LIKE UPPER('%value%') ESCAPE '\'`.
///
/// Both sides are folded by the database so accented letters compare under
/// the same rules; wildcards in the value match literally.
fn like_pattern<C: ColumnTrait>(
    field: &SearchField<C>,
    raw: &str,
    negate: bool,
) -> Result<SimpleExpr, FilterError> {
    if raw.len() > MAX_FIELD_VALUE_LENGTH {
        return Err(FilterError::InvalidFilterValue {
            field: field.name.to_string(),
            value: raw.to_string(),
        });
    }

    let pattern = SimpleExpr::Binary(
        Box::new(Func::upper(Expr::val(format!("%{}%", escape_like_wildcards(raw)))).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant(Value::from('\\'))),
    );
    let operator = if negate {
        BinOper::NotLike
    } else {
        BinOper::Like
    };
    Ok(Expr::expr(Func::upper(Expr::col(field.column.as_column_ref()))).binary(operator, pattern))
}

fn build_expression<C: ColumnTrait>(
    field: &SearchField<C>,
    directive: &SearchDirective,
) -> Result<SimpleExpr, FilterError> {
    let column = field.column;
    let value = directive.value.as_str();

    let expr = match directive.operator {
        FilterOperator::Eq => column.eq(typed_value(field, value)?),
        FilterOperator::Ne => column.ne(typed_value(field, value)?),
        FilterOperator::Like => like_pattern(field, value, false)?,
        FilterOperator::Nlike => like_pattern(field, value, true)?,
        FilterOperator::In => column.is_in(typed_values(field, value)?),
        FilterOperator::Nin => column.is_not_in(typed_values(field, value)?),
        FilterOperator::Gt => column.gt(typed_value(field, value)?),
        FilterOperator::Gte => column.gte(typed_value(field, value)?),
        FilterOperator::Lt => column.lt(typed_value(field, value)?),
        FilterOperator::Lte => column.lte(typed_value(field, value)?),
    };
    Ok(expr)
}

/// Combine every search directive into one AND-ed condition.
///
/// # Errors
///
/// Fails on the first directive whose field is not searchable, whose operator
/// is not allowed for that field, or whose value cannot be typed.
pub fn build_condition<C: ColumnTrait>(
    allow_list: &AllowList<C>,
    directives: &[SearchDirective],
) -> Result<Condition, FilterError> {
    let mut condition = Condition::all();

    for directive in directives {
        let field = allow_list
            .search_field(&directive.field)
            .ok_or_else(|| FilterError::InvalidFilterField(directive.field.clone()))?;

        if !field.allows(directive.operator) {
            return Err(FilterError::InvalidOperatorForField {
                field: directive.field.clone(),
                operator: directive.operator.as_str().to_string(),
            });
        }

        condition = condition.add(build_expression(field, directive)?);
    }

    Ok(condition)
}

/// Layer search directives onto a base select without executing it.
///
/// # Errors
///
/// See [`build_condition`].
pub fn apply_search<E: EntityTrait>(
    select: Select<E>,
    allow_list: &AllowList<E::Column>,
    directives: &[SearchDirective],
) -> Result<Select<E>, FilterError> {
    Ok(select.filter(build_condition(allow_list, directives)?))
}

const fn order_for(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// Apply sort directives in the order given; later ones break ties.
///
/// Falls back to the allow-list's default ordering when no directive is given
/// so page windows stay stable between requests.
///
/// # Errors
///
/// Returns [`FilterError::InvalidSortField`] for a field that is not sortable.
pub fn apply_sort<E: EntityTrait>(
    mut select: Select<E>,
    allow_list: &AllowList<E::Column>,
    directives: &[SortDirective],
) -> Result<Select<E>, FilterError> {
    if directives.is_empty() {
        let (column, direction) = allow_list.default_sort();
        return Ok(select.order_by(column, order_for(direction)));
    }

    for directive in directives {
        let field = allow_list
            .sort_field(&directive.field)
            .ok_or_else(|| FilterError::InvalidSortField(directive.field.clone()))?;
        select = select.order_by(field.column, order_for(directive.direction));
    }

    Ok(select)
}
