pub mod allow_list;
pub mod conditions;
pub mod pagination;
pub mod parser;

pub use allow_list::{AllowList, FieldType, SearchFieldInfo, SortFieldInfo};
pub use conditions::{FilterError, apply_search, apply_sort, build_condition};
pub use pagination::{PageWindow, PaginationLinks, PaginationResponse, paginate};
pub use parser::{
    FilterOperator, ListParams, ListQuery, SearchDirective, SortDirection, SortDirective,
    parse_search, parse_sort,
};
