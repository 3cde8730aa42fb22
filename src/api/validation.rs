use sea_orm::Order;

use super::ApiError;
use super::types::ListQuery;
use crate::config::PaginationConfig;
use crate::services::ListParams;

/// Turn raw listing query parameters into validated [`ListParams`].
///
/// Page numbers are 1-based. A missing size falls back to the configured
/// default; a size outside `1..=max` is rejected rather than clamped so the
/// caller learns about the mistake.
pub fn resolve_list_params(
    query: ListQuery,
    pagination: &PaginationConfig,
) -> Result<ListParams, ApiError> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(ApiError::validation("Page must be at least 1"));
    }

    let size = query.size.unwrap_or(pagination.default_page_size);
    if !(1..=pagination.max_page_size).contains(&size) {
        return Err(ApiError::validation(format!(
            "Page size must be between 1 and {}",
            pagination.max_page_size
        )));
    }

    let search = query.search.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    });

    let order = match query.order.as_deref() {
        None => None,
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(Order::Asc),
            "desc" => Some(Order::Desc),
            _ => {
                return Err(ApiError::validation(format!(
                    "Invalid order: {raw}. Use \"asc\" or \"desc\""
                )));
            }
        },
    };

    Ok(ListParams {
        page,
        size,
        search,
        order_by: query.order_by,
        order,
    })
}
