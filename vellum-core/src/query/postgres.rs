//! SQL rendition of the listing engine.
//!
//! Count and page queries share one predicate builder and run inside a
//! single read-only snapshot, so `total` always describes the rows the page
//! was cut from.

use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, postgres::PgRow};
use vellum_model::{ListQuery, Page, PageRequest, SortDirection};

use super::{ListableEntity, OrganizationMatch, ScopePredicate, non_blank};
use crate::error::{CatalogError, Result};

pub trait PgListable: ListableEntity {
    const TABLE: &'static str;
    /// Column list for the page query.
    const COLUMNS: &'static str;
    const SEARCH_COLUMN: &'static str;

    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    /// Appends ` AND ...` clauses for every set, non-search filter.
    fn push_filters(
        builder: &mut QueryBuilder<'static, Postgres>,
        filters: &Self::Filters,
    );

    /// Allow-listed ORDER BY expression for a sort key.
    fn sort_expression(key: Self::SortKey) -> &'static str;

    fn decode(row: Self::Row) -> Result<Self::Record>;
}

pub async fn fetch_page<E: PgListable>(
    pool: &PgPool,
    scope: &ScopePredicate,
    query: &ListQuery<E::Filters, E::SortKey>,
    page: PageRequest,
) -> Result<Page<E::Record>> {
    let mut tx = pool.begin().await.map_err(|e| {
        CatalogError::Internal(format!("Failed to begin listing: {}", e))
    })?;

    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            CatalogError::Internal(format!(
                "Failed to open listing snapshot: {}",
                e
            ))
        })?;

    let mut count = QueryBuilder::<Postgres>::new(format!(
        "SELECT COUNT(*) FROM {} WHERE ",
        E::TABLE
    ));
    push_predicate::<E>(&mut count, scope, &query.filters);

    let total: i64 = count
        .build_query_scalar()
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            CatalogError::Internal(format!(
                "Failed to count {}: {}",
                E::TABLE,
                e
            ))
        })?;

    let mut select = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM {} WHERE ",
        E::COLUMNS,
        E::TABLE
    ));
    push_predicate::<E>(&mut select, scope, &query.filters);

    let direction = match query.direction {
        SortDirection::Ascending => " ASC",
        SortDirection::Descending => " DESC",
    };
    select
        .push(" ORDER BY ")
        .push(E::sort_expression(query.sort))
        .push(direction)
        .push(" NULLS LAST, id ASC LIMIT ")
        .push_bind(i64::from(page.limit_or_default()))
        .push(" OFFSET ")
        .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

    let rows = select
        .build_query_as::<E::Row>()
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            CatalogError::Internal(format!(
                "Failed to list {}: {}",
                E::TABLE,
                e
            ))
        })?;

    tx.commit().await.map_err(|e| {
        CatalogError::Internal(format!("Failed to close listing: {}", e))
    })?;

    let items = rows
        .into_iter()
        .map(E::decode)
        .collect::<Result<Vec<_>>>()?;

    Ok(Page::new(items, page, u64::try_from(total).unwrap_or_default()))
}

/// Scope clauses first, unconditionally; caller filters after.
fn push_predicate<E: PgListable>(
    builder: &mut QueryBuilder<'static, Postgres>,
    scope: &ScopePredicate,
    filters: &E::Filters,
) {
    builder
        .push("owner_id = ")
        .push_bind(scope.owner_id.to_uuid())
        .push(" AND deleted_at IS NULL");

    if let OrganizationMatch::Exactly(org) = scope.organization {
        match org {
            Some(org) => {
                builder
                    .push(" AND organization_id = ")
                    .push_bind(org.to_uuid());
            }
            None => {
                builder.push(" AND organization_id IS NULL");
            }
        }
    }

    E::push_filters(builder, filters);

    if let Some(search) = non_blank(E::search_text(filters)) {
        builder
            .push(" AND ")
            .push(E::SEARCH_COLUMN)
            .push(" ILIKE ")
            .push_bind(format!("%{}%", escape_like_literal(search)))
            .push(" ESCAPE E'\\\\'");
    }
}

pub(crate) fn escape_like_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_like_literal;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like_literal("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like_literal("plain"), "plain");
    }
}
