use std::marker::PhantomData;

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

/// Per-entity column map consumed by [`BaseRepository`]. Entities name their
/// own id and soft-delete columns here instead of being probed for them.
pub trait RepositoryEntity:
    EntityTrait<
        Model: IntoActiveModel<Self::ActiveModel> + Sync,
        ActiveModel: ActiveModelBehavior + Send,
    >
{
    fn id_column() -> Self::Column;

    /// Entities without a soft-delete marker return `None` and are always
    /// hard-deleted.
    fn deleted_at_column() -> Option<Self::Column> {
        None
    }
}

/// One page of results plus the unpaginated total. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct Page<M> {
    pub items: Vec<M>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

/// Generic persistence operations shared by every entity.
///
/// Every method borrows the connection, so the same repository call runs
/// against the pool or inside an open transaction. No method here commits;
/// transaction boundaries belong to the service layer. Absent rows come back
/// as `None`/`false`, never as errors.
pub struct BaseRepository<E: RepositoryEntity> {
    entity: PhantomData<E>,
}

impl<E: RepositoryEntity> BaseRepository<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entity: PhantomData,
        }
    }

    /// Fetch a single row by id. Soft-deleted rows are returned too; callers
    /// that must not see them filter on the marker themselves.
    pub async fn get<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<Option<E::Model>, DbErr> {
        E::find().filter(E::id_column().eq(id)).one(conn).await
    }

    /// Fetch the first row matching an arbitrary filter.
    pub async fn get_by<C: ConnectionTrait>(
        &self,
        conn: &C,
        filter: Condition,
    ) -> Result<Option<E::Model>, DbErr> {
        E::find().filter(filter).one(conn).await
    }

    pub async fn exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        filter: Condition,
    ) -> Result<bool, DbErr> {
        let count = E::find().filter(filter).count(conn).await?;
        Ok(count > 0)
    }

    /// Like [`Self::exists`] but ignoring one row, for uniqueness checks
    /// during updates.
    pub async fn exists_excluding<C: ConnectionTrait>(
        &self,
        conn: &C,
        exclude_id: Uuid,
        filter: Condition,
    ) -> Result<bool, DbErr> {
        let count = E::find()
            .filter(E::id_column().ne(exclude_id))
            .filter(filter)
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn get_multi<C: ConnectionTrait>(
        &self,
        conn: &C,
        skip: u64,
        limit: u64,
        order: (E::Column, Order),
    ) -> Result<Vec<E::Model>, DbErr> {
        E::find()
            .order_by(order.0, order.1)
            .offset(skip)
            .limit(limit)
            .all(conn)
            .await
    }

    /// Page through rows matching `filter`, optionally narrowed by a
    /// case-insensitive substring search over `search.0`. The total count is
    /// taken with the same conditions as the page itself.
    pub async fn get_multi_paginated<C: ConnectionTrait>(
        &self,
        conn: &C,
        page: u64,
        size: u64,
        order: (E::Column, Order),
        filter: Option<Condition>,
        search: Option<(&[E::Column], &str)>,
    ) -> Result<Page<E::Model>, DbErr> {
        let mut query = E::find();

        if let Some(filter) = filter {
            query = query.filter(filter);
        }

        if let Some((columns, term)) = search
            && !term.is_empty()
            && !columns.is_empty()
        {
            let pattern = format!("%{}%", escape_like(term)).to_lowercase();
            let mut any = Condition::any();
            for column in columns {
                any = any.add(
                    Expr::expr(Func::lower(Expr::col(*column)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                );
            }
            query = query.filter(any);
        }

        let paginator = query.order_by(order.0, order.1).paginate(conn, size);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(Page {
            items,
            total,
            page,
            size,
        })
    }

    /// Insert a row. The caller's unique indexes stay the final arbiter; a
    /// constraint violation surfaces as the underlying [`DbErr`].
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: E::ActiveModel,
    ) -> Result<E::Model, DbErr> {
        model.insert(conn).await
    }

    /// Apply `apply` to the current row and persist the result. Returns
    /// `None` when the row does not exist.
    pub async fn update<C, F>(
        &self,
        conn: &C,
        id: Uuid,
        apply: F,
    ) -> Result<Option<E::Model>, DbErr>
    where
        C: ConnectionTrait,
        F: FnOnce(E::Model) -> E::ActiveModel + Send,
    {
        let Some(current) = self.get(conn, id).await? else {
            return Ok(None);
        };

        let updated = apply(current).update(conn).await?;
        Ok(Some(updated))
    }

    /// Remove the row outright. Returns `false` when nothing matched.
    pub async fn force_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<bool, DbErr> {
        let result = E::delete_many()
            .filter(E::id_column().eq(id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Stamp the soft-delete marker. Returns `false` when the entity has no
    /// marker column, the row is absent, or the row is already marked.
    pub async fn soft_delete<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<bool, DbErr> {
        let Some(marker) = E::deleted_at_column() else {
            return Ok(false);
        };

        let result = E::update_many()
            .col_expr(marker, Expr::value(chrono::Utc::now().to_rfc3339()))
            .filter(E::id_column().eq(id))
            .filter(marker.is_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

impl<E: RepositoryEntity> Default for BaseRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape LIKE metacharacters so user input only ever matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_passes_plain_text_through() {
        assert_eq!(escape_like("alice"), "alice");
    }

    #[test]
    fn escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("50%_off\\now"), "50\\%\\_off\\\\now");
    }
}
