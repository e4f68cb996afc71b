//! Types and functions for storing and loading items.

use super::item_model::{Item, NewItem};
use crate::infra::database::DbPool;
use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{instrument, Instrument};

/// The result of a repository call.
pub type StorageResult<T> = Result<T, sqlx::Error>;

/// Anything that can store and load items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Lists every item.
    async fn find_all(&self) -> StorageResult<Vec<Item>>;

    /// Fetches an item, if it exists.
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>>;

    /// Stores a new item and returns it with its assigned id.
    async fn save(&self, item: NewItem) -> StorageResult<Item>;

    /// Overwrites a stored item, returning the number of affected rows.
    async fn update(&self, item: &Item) -> StorageResult<u64>;

    /// Deletes an item, returning the number of affected rows.
    async fn delete(&self, id: i64) -> StorageResult<u64>;

    /// Lists items with a quantity at or below `threshold`.
    async fn find_low_stock(&self, threshold: i32) -> StorageResult<Vec<Item>>;
}

/// A shareable repository trait object.
pub type DynItemRepository = Arc<dyn ItemRepository>;

#[async_trait]
impl<T: ItemRepository + ?Sized> ItemRepository for Arc<T> {
    async fn find_all(&self) -> StorageResult<Vec<Item>> {
        (**self).find_all().await
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>> {
        (**self).find_by_id(id).await
    }

    async fn save(&self, item: NewItem) -> StorageResult<Item> {
        (**self).save(item).await
    }

    async fn update(&self, item: &Item) -> StorageResult<u64> {
        (**self).update(item).await
    }

    async fn delete(&self, id: i64) -> StorageResult<u64> {
        (**self).delete(id).await
    }

    async fn find_low_stock(&self, threshold: i32) -> StorageResult<Vec<Item>> {
        (**self).find_low_stock(threshold).await
    }
}

/// An item repository backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct PgItemRepository {
    db: DbPool,
}

impl PgItemRepository {
    /// Creates a new repository.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> StorageResult<Vec<Item>> {
        tracing::info!("Listing items");
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, description, quantity, price FROM items
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .instrument(tracing::info_span!("fetch_all"))
        .await?;
        tracing::info!("Listed {} items", items.len());
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>> {
        tracing::info!("Reading item");
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, description, quantity, price FROM items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .instrument(tracing::info_span!("fetch_optional"))
        .await?;
        tracing::info!("Found item: {:?}", item);
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn save(&self, new_item: NewItem) -> StorageResult<Item> {
        tracing::info!("Creating item {:?}", new_item);
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, description, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, quantity, price
            "#,
        )
        .bind(new_item.name)
        .bind(new_item.description)
        .bind(new_item.quantity)
        .bind(new_item.price)
        .fetch_one(&self.db)
        .await?;
        tracing::info!("Created item {:?}", item);
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn update(&self, item: &Item) -> StorageResult<u64> {
        tracing::info!("Updating item");
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = $1, description = $2, quantity = $3, price = $4
            WHERE id = $5
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.id)
        .execute(&self.db)
        .await?;
        tracing::info!("Updated {} row(s)", result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StorageResult<u64> {
        tracing::info!("Deleting item");
        let result = sqlx::query(
            r#"
            DELETE FROM items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        tracing::info!("Deleted {} row(s)", result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn find_low_stock(&self, threshold: i32) -> StorageResult<Vec<Item>> {
        tracing::info!("Listing low-stock items");
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, description, quantity, price FROM items
            WHERE quantity <= $1
            ORDER BY id
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.db)
        .instrument(tracing::info_span!("fetch_all"))
        .await?;
        tracing::info!("Found {} low-stock items", items.len());
        Ok(items)
    }
}

/// An item repository that keeps everything in memory.
///
/// Ids start at 1 and are never reused.
#[derive(Clone, Debug, Default)]
pub struct InMemoryItemRepository {
    state: Arc<RwLock<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    items: BTreeMap<i64, Item>,
    last_id: i64,
}

impl InMemoryItemRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn find_all(&self) -> StorageResult<Vec<Item>> {
        let state = self.state.read().await;
        Ok(state.items.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Item>> {
        let state = self.state.read().await;
        Ok(state.items.get(&id).cloned())
    }

    async fn save(&self, new_item: NewItem) -> StorageResult<Item> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let item = Item {
            id: state.last_id,
            name: new_item.name,
            description: new_item.description,
            quantity: new_item.quantity,
            price: new_item.price,
        };
        state.items.insert(item.id, item.clone());
        tracing::debug!(item_id = item.id, "Stored item in memory");
        Ok(item)
    }

    async fn update(&self, item: &Item) -> StorageResult<u64> {
        let mut state = self.state.write().await;
        match state.items.get_mut(&item.id) {
            Some(stored) => {
                *stored = item.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: i64) -> StorageResult<u64> {
        let mut state = self.state.write().await;
        Ok(state.items.remove(&id).map_or(0, |_| 1))
    }

    async fn find_low_stock(&self, threshold: i32) -> StorageResult<Vec<Item>> {
        let state = self.state.read().await;
        Ok(state
            .items
            .values()
            .filter(|item| item.quantity <= threshold)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(name: &str, quantity: i32, price: f64) -> NewItem {
        NewItem {
            name: name.to_string(),
            description: None,
            quantity,
            price,
        }
    }

    #[tokio::test]
    async fn in_memory_save_assigns_increasing_ids() {
        let repo = InMemoryItemRepository::new();
        let first = repo.save(new_item("Foo", 1, 1.0)).await.unwrap();
        let second = repo.save(new_item("Bar", 2, 2.0)).await.unwrap();
        assert_eq!(1, first.id);
        assert_eq!(2, second.id);
        assert_eq!(vec![first, second], repo.find_all().await.unwrap());
    }

    #[tokio::test]
    async fn in_memory_ids_are_not_reused() {
        let repo = InMemoryItemRepository::new();
        let first = repo.save(new_item("Foo", 1, 1.0)).await.unwrap();
        assert_eq!(1, repo.delete(first.id).await.unwrap());
        let second = repo.save(new_item("Bar", 2, 2.0)).await.unwrap();
        assert_eq!(2, second.id);
    }

    #[tokio::test]
    async fn in_memory_update_and_delete_report_affected_rows() {
        let repo = InMemoryItemRepository::new();
        let mut item = repo.save(new_item("Foo", 1, 1.0)).await.unwrap();
        item.quantity = 10;
        assert_eq!(1, repo.update(&item).await.unwrap());
        assert_eq!(Some(item.clone()), repo.find_by_id(item.id).await.unwrap());

        assert_eq!(1, repo.delete(item.id).await.unwrap());
        assert_eq!(0, repo.delete(item.id).await.unwrap());
        assert_eq!(0, repo.update(&item).await.unwrap());
        assert_eq!(None, repo.find_by_id(item.id).await.unwrap());
    }

    #[tokio::test]
    async fn in_memory_low_stock_is_inclusive() {
        let repo = InMemoryItemRepository::new();
        repo.save(new_item("Empty", 0, 1.0)).await.unwrap();
        repo.save(new_item("Few", 5, 1.0)).await.unwrap();
        repo.save(new_item("Many", 6, 1.0)).await.unwrap();

        let names = |items: Vec<Item>| items.into_iter().map(|i| i.name).collect::<Vec<_>>();
        assert_eq!(vec!["Empty", "Few"], names(repo.find_low_stock(5).await.unwrap()));
        assert!(repo.find_low_stock(-1).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
    async fn postgres_save_then_find_returns_item(db: DbPool) {
        let repo = PgItemRepository::new(db);
        let item = repo
            .save(NewItem {
                name: "Foo".to_string(),
                description: Some(String::new()),
                quantity: 2,
                price: 3.5,
            })
            .await
            .unwrap();

        assert_eq!(Some(item.clone()), repo.find_by_id(item.id).await.unwrap());
        assert_eq!(vec![item], repo.find_all().await.unwrap());
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL pointing at a PostgreSQL server"]
    async fn postgres_update_delete_and_low_stock(db: DbPool) {
        let repo = PgItemRepository::new(db);
        let mut item = repo.save(new_item("Foo", 10, 1.0)).await.unwrap();
        repo.save(new_item("Bar", 1, 1.0)).await.unwrap();

        item.quantity = 2;
        assert_eq!(1, repo.update(&item).await.unwrap());
        assert_eq!(2, repo.find_low_stock(2).await.unwrap().len());

        assert_eq!(1, repo.delete(item.id).await.unwrap());
        assert_eq!(0, repo.delete(item.id).await.unwrap());
        assert_eq!(None, repo.find_by_id(item.id).await.unwrap());
    }
}
