//! Dense `sort_order` maintenance for sibling collections
//!
//! Members of one sibling group always occupy exactly `0..count`. A new member
//! takes `max + 1` read from storage at call time; removing a member shifts
//! every later sibling down by one inside the same transaction as the delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::error::{CatalogError, Result};

/// A sibling group: rows of `collection` whose `owner_key` column equals `owner`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SortScope {
    pub collection: &'static str,
    pub owner_key: &'static str,
    pub owner: Uuid,
}

/// Storage operations the ordering logic needs. Every call runs inside the
/// transaction this value represents.
#[async_trait]
pub trait OrderingTx: Send {
    /// Serialize writers of `scope` until the transaction ends.
    async fn lock_scope(&mut self, scope: &SortScope) -> Result<()>;

    async fn find_max_order(&mut self, scope: &SortScope) -> Result<Option<i32>>;

    /// Add `delta` to every `sort_order` in `scope` strictly greater than `threshold`.
    async fn update_orders_greater_than(&mut self, scope: &SortScope, threshold: i32, delta: i32) -> Result<u64>;
}

pub trait SortableMember {
    fn sort_order(&self) -> Option<i32>;
    fn set_sort_order(&mut self, order: i32);
    /// Tie breaker when two siblings share a `sort_order`.
    fn secondary_key(&self) -> (DateTime<Utc>, Uuid);
}

/// Ordering rules for one kind of member. The owner supplies the scoping
/// function; the collection never inspects the member beyond it.
pub struct OrderedCollection<M> {
    collection: &'static str,
    owner_key: &'static str,
    owner_of: fn(&M) -> Option<Uuid>,
}

impl<M> Clone for OrderedCollection<M> {
    fn clone(&self) -> Self { *self }
}
impl<M> Copy for OrderedCollection<M> {}

impl<M: SortableMember + Sync> OrderedCollection<M> {
    pub const fn new(collection: &'static str, owner_key: &'static str, owner_of: fn(&M) -> Option<Uuid>) -> Self {
        Self { collection, owner_key, owner_of }
    }

    pub fn collection(&self) -> &'static str { self.collection }

    /// `None` when the member has no owner.
    pub fn scope(&self, member: &M) -> Option<SortScope> {
        (self.owner_of)(member).map(|owner| SortScope { collection: self.collection, owner_key: self.owner_key, owner })
    }

    /// Next free position for `member`'s sibling group. An unresolved scope
    /// counts as an empty group.
    pub async fn next_order<T: OrderingTx + ?Sized>(&self, tx: &mut T, member: &M) -> Result<i32> {
        let Some(scope) = self.scope(member) else {
            tracing::debug!(collection = self.collection, "no owner, next order is 0");
            return Ok(0);
        };
        tx.lock_scope(&scope).await?;
        let next = match tx.find_max_order(&scope).await? {
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| CatalogError::Storage(format!("sort_order overflow in {} for {}", self.collection, scope.owner)))?,
            None => 0,
        };
        tracing::debug!(collection = self.collection, owner = %scope.owner, next, "next sort order");
        Ok(next)
    }

    /// Assign the next position to a member about to be inserted.
    pub async fn assign_next_order<T: OrderingTx + ?Sized>(&self, tx: &mut T, member: &mut M) -> Result<i32> {
        let next = self.next_order(tx, member).await?;
        member.set_sort_order(next);
        Ok(next)
    }

    /// Close the gap left by `removed`. Must run in the transaction that
    /// deletes it. Returns the number of siblings shifted.
    pub async fn compact_after_removal<T: OrderingTx + ?Sized>(&self, tx: &mut T, removed: &M) -> Result<u64> {
        let (Some(scope), Some(order)) = (self.scope(removed), removed.sort_order()) else {
            return Ok(0);
        };
        tx.lock_scope(&scope).await?;
        let shifted = tx.update_orders_greater_than(&scope, order, -1).await?;
        tracing::debug!(collection = self.collection, owner = %scope.owner, removed = order, shifted, "compacted");
        Ok(shifted)
    }
}

/// Enumeration order: `sort_order` ascending (unset last), then the secondary key.
pub fn sort_siblings<M: SortableMember>(members: &mut [M]) {
    members.sort_by(compare_members);
}

fn compare_members<M: SortableMember>(a: &M, b: &M) -> Ordering {
    let by_order = match (a.sort_order(), b.sort_order()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_order.then_with(|| a.secondary_key().cmp(&b.secondary_key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Clone, Debug)]
    struct Row { id: Uuid, owner: Option<Uuid>, order: Option<i32>, created_at: DateTime<Utc> }

    impl SortableMember for Row {
        fn sort_order(&self) -> Option<i32> { self.order }
        fn set_sort_order(&mut self, order: i32) { self.order = Some(order); }
        fn secondary_key(&self) -> (DateTime<Utc>, Uuid) { (self.created_at, self.id) }
    }

    fn row_owner(r: &Row) -> Option<Uuid> { r.owner }
    const ROWS: OrderedCollection<Row> = OrderedCollection::new("rows", "owner_id", row_owner);

    #[derive(Default)]
    struct VecTx { rows: Vec<Row>, locks: HashMap<Uuid, usize> }

    #[async_trait]
    impl OrderingTx for VecTx {
        async fn lock_scope(&mut self, scope: &SortScope) -> Result<()> {
            *self.locks.entry(scope.owner).or_default() += 1;
            Ok(())
        }
        async fn find_max_order(&mut self, scope: &SortScope) -> Result<Option<i32>> {
            Ok(self.rows.iter().filter(|r| r.owner == Some(scope.owner)).filter_map(|r| r.order).max())
        }
        async fn update_orders_greater_than(&mut self, scope: &SortScope, threshold: i32, delta: i32) -> Result<u64> {
            let mut n = 0;
            for r in self.rows.iter_mut().filter(|r| r.owner == Some(scope.owner)) {
                if let Some(o) = r.order.filter(|o| *o > threshold) {
                    r.order = Some(o + delta);
                    n += 1;
                }
            }
            Ok(n)
        }
    }

    fn row(owner: Option<Uuid>) -> Row {
        Row { id: Uuid::new_v4(), owner, order: None, created_at: Utc::now() }
    }

    async fn insert(tx: &mut VecTx, mut r: Row) -> Row {
        ROWS.assign_next_order(tx, &mut r).await.unwrap();
        tx.rows.push(r.clone());
        r
    }

    async fn remove(tx: &mut VecTx, r: &Row) {
        tx.rows.retain(|x| x.id != r.id);
        ROWS.compact_after_removal(tx, r).await.unwrap();
    }

    fn orders(tx: &VecTx, owner: Uuid) -> Vec<i32> {
        let mut v: Vec<i32> = tx.rows.iter().filter(|r| r.owner == Some(owner)).filter_map(|r| r.order).collect();
        v.sort();
        v
    }

    #[tokio::test]
    async fn test_next_order_empty_and_after_inserts() {
        let mut tx = VecTx::default();
        let owner = Uuid::new_v4();
        assert_eq!(ROWS.next_order(&mut tx, &row(Some(owner))).await.unwrap(), 0);
        for _ in 0..3 { insert(&mut tx, row(Some(owner))).await; }
        assert_eq!(ROWS.next_order(&mut tx, &row(Some(owner))).await.unwrap(), 3);
        assert_eq!(tx.locks[&owner], 5);
    }

    #[tokio::test]
    async fn test_next_order_ignores_history() {
        let mut tx = VecTx::default();
        let owner = Uuid::new_v4();
        let made: Vec<Row> = {
            let mut v = vec![];
            for _ in 0..5 { v.push(insert(&mut tx, row(Some(owner))).await); }
            v
        };
        remove(&mut tx, &made[4]).await;
        remove(&mut tx, &made[3]).await;
        assert_eq!(orders(&tx, owner), vec![0, 1, 2]);
        assert_eq!(ROWS.next_order(&mut tx, &row(Some(owner))).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_middle_compacts() {
        let mut tx = VecTx::default();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut made = vec![];
        for _ in 0..4 { made.push(insert(&mut tx, row(Some(owner))).await); }
        for _ in 0..2 { insert(&mut tx, row(Some(other))).await; }

        remove(&mut tx, &made[1]).await;

        assert_eq!(orders(&tx, owner), vec![0, 1, 2]);
        let find = |id: Uuid| tx.rows.iter().find(|r| r.id == id).unwrap().order;
        assert_eq!(find(made[2].id), Some(1));
        assert_eq!(find(made[3].id), Some(2));
        assert_eq!(orders(&tx, other), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_next_order_overflow_is_an_error() {
        let mut tx = VecTx::default();
        let owner = Uuid::new_v4();
        let mut full = row(Some(owner));
        full.order = Some(i32::MAX);
        tx.rows.push(full);
        assert!(matches!(ROWS.next_order(&mut tx, &row(Some(owner))).await, Err(CatalogError::Storage(_))));
    }

    #[tokio::test]
    async fn test_unresolved_scope_is_empty() {
        let mut tx = VecTx::default();
        let mut orphan = row(None);
        assert_eq!(ROWS.assign_next_order(&mut tx, &mut orphan).await.unwrap(), 0);
        assert_eq!(ROWS.compact_after_removal(&mut tx, &orphan).await.unwrap(), 0);
        assert!(tx.locks.is_empty());
    }

    #[tokio::test]
    async fn test_unset_order_compaction_is_noop() {
        let mut tx = VecTx::default();
        let owner = Uuid::new_v4();
        insert(&mut tx, row(Some(owner))).await;
        let legacy = row(Some(owner));
        assert_eq!(ROWS.compact_after_removal(&mut tx, &legacy).await.unwrap(), 0);
        assert_eq!(orders(&tx, owner), vec![0]);
    }

    #[test]
    fn test_sort_siblings_breaks_ties() {
        let base = Utc::now();
        let mk = |order: Option<i32>, secs: i64| Row {
            id: Uuid::new_v4(),
            owner: None,
            order,
            created_at: base + chrono::Duration::seconds(secs),
        };
        let mut rows = vec![mk(None, 0), mk(Some(1), 5), mk(Some(0), 9), mk(Some(1), 1)];
        sort_siblings(&mut rows);
        let got: Vec<(Option<i32>, i64)> =
            rows.iter().map(|r| (r.order, (r.created_at - base).num_seconds())).collect();
        assert_eq!(got, vec![(Some(0), 9), (Some(1), 1), (Some(1), 5), (None, 0)]);
    }
}
