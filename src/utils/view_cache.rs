use chrono::NaiveDate;
use moka::future::Cache;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const VIEW_CAPACITY: u64 = 10_000;
const VIEW_TTL_SECS: u64 = 300;

/// Identity of a cached derived view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKey {
    /// A filtered/sorted roster view, keyed by the query fingerprint.
    Roster(String),
    Departments,
    DailyRecords(NaiveDate),
    DailySummary(NaiveDate),
    History(i64),
    Calendar {
        employee_id: i64,
        year: i32,
        month: u32,
    },
}

/// A state change, named so it can declare exactly which derived views it
/// invalidates. Mutation handlers call [`ViewCache::apply`] with one of
/// these instead of blowing the whole cache away.
#[derive(Debug, Clone, Copy)]
pub enum Mutation {
    EmployeeCreated,
    EmployeeUpdated { id: i64 },
    EmployeeDeleted { id: i64 },
    AttendanceMarked { employee_id: i64, date: NaiveDate },
}

/// The views a mutation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every roster view and the department stats.
    RosterViews,
    /// The record list and summary of one date.
    Day(NaiveDate),
    /// Summaries of every date (roster size changed).
    AllSummaries,
    /// Every per-date view (records were removed across dates).
    AllDays,
    /// One employee's history and calendar grids.
    EmployeeViews(i64),
}

impl Mutation {
    /// The invalidation contract: which derived views each mutation
    /// invalidates. Everything not listed stays cached.
    pub fn invalidates(&self) -> Vec<Scope> {
        match *self {
            // A new employee changes roster views and every summary's
            // not-marked/rate denominators, but no per-date record list.
            Mutation::EmployeeCreated => vec![Scope::RosterViews, Scope::AllSummaries],
            // Profile edits only reshape roster views.
            Mutation::EmployeeUpdated { .. } => vec![Scope::RosterViews],
            // Deletion cascades into attendance, so every per-date view and
            // the employee's own views go too.
            Mutation::EmployeeDeleted { id } => {
                vec![Scope::RosterViews, Scope::AllDays, Scope::EmployeeViews(id)]
            }
            Mutation::AttendanceMarked { employee_id, date } => {
                vec![Scope::Day(date), Scope::EmployeeViews(employee_id)]
            }
        }
    }
}

/// Cache of serialized derived views with explicit, per-mutation
/// invalidation.
#[derive(Clone)]
pub struct ViewCache {
    views: Cache<ViewKey, Value>,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewCache {
    pub fn new() -> Self {
        Self {
            views: Cache::builder()
                .max_capacity(VIEW_CAPACITY)
                .time_to_live(Duration::from_secs(VIEW_TTL_SECS))
                .support_invalidation_closures()
                .build(),
        }
    }

    pub async fn get(&self, key: &ViewKey) -> Option<Value> {
        self.views.get(key).await
    }

    pub async fn put(&self, key: ViewKey, value: Value) {
        self.views.insert(key, value).await;
    }

    /// Evict every view the mutation declares, and nothing else.
    pub async fn apply(&self, mutation: Mutation) {
        debug!(?mutation, "Invalidating derived views");

        for scope in mutation.invalidates() {
            match scope {
                Scope::RosterViews => {
                    self.invalidate_matching(|k| matches!(k, ViewKey::Roster(_) | ViewKey::Departments));
                }
                Scope::Day(date) => {
                    self.views.invalidate(&ViewKey::DailyRecords(date)).await;
                    self.views.invalidate(&ViewKey::DailySummary(date)).await;
                }
                Scope::AllSummaries => {
                    self.invalidate_matching(|k| matches!(k, ViewKey::DailySummary(_)));
                }
                Scope::AllDays => {
                    self.invalidate_matching(|k| {
                        matches!(k, ViewKey::DailyRecords(_) | ViewKey::DailySummary(_))
                    });
                }
                Scope::EmployeeViews(id) => {
                    self.views.invalidate(&ViewKey::History(id)).await;
                    self.invalidate_matching(move |k| {
                        matches!(k, ViewKey::Calendar { employee_id, .. } if *employee_id == id)
                    });
                }
            }
        }
    }

    fn invalidate_matching<F>(&self, predicate: F)
    where
        F: Fn(&ViewKey) -> bool + Send + Sync + 'static,
    {
        if let Err(e) = self.views.invalidate_entries_if(move |k, _| predicate(k)) {
            warn!(error = %e, "View invalidation predicate rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    async fn seeded() -> ViewCache {
        let cache = ViewCache::new();
        cache.put(ViewKey::Roster("all".into()), json!({"v": 1})).await;
        cache.put(ViewKey::Departments, json!({"v": 2})).await;
        cache.put(ViewKey::DailyRecords(date(1)), json!({"v": 3})).await;
        cache.put(ViewKey::DailySummary(date(1)), json!({"v": 4})).await;
        cache.put(ViewKey::DailyRecords(date(2)), json!({"v": 5})).await;
        cache.put(ViewKey::DailySummary(date(2)), json!({"v": 6})).await;
        cache.put(ViewKey::History(7), json!({"v": 7})).await;
        cache
            .put(ViewKey::Calendar { employee_id: 7, year: 2024, month: 2 }, json!({"v": 8}))
            .await;
        cache
    }

    #[actix_web::test]
    async fn marking_attendance_evicts_one_day_and_one_employee() {
        let cache = seeded().await;
        cache
            .apply(Mutation::AttendanceMarked { employee_id: 7, date: date(1) })
            .await;

        assert!(cache.get(&ViewKey::DailyRecords(date(1))).await.is_none());
        assert!(cache.get(&ViewKey::DailySummary(date(1))).await.is_none());
        assert!(cache.get(&ViewKey::History(7)).await.is_none());
        assert!(
            cache
                .get(&ViewKey::Calendar { employee_id: 7, year: 2024, month: 2 })
                .await
                .is_none()
        );

        // Untouched scopes stay cached.
        assert!(cache.get(&ViewKey::DailyRecords(date(2))).await.is_some());
        assert!(cache.get(&ViewKey::Roster("all".into())).await.is_some());
        assert!(cache.get(&ViewKey::Departments).await.is_some());
    }

    #[actix_web::test]
    async fn creating_an_employee_keeps_record_lists() {
        let cache = seeded().await;
        cache.apply(Mutation::EmployeeCreated).await;

        assert!(cache.get(&ViewKey::Roster("all".into())).await.is_none());
        assert!(cache.get(&ViewKey::Departments).await.is_none());
        // Summaries depend on the roster size; record lists do not.
        assert!(cache.get(&ViewKey::DailySummary(date(1))).await.is_none());
        assert!(cache.get(&ViewKey::DailyRecords(date(1))).await.is_some());
        assert!(cache.get(&ViewKey::History(7)).await.is_some());
    }

    #[actix_web::test]
    async fn deleting_an_employee_evicts_everything_it_touches() {
        let cache = seeded().await;
        cache.apply(Mutation::EmployeeDeleted { id: 7 }).await;

        assert!(cache.get(&ViewKey::Roster("all".into())).await.is_none());
        assert!(cache.get(&ViewKey::DailyRecords(date(1))).await.is_none());
        assert!(cache.get(&ViewKey::DailySummary(date(2))).await.is_none());
        assert!(cache.get(&ViewKey::History(7)).await.is_none());
    }

    #[actix_web::test]
    async fn profile_edits_leave_attendance_views_alone() {
        let cache = seeded().await;
        cache.apply(Mutation::EmployeeUpdated { id: 7 }).await;

        assert!(cache.get(&ViewKey::Roster("all".into())).await.is_none());
        assert!(cache.get(&ViewKey::DailyRecords(date(1))).await.is_some());
        assert!(cache.get(&ViewKey::DailySummary(date(1))).await.is_some());
        assert!(cache.get(&ViewKey::History(7)).await.is_some());
    }
}
