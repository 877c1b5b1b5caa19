pub mod authority;
pub mod clock;
pub mod error;
pub mod evidence;
pub mod face;
pub mod geofence;
pub mod ledger;
pub mod requests;
pub mod shifts;
pub mod stats;

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::model::leave::LeaveKind;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    /// Fresh in-memory store with the schema applied. Single connection so
    /// the whole test sees one database.
    pub async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        pool
    }

    pub async fn seed_employee(pool: &SqlitePool, id: &str) {
        sqlx::query("INSERT INTO employees (id, full_name) VALUES (?, ?)")
            .bind(id)
            .bind("Test Employee")
            .execute(pool)
            .await
            .unwrap();
    }

    /// Pre-creates a balance row, overriding the type's default allotment.
    pub async fn seed_balance(
        pool: &SqlitePool,
        employee_id: &str,
        kind: LeaveKind,
        period: i64,
        allotted: i64,
    ) {
        sqlx::query(
            r#"
            INSERT INTO leave_balances (employee_id, leave_type, period, allotted, used, held)
            VALUES (?, ?, ?, ?, 0, 0)
            "#,
        )
        .bind(employee_id)
        .bind(kind)
        .bind(period)
        .bind(allotted)
        .execute(pool)
        .await
        .unwrap();
    }
}
