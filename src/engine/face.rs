use super::error::EngineError;
use crate::model::face::FaceTemplate;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Dimensionality of the descriptors the capture client produces.
pub const EMBEDDING_DIM: usize = 128;

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

fn check_dim(embedding: &[f32]) -> Result<(), EngineError> {
    if embedding.len() != EMBEDDING_DIM {
        return Err(EngineError::InvalidEmbedding(EMBEDDING_DIM));
    }
    Ok(())
}

fn decode_embedding(raw: &str) -> Result<Vec<f32>, EngineError> {
    serde_json::from_str(raw).map_err(|e| EngineError::Db(sqlx::Error::Decode(Box::new(e))))
}

/// Upserts the employee's template; re-registration silently replaces the
/// prior one, no history is kept.
pub async fn register(
    pool: &SqlitePool,
    employee_id: &str,
    embedding: &[f32],
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    check_dim(embedding)?;
    let encoded = serde_json::to_string(embedding)
        .map_err(|e| EngineError::Db(sqlx::Error::Protocol(e.to_string())))?;

    sqlx::query(
        r#"
        INSERT INTO face_templates (employee_id, embedding, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (employee_id)
        DO UPDATE SET embedding = excluded.embedding, created_at = excluded.created_at
        "#,
    )
    .bind(employee_id)
    .bind(encoded)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn is_registered(pool: &SqlitePool, employee_id: &str) -> Result<bool, EngineError> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT employee_id FROM face_templates WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// The caller's stored template, for client-side verification.
pub async fn template(pool: &SqlitePool, employee_id: &str) -> Result<FaceTemplate, EngineError> {
    let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT employee_id, embedding, created_at FROM face_templates WHERE employee_id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some((employee_id, raw, created_at)) => Ok(FaceTemplate {
            employee_id,
            embedding: decode_embedding(&raw)?,
            created_at,
        }),
        None => Err(EngineError::NoTemplateRegistered),
    }
}

/// True iff the Euclidean distance between the submitted embedding and the
/// stored template is within the threshold. Whether a mismatch blocks the
/// clock event is the caller's decision (`WorkPolicy::face_enforced`).
pub async fn verify(
    pool: &SqlitePool,
    employee_id: &str,
    embedding: &[f32],
    threshold: f32,
) -> Result<bool, EngineError> {
    check_dim(embedding)?;
    let stored = template(pool, employee_id).await?;
    Ok(euclidean(embedding, &stored.embedding) <= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{seed_employee, test_pool};
    use chrono::TimeZone;

    fn embedding(fill: f32) -> Vec<f32> {
        vec![fill; EMBEDDING_DIM]
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn verify_without_template_fails() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;

        let err = verify(&pool, "emp-1", &embedding(0.1), 0.6)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NoTemplateRegistered));
    }

    #[tokio::test]
    async fn matching_embedding_within_threshold() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        register(&pool, "emp-1", &embedding(0.1), now()).await.unwrap();

        assert!(verify(&pool, "emp-1", &embedding(0.1), 0.6).await.unwrap());

        // Shift every component far enough that the distance exceeds 0.6.
        let mut off = embedding(0.1);
        for v in &mut off {
            *v += 0.1;
        }
        assert!(!verify(&pool, "emp-1", &off, 0.6).await.unwrap());
    }

    #[tokio::test]
    async fn reregistration_replaces_template() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;
        register(&pool, "emp-1", &embedding(0.1), now()).await.unwrap();
        register(&pool, "emp-1", &embedding(0.9), now()).await.unwrap();

        assert!(!verify(&pool, "emp-1", &embedding(0.1), 0.6).await.unwrap());
        assert!(verify(&pool, "emp-1", &embedding(0.9), 0.6).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_dimensionality_rejected() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;

        let err = register(&pool, "emp-1", &[0.1; 64], now()).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidEmbedding(EMBEDDING_DIM)));
    }

    #[tokio::test]
    async fn registration_flag_tracks_upsert() {
        let pool = test_pool().await;
        seed_employee(&pool, "emp-1").await;

        assert!(!is_registered(&pool, "emp-1").await.unwrap());
        register(&pool, "emp-1", &embedding(0.5), now()).await.unwrap();
        assert!(is_registered(&pool, "emp-1").await.unwrap());
        let stored = template(&pool, "emp-1").await.unwrap();
        assert_eq!(stored.embedding, embedding(0.5));
        assert_eq!(stored.employee_id, "emp-1");
    }
}
