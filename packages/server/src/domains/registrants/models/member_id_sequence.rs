use sqlx::PgPool;

/// Per-prefix member id counter (`member_id_sequences` table)
pub struct MemberIdSequence;

impl MemberIdSequence {
    /// Atomically advance the counter for `prefix` and return the new value.
    ///
    /// A missing counter row is seeded from the highest sequence already
    /// stored for the prefix, and an existing row is pulled forward if rows
    /// were written past it, so the counter never hands out a used suffix.
    /// The upsert holds the counter row lock, so concurrent callers serialise
    /// on the prefix and each receive a distinct value.
    pub async fn next_value(prefix: &str, pool: &PgPool) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO member_id_sequences (prefix, last_value)
             VALUES (
                $1,
                COALESCE(
                    (SELECT MAX(member_id_seq) FROM registrants WHERE member_id_prefix = $1),
                    0
                ) + 1
             )
             ON CONFLICT (prefix) DO UPDATE
             SET last_value = GREATEST(member_id_sequences.last_value, EXCLUDED.last_value - 1) + 1,
                 updated_at = NOW()
             RETURNING last_value",
        )
        .bind(prefix)
        .fetch_one(pool)
        .await
    }

    /// Current counter value, if the prefix has ever been allocated
    pub async fn current_value(prefix: &str, pool: &PgPool) -> sqlx::Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT last_value FROM member_id_sequences WHERE prefix = $1")
            .bind(prefix)
            .fetch_optional(pool)
            .await
    }
}
