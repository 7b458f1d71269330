use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{IdKind, MemberId, RegistrantFilter, RegistrantStatus, Sector, StatusFilter};
use crate::common::RegistrantId;
use crate::domains::registrants::RegistryError;

/// Registrant - a constituent enrolled through the portal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registrant {
    pub id: RegistrantId,
    pub full_name: String,

    /// Raw sector slug as submitted (normalised); may be unknown to the table
    pub sector: Option<String>,

    /// `None` only for legacy rows with a NULL/blank status
    pub status: Option<RegistrantStatus>,
    pub member_id: Option<MemberId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a new registrant
#[derive(Debug, Clone, Deserialize)]
pub struct NewRegistrant {
    pub full_name: String,
    #[serde(default)]
    pub sector: Option<String>,
}

impl NewRegistrant {
    pub fn new(full_name: impl Into<String>, sector: Option<&str>) -> Self {
        Self {
            full_name: full_name.into(),
            sector: sector.map(str::to_string),
        }
    }

    /// Trim the name and normalise the sector slug.
    pub fn normalized(self) -> Result<Self, RegistryError> {
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(RegistryError::InvalidInput(
                "full_name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            full_name,
            sector: Sector::normalize_slug(self.sector.as_deref()),
        })
    }
}

impl Registrant {
    /// Build a fresh `pending` registrant with no member id yet.
    pub fn from_new(input: NewRegistrant) -> Self {
        let now = Utc::now();
        Self {
            id: RegistrantId::new(),
            full_name: input.full_name,
            sector: input.sector,
            status: Some(RegistrantStatus::Pending),
            member_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// SQL persistence
// =============================================================================

#[derive(sqlx::FromRow)]
struct RegistrantRow {
    id: RegistrantId,
    full_name: String,
    sector: Option<String>,
    status: Option<String>,
    member_id_prefix: Option<String>,
    member_id_seq: Option<i64>,
    member_id_kind: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrantRow> for Registrant {
    type Error = anyhow::Error;

    fn try_from(row: RegistrantRow) -> Result<Self> {
        let member_id = match (row.member_id_prefix, row.member_id_seq, row.member_id_kind) {
            (Some(prefix), Some(seq), Some(kind)) => Some(MemberId::new(
                prefix,
                u32::try_from(seq).context("Negative member id sequence")?,
                kind.parse::<IdKind>()?,
            )),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            full_name: row.full_name,
            sector: row.sector,
            status: RegistrantStatus::from_column(row.status.as_deref())?,
            member_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &RegistrantFilter) {
    qb.push(" WHERE TRUE");

    match &filter.status {
        StatusFilter::Any => {}
        StatusFilter::Missing => {
            qb.push(" AND (status IS NULL OR btrim(status) = '')");
        }
        StatusFilter::Is(status) => {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        StatusFilter::In(statuses) => {
            let values: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
            qb.push(" AND status = ANY(").push_bind(values).push(")");
        }
    }

    if let Some(sector) = &filter.sector {
        qb.push(" AND sector = ").push_bind(sector.clone());
    }
    if let Some(prefix) = &filter.member_id_prefix {
        qb.push(" AND member_id_prefix = ").push_bind(prefix.clone());
    }
    match filter.has_member_id {
        Some(true) => {
            qb.push(" AND member_id IS NOT NULL");
        }
        Some(false) => {
            qb.push(" AND member_id IS NULL");
        }
        None => {}
    }
    if let Some(after) = filter.after {
        qb.push(" AND id > ").push_bind(after);
    }
}

impl Registrant {
    /// Insert a registrant row, member id columns included.
    ///
    /// Returns the raw sqlx error so a taken `member_id` can be told apart
    /// from other failures.
    pub async fn insert(&self, pool: &PgPool) -> sqlx::Result<Self> {
        let (member_id, prefix, seq, kind) = member_id_columns(self.member_id.as_ref());

        let row = sqlx::query_as::<_, RegistrantRow>(
            "INSERT INTO registrants (
                id, full_name, sector, status,
                member_id, member_id_prefix, member_id_seq, member_id_kind,
                created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(self.id)
        .bind(&self.full_name)
        .bind(&self.sector)
        .bind(self.status.map(|s| s.as_str()))
        .bind(member_id)
        .bind(prefix)
        .bind(seq)
        .bind(kind)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await?;

        Self::try_from(row).map_err(|e| sqlx::Error::Decode(e.into()))
    }

    /// Find registrant by ID
    pub async fn find_by_id(id: RegistrantId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, RegistrantRow>("SELECT * FROM registrants WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(Self::try_from)
            .transpose()
    }

    /// Find registrants matching a filter, ordered by id
    pub async fn find(filter: &RegistrantFilter, pool: &PgPool) -> Result<Vec<Self>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM registrants");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY id");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        qb.build_query_as::<RegistrantRow>()
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Self::try_from)
            .collect()
    }

    /// Count registrants matching a filter (`limit` is ignored)
    pub async fn count(filter: &RegistrantFilter, pool: &PgPool) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM registrants");
        push_filter(&mut qb, filter);

        qb.build_query_scalar::<i64>()
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Write status and member id fields in a single statement, but only if
    /// the row still holds the status and member id of `expected`.
    ///
    /// A blank status column compares equal to `None`. Returns the raw sqlx
    /// error so callers can tell unique violations on `member_id` apart from
    /// other failures. `Ok(None)` if the row is gone or has moved on.
    pub async fn update_identity(
        &self,
        expected: &Registrant,
        pool: &PgPool,
    ) -> sqlx::Result<Option<Self>> {
        let (member_id, prefix, seq, kind) = member_id_columns(self.member_id.as_ref());

        let row = sqlx::query_as::<_, RegistrantRow>(
            "UPDATE registrants
             SET status = $2,
                 member_id = $3,
                 member_id_prefix = $4,
                 member_id_seq = $5,
                 member_id_kind = $6,
                 updated_at = NOW()
             WHERE id = $1
               AND NULLIF(BTRIM(status), '') IS NOT DISTINCT FROM $7::TEXT
               AND member_id IS NOT DISTINCT FROM $8::TEXT
             RETURNING *",
        )
        .bind(self.id)
        .bind(self.status.map(|s| s.as_str()))
        .bind(member_id)
        .bind(prefix)
        .bind(seq)
        .bind(kind)
        .bind(expected.status.map(|s| s.as_str()))
        .bind(expected.member_id.as_ref().map(|m| m.value()))
        .fetch_optional(pool)
        .await?;

        row.map(Self::try_from)
            .transpose()
            .map_err(|e| sqlx::Error::Decode(e.into()))
    }
}

fn member_id_columns(
    member_id: Option<&MemberId>,
) -> (Option<String>, Option<String>, Option<i64>, Option<&'static str>) {
    match member_id {
        Some(id) => (
            Some(id.value()),
            Some(id.prefix().to_string()),
            Some(i64::from(id.sequence())),
            Some(id.kind().as_str()),
        ),
        None => (None, None, None, None),
    }
}
