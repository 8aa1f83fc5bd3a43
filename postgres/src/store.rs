//! The sqlx-backed store implementation.
//!
//! Reads assemble the actor's snapshot from separate read-committed queries;
//! strict cross-query consistency is not promised and the cache tolerates
//! that. Writes insert and then return the authoritative row so the gateway
//! can broadcast exactly what the database holds.

use async_trait::async_trait;
use rollcall_core::{
    CheckIn, EventId, EventRecord, GroupRecord, InvitedGroup, NewCheckIn, NewEvent, NewInvitation,
    Role, StoreError, SummarySnapshot, SummaryStore,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;

// ============================================================================
// Row shapes
// ============================================================================

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    name: String,
    date: chrono::NaiveDate,
    start_time: chrono::NaiveTime,
    location: String,
    latitude: f64,
    longitude: f64,
    radius_m: f64,
    expected_attendees: i64,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId(row.id),
            name: row.name,
            date: row.date,
            start_time: row.start_time,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
            radius_m: row.radius_m,
            expected_attendees: row.expected_attendees,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CheckInRow {
    id: i64,
    event_id: i64,
    recorded_at: i64,
    name: String,
    group_id: i64,
    group_name: String,
    job_title: Option<String>,
    staff_type: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    device_id: Option<String>,
    event_name: Option<String>,
}

impl From<CheckInRow> for CheckIn {
    fn from(row: CheckInRow) -> Self {
        Self {
            id: row.id,
            event_id: EventId(row.event_id),
            recorded_at: row.recorded_at,
            name: row.name,
            group_id: row.group_id,
            group_name: row.group_name,
            position: row.job_title,
            staff_type: row.staff_type,
            gender: row.gender,
            phone: row.phone,
            email: row.email,
            latitude: row.latitude,
            longitude: row.longitude,
            device_id: row.device_id,
            event_name: row.event_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InvitationRow {
    id: i64,
    event_id: i64,
    group_id: i64,
    group_name: String,
    category_name: String,
}

impl From<InvitationRow> for InvitedGroup {
    fn from(row: InvitationRow) -> Self {
        Self {
            id: row.id,
            event_id: EventId(row.event_id),
            group_id: row.group_id,
            group_name: row.group_name,
            category_name: row.category_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i64,
    name: String,
    category_id: i64,
    category_name: String,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            category_name: row.category_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    username: String,
    password_hash: String,
    role: String,
    event_id: Option<i64>,
}

/// An active administrator account as stored.
#[derive(Debug, Clone)]
pub struct AdminRecord {
    /// Account identifier.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Stored password hash, `PBKDF2:SHA-256:iter:salt:hash` format.
    pub password_hash: String,
    /// Resolved privilege level.
    pub role: Role,
    /// The one event this admin manages, if scoped.
    pub event_id: Option<EventId>,
}

impl From<AdminRow> for AdminRecord {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role: parse_role(&row.role),
            event_id: row.event_id.map(EventId),
        }
    }
}

/// Stored roles are `admin` or `super`; anything unrecognized degrades to
/// the less privileged of the two.
fn parse_role(raw: &str) -> Role {
    match raw {
        "super" => Role::Super,
        _ => Role::Admin,
    }
}

fn map_err(source: sqlx::Error) -> StoreError {
    match source {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::MalformedRow(source.to_string()),
        other => StoreError::Unavailable(other.to_string()),
    }
}

// ============================================================================
// Store
// ============================================================================

/// sqlx-backed store over a `PostgreSQL` connection pool.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a bounded pool to the given database URL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be
    /// reached.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_err)?;
        Ok(Self { pool })
    }

    /// Apply embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|source| StoreError::Unavailable(source.to_string()))
    }

    /// Insert a check-in with a server-assigned timestamp and return the
    /// stored row joined with its event name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert or the read-back fails.
    pub async fn insert_check_in(&self, input: NewCheckIn) -> Result<CheckIn, StoreError> {
        let recorded_at = chrono::Utc::now().timestamp_millis();
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO check_ins
                (event_id, recorded_at, name, group_id, group_name, job_title,
                 staff_type, gender, phone, email, latitude, longitude, device_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            ",
        )
        .bind(input.event_id.0)
        .bind(recorded_at)
        .bind(&input.name)
        .bind(input.group_id)
        .bind(&input.group_name)
        .bind(&input.position)
        .bind(&input.staff_type)
        .bind(&input.gender)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.device_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;

        debug!(event = %input.event_id, check_in = id, "check-in stored");
        let row: CheckInRow = sqlx::query_as(
            r"
            SELECT c.id, c.event_id, c.recorded_at, c.name, c.group_id,
                   c.group_name, c.job_title, c.staff_type, c.gender, c.phone,
                   c.email, c.latitude, c.longitude, c.device_id,
                   e.name AS event_name
            FROM check_ins c
            JOIN events e ON e.id = c.event_id
            WHERE c.id = $1
            ",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.into())
    }

    /// Insert an invitation and return it joined with group and category
    /// names.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert or the read-back fails.
    pub async fn insert_invitation(
        &self,
        input: NewInvitation,
    ) -> Result<InvitedGroup, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO invitations (event_id, group_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(input.event_id.0)
        .bind(input.group_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;

        let row: InvitationRow = sqlx::query_as(
            r"
            SELECT i.id, i.event_id, i.group_id,
                   g.name AS group_name, c.name AS category_name
            FROM invitations i
            JOIN groups g ON g.id = i.group_id
            JOIN categories c ON c.id = g.category_id
            WHERE i.id = $1
            ",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.into())
    }

    /// Insert a new event and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    pub async fn insert_event(&self, input: NewEvent) -> Result<EventRecord, StoreError> {
        let row: EventRow = sqlx::query_as(
            r"
            INSERT INTO events
                (name, date, start_time, location, latitude, longitude,
                 radius_m, expected_attendees)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, date, start_time, location, latitude,
                      longitude, radius_m, expected_attendees
            ",
        )
        .bind(&input.name)
        .bind(input.date)
        .bind(input.start_time)
        .bind(&input.location)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.radius_m)
        .bind(input.expected_attendees)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.into())
    }

    /// Find a category by name, creating it if absent. Returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the upsert fails.
    pub async fn find_or_create_category(&self, name: &str) -> Result<i64, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO categories (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(id)
    }

    /// Find a group by name within a category, creating it if absent.
    /// Returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the upsert fails.
    pub async fn find_or_create_group(
        &self,
        category_id: i64,
        name: &str,
    ) -> Result<i64, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO groups (category_id, name) VALUES ($1, $2)
            ON CONFLICT (category_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(category_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(id)
    }

    /// Look up an active administrator account by login name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, StoreError> {
        let row: Option<AdminRow> = sqlx::query_as(
            r"
            SELECT id, username, password_hash, role, event_id
            FROM admins
            WHERE username = $1 AND active
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.map(Into::into))
    }

    /// Every group with its category, for the admin form dropdowns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn all_groups(&self) -> Result<Vec<GroupRecord>, StoreError> {
        let rows: Vec<GroupRow> = sqlx::query_as(
            r"
            SELECT g.id, g.name, c.id AS category_id, c.name AS category_name
            FROM groups g
            JOIN categories c ON c.id = g.category_id
            ORDER BY c.name, g.name
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Gender labels for the public form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn genders(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar("SELECT label FROM genders ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    /// Employment-type labels for the public form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn staff_types(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar("SELECT label FROM staff_types ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)
    }

    /// One event by id, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn event_by_id(&self, event_id: EventId) -> Result<Option<EventRecord>, StoreError> {
        let row: Option<EventRow> = sqlx::query_as(
            r"
            SELECT id, name, date, start_time, location, latitude, longitude,
                   radius_m, expected_attendees
            FROM events
            WHERE id = $1
            ",
        )
        .bind(event_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl SummaryStore for PostgresStore {
    async fn load_summary(&self, event_id: EventId) -> Result<SummarySnapshot, StoreError> {
        let event = self.event_by_id(event_id).await?;
        let invited_groups = self.invitation_list(event_id).await?;

        let attended_group_names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT group_name FROM check_ins WHERE event_id = $1",
        )
        .bind(event_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;

        let (checked_in_count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM check_ins WHERE event_id = $1")
                .bind(event_id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(map_err)?;

        Ok(SummarySnapshot {
            event,
            invited_groups,
            attended_group_names,
            checked_in_count: checked_in_count.max(0).unsigned_abs(),
        })
    }

    async fn roster(&self, event_id: EventId) -> Result<Vec<CheckIn>, StoreError> {
        let rows: Vec<CheckInRow> = sqlx::query_as(
            r"
            SELECT c.id, c.event_id, c.recorded_at, c.name, c.group_id,
                   c.group_name, c.job_title, c.staff_type, c.gender, c.phone,
                   c.email, c.latitude, c.longitude, c.device_id,
                   e.name AS event_name
            FROM check_ins c
            JOIN events e ON e.id = c.event_id
            WHERE c.event_id = $1
            ORDER BY c.recorded_at, c.id
            ",
        )
        .bind(event_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn event_list(&self) -> Result<Vec<EventRecord>, StoreError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r"
            SELECT id, name, date, start_time, location, latitude, longitude,
                   radius_m, expected_attendees
            FROM events
            ORDER BY id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn invitation_list(&self, event_id: EventId) -> Result<Vec<InvitedGroup>, StoreError> {
        let rows: Vec<InvitationRow> = sqlx::query_as(
            r"
            SELECT i.id, i.event_id, i.group_id,
                   g.name AS group_name, c.name AS category_name
            FROM invitations i
            JOIN groups g ON g.id = i.group_id
            JOIN categories c ON c.id = g.category_id
            WHERE i.event_id = $1
            ORDER BY i.id
            ",
        )
        .bind(event_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
