// ============================================================
// REPORT REPOSITORY
// ============================================================
// SQLite persistence for websites, uploaded reports and their records

use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    QueryBuilder, Sqlite, SqliteConnection,
};

use crate::domain::dashboard::{DashboardFilter, DetailedRow};
use crate::domain::error::{AppError, Result};
use crate::domain::report::{ParsedReport, ReportRecord, ReportType};
use crate::domain::website::{NewWebsite, StoreOutcome, StoredReport, Website};

const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS websites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    url TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    website_id INTEGER NOT NULL REFERENCES websites(id) ON DELETE CASCADE,
    report_type TEXT NOT NULL,
    filename TEXT NOT NULL,
    upload_date DATETIME NOT NULL,
    processed_at DATETIME,
    created_date DATETIME
);

CREATE INDEX IF NOT EXISTS idx_reports_website ON reports(website_id);

CREATE TABLE IF NOT EXISTS misspellings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    word TEXT NOT NULL,
    spelling_suggestion TEXT,
    language TEXT,
    first_detected DATETIME,
    pages_count INTEGER
);

CREATE INDEX IF NOT EXISTS idx_misspellings_report ON misspellings(report_id);

CREATE TABLE IF NOT EXISTS words_to_review (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    word TEXT NOT NULL,
    spelling_suggestion TEXT,
    language TEXT,
    first_detected DATETIME,
    misspelling_probability TEXT,
    pages_count INTEGER
);

CREATE INDEX IF NOT EXISTS idx_words_to_review_report ON words_to_review(report_id);

CREATE TABLE IF NOT EXISTS pages_with_misspellings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    title TEXT,
    url TEXT,
    page_report_link TEXT,
    cms_link TEXT,
    misspellings_count INTEGER,
    words_to_review_count INTEGER,
    page_level INTEGER
);

CREATE INDEX IF NOT EXISTS idx_pages_report ON pages_with_misspellings(report_id);

CREATE TABLE IF NOT EXISTS misspelling_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_id INTEGER NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
    report_date DATETIME NOT NULL,
    misspellings_count INTEGER,
    words_to_review_count INTEGER
);

CREATE INDEX IF NOT EXISTS idx_history_report ON misspelling_history(report_id);
"#;

/// Date a report is charted under: its Created: line, else the upload time.
/// Both are naive local times.
const REPORT_DATE: &str = "COALESCE(r.created_date, r.upload_date)";

/// The two tables holding word-level records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordTable {
    Misspellings,
    WordsToReview,
}

impl WordTable {
    fn selected(filter: &DashboardFilter) -> Vec<WordTable> {
        let mut tables = Vec::new();
        if filter.includes(ReportType::Misspellings) {
            tables.push(WordTable::Misspellings);
        }
        if filter.includes(ReportType::WordsToReview) {
            tables.push(WordTable::WordsToReview);
        }
        tables
    }

    fn table(&self) -> &'static str {
        match self {
            WordTable::Misspellings => "misspellings",
            WordTable::WordsToReview => "words_to_review",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            WordTable::Misspellings => "Misspelling",
            WordTable::WordsToReview => "Word to Review",
        }
    }

    fn probability_column(&self) -> &'static str {
        match self {
            WordTable::Misspellings => "NULL",
            WordTable::WordsToReview => "x.misspelling_probability",
        }
    }
}

fn record_table(report_type: ReportType) -> &'static str {
    match report_type {
        ReportType::Misspellings => "misspellings",
        ReportType::WordsToReview => "words_to_review",
        ReportType::PagesWithMisspellings => "pages_with_misspellings",
        ReportType::MisspellingHistory => "misspelling_history",
    }
}

pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own empty database
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        let repository = Self { pool };
        repository.apply_schema().await?;
        Ok(repository)
    }

    /// Fresh in-memory database, used by tests
    pub async fn in_memory() -> Result<Self> {
        Self::init("sqlite::memory:").await
    }

    async fn apply_schema(&self) -> Result<()> {
        let version: i32 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read user_version: {}", e)))?;

        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to apply schema: {}", e)))?;
        }

        if version < SCHEMA_VERSION {
            sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to set user_version: {}", e))
                })?;
            tracing::info!(from = version, to = SCHEMA_VERSION, "Database schema upgraded");
        }

        Ok(())
    }

    pub async fn schema_version(&self) -> Result<i32> {
        let version: i32 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    // ---------------------------------------------------------------
    // Websites
    // ---------------------------------------------------------------

    /// Insert configured websites that are not stored yet; returns how many were added
    pub async fn seed_websites(&self, names: &[String]) -> Result<u64> {
        let mut added = 0;
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            added += sqlx::query("INSERT OR IGNORE INTO websites (name) VALUES (?)")
                .bind(name)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to seed website: {}", e)))?
                .rows_affected();
        }
        if added > 0 {
            tracing::info!(added, "Seeded default websites");
        }
        Ok(added)
    }

    pub async fn list_websites(&self) -> Result<Vec<Website>> {
        let rows = sqlx::query_as::<_, WebsiteEntity>(
            "SELECT id, name, url FROM websites ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list websites: {}", e)))?;
        Ok(rows.into_iter().map(Website::from).collect())
    }

    pub async fn get_website(&self, id: i64) -> Result<Option<Website>> {
        let row = sqlx::query_as::<_, WebsiteEntity>(
            "SELECT id, name, url FROM websites WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to load website: {}", e)))?;
        Ok(row.map(Website::from))
    }

    pub async fn create_website(&self, input: &NewWebsite) -> Result<Website> {
        let name = input.name.trim();
        let url = input
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());

        let result = sqlx::query("INSERT INTO websites (name, url) VALUES (?, ?)")
            .bind(name)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::ValidationError(format!("Website '{}' already exists", name))
                }
                other => AppError::DatabaseError(format!("Failed to create website: {}", other)),
            })?;

        Ok(Website {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            url: url.map(str::to_string),
        })
    }

    // ---------------------------------------------------------------
    // Reports
    // ---------------------------------------------------------------

    /// Insert the report row and every record in one transaction
    pub async fn store_report(
        &self,
        website_id: i64,
        filename: &str,
        parsed: &ParsedReport,
    ) -> Result<StoreOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        // Same wall clock as the Created: dates it is mixed with
        let now = Local::now().naive_local();
        let report_id = sqlx::query(
            "INSERT INTO reports (website_id, report_type, filename, upload_date, processed_at, created_date)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(website_id)
        .bind(parsed.report_type.as_str())
        .bind(filename)
        .bind(now)
        .bind(now)
        .bind(parsed.metadata.created_date)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert report: {}", e)))?
        .last_insert_rowid();

        for record in &parsed.records {
            insert_record(&mut tx, report_id, record).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit report: {}", e)))?;

        tracing::info!(
            report_id,
            website_id,
            report_type = parsed.report_type.as_str(),
            records = parsed.records.len(),
            "Stored report"
        );

        Ok(StoreOutcome {
            report_id,
            stored: parsed.records.len(),
        })
    }

    pub async fn list_reports(&self, website_id: Option<i64>) -> Result<Vec<StoredReport>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, website_id, report_type, filename, upload_date, processed_at, created_date
             FROM reports WHERE 1 = 1",
        );
        if let Some(id) = website_id {
            qb.push(" AND website_id = ").push_bind(id);
        }
        qb.push(" ORDER BY upload_date DESC, id DESC");

        let rows: Vec<ReportEntity> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list reports: {}", e)))?;

        rows.into_iter().map(StoredReport::try_from).collect()
    }

    /// Delete a report; its records go with it
    pub async fn delete_report(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete report: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }
        tracing::info!(report_id = id, "Deleted report");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Dashboard queries
    // ---------------------------------------------------------------

    /// Distinct report types stored, optionally for some websites only
    pub async fn report_types(&self, website_ids: Option<&[i64]>) -> Result<Vec<ReportType>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT DISTINCT r.report_type FROM reports r WHERE 1 = 1");
        if let Some(ids) = website_ids {
            push_id_list(&mut qb, "r.website_id", ids);
        }
        qb.push(" ORDER BY r.report_type");

        let names: Vec<String> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load report types: {}", e)))?;

        Ok(names
            .iter()
            .filter_map(|name| match ReportType::from_str(name) {
                Ok(report_type) => Some(report_type),
                Err(e) => {
                    tracing::warn!(report_type = %name, error = %e, "Ignoring unknown stored report type");
                    None
                }
            })
            .collect())
    }

    /// Earliest and latest report dates
    pub async fn date_range(
        &self,
        website_ids: Option<&[i64]>,
        report_types: Option<&[ReportType]>,
    ) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>)> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT MIN(");
        qb.push(REPORT_DATE)
            .push("), MAX(")
            .push(REPORT_DATE)
            .push(") FROM reports r WHERE 1 = 1");
        if let Some(ids) = website_ids {
            push_id_list(&mut qb, "r.website_id", ids);
        }
        if let Some(types) = report_types {
            push_type_list(&mut qb, types);
        }

        let rows = qb
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load date range: {}", e)))?;
        Ok(rows)
    }

    /// Reports of the selected types in scope
    pub async fn count_reports(&self, filter: &DashboardFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM reports r WHERE 1 = 1");
        push_scope(&mut qb, filter);
        push_type_list(&mut qb, &filter.report_types);

        let rows = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count reports: {}", e)))?;
        Ok(rows)
    }

    /// Records of one type belonging to reports in scope
    pub async fn count_records(
        &self,
        report_type: ReportType,
        filter: &DashboardFilter,
    ) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
        qb.push(record_table(report_type))
            .push(" x JOIN reports r ON r.id = x.report_id WHERE 1 = 1");
        push_scope(&mut qb, filter);

        let rows = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count records: {}", e)))?;
        Ok(rows)
    }

    /// History rows dated within the filter range
    pub async fn history_points(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<(NaiveDateTime, Option<i64>, Option<i64>)>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT h.report_date, h.misspellings_count, h.words_to_review_count
             FROM misspelling_history h JOIN reports r ON r.id = h.report_id WHERE 1 = 1",
        );
        push_id_list(&mut qb, "r.website_id", &filter.website_ids);
        qb.push(" AND h.report_date >= ")
            .push_bind(filter.start_at())
            .push(" AND h.report_date < ")
            .push_bind(filter.end_before())
            .push(" ORDER BY h.report_date");

        let rows = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load history: {}", e)))?;
        Ok(rows)
    }

    /// Per selected word report: its date and how many misspellings and words to review it holds
    pub async fn report_word_counts(
        &self,
        filter: &DashboardFilter,
    ) -> Result<Vec<(NaiveDateTime, i64, i64)>> {
        let word_types: Vec<ReportType> = filter
            .report_types
            .iter()
            .copied()
            .filter(ReportType::is_word_report)
            .collect();
        if word_types.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(REPORT_DATE).push(
            " AS at,
             (SELECT COUNT(*) FROM misspellings m WHERE m.report_id = r.id),
             (SELECT COUNT(*) FROM words_to_review t WHERE t.report_id = r.id)
             FROM reports r WHERE 1 = 1",
        );
        push_scope(&mut qb, filter);
        push_type_list(&mut qb, &word_types);
        qb.push(" ORDER BY at");

        let rows = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load report counts: {}", e)))?;
        Ok(rows)
    }

    /// Words ranked by total pages across the selected word tables
    pub async fn top_words(&self, filter: &DashboardFilter, limit: i64) -> Result<Vec<(String, i64)>> {
        let tables = WordTable::selected(filter);
        if tables.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT word, COALESCE(SUM(pages_count), 0) AS total FROM (",
        );
        push_word_union(&mut qb, &tables, |_| "x.word, x.pages_count".to_string(), "", filter, None);
        qb.push(") GROUP BY word ORDER BY total DESC, word ASC LIMIT ")
            .push_bind(limit.max(0));

        let rows = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load top words: {}", e)))?;
        Ok(rows)
    }

    /// Record counts per language across the selected word tables
    pub async fn language_counts(&self, filter: &DashboardFilter) -> Result<Vec<(String, i64)>> {
        let tables = WordTable::selected(filter);
        if tables.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT language, COUNT(*) AS total FROM (");
        push_word_union(
            &mut qb,
            &tables,
            |_| "x.language".to_string(),
            " AND x.language IS NOT NULL",
            filter,
            None,
        );
        qb.push(") GROUP BY language ORDER BY total DESC, language ASC");

        let rows = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load languages: {}", e)))?;
        Ok(rows)
    }

    /// One page of the unified word listing plus the total row count
    pub async fn detailed_rows(
        &self,
        filter: &DashboardFilter,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<DetailedRow>, i64)> {
        let tables = WordTable::selected(filter);
        if tables.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM (");
        push_word_union(&mut count_qb, &tables, |_| "x.id".to_string(), "", filter, search);
        count_qb.push(")");
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count detail rows: {}", e)))?;

        let mut qb = QueryBuilder::<Sqlite>::new("");
        push_word_union(
            &mut qb,
            &tables,
            |table| {
                format!(
                    "'{}' AS kind, x.word, x.spelling_suggestion, x.language, x.first_detected, \
                     x.pages_count, {} AS probability, w.name AS website, {} AS report_date",
                    table.label(),
                    table.probability_column(),
                    REPORT_DATE
                )
            },
            "",
            filter,
            search,
        );
        qb.push(" ORDER BY report_date DESC, word ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<DetailedEntity> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load detail rows: {}", e)))?;

        Ok((rows.into_iter().map(DetailedRow::from).collect(), total))
    }
}

async fn insert_record(
    conn: &mut SqliteConnection,
    report_id: i64,
    record: &ReportRecord,
) -> Result<()> {
    let query = match record {
        ReportRecord::Misspelling(m) => sqlx::query(
            "INSERT INTO misspellings (report_id, word, spelling_suggestion, language, first_detected, pages_count)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(report_id)
        .bind(&m.word)
        .bind(&m.spelling_suggestion)
        .bind(&m.language)
        .bind(m.first_detected)
        .bind(m.pages_count),
        ReportRecord::WordToReview(w) => sqlx::query(
            "INSERT INTO words_to_review (report_id, word, spelling_suggestion, language, first_detected, misspelling_probability, pages_count)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(report_id)
        .bind(&w.word)
        .bind(&w.spelling_suggestion)
        .bind(&w.language)
        .bind(w.first_detected)
        .bind(&w.misspelling_probability)
        .bind(w.pages_count),
        ReportRecord::Page(p) => sqlx::query(
            "INSERT INTO pages_with_misspellings (report_id, title, url, page_report_link, cms_link, misspellings_count, words_to_review_count, page_level)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(report_id)
        .bind(&p.title)
        .bind(&p.url)
        .bind(&p.page_report_link)
        .bind(&p.cms_link)
        .bind(p.misspellings_count)
        .bind(p.words_to_review_count)
        .bind(p.page_level),
        ReportRecord::History(h) => sqlx::query(
            "INSERT INTO misspelling_history (report_id, report_date, misspellings_count, words_to_review_count)
             VALUES (?, ?, ?, ?)",
        )
        .bind(report_id)
        .bind(h.report_date)
        .bind(h.misspellings_count)
        .bind(h.words_to_review_count),
    };

    query
        .execute(conn)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert record: {}", e)))?;
    Ok(())
}

/// `AND column IN (...)`; an empty list matches nothing
fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, ids: &[i64]) {
    if ids.is_empty() {
        qb.push(" AND 0 = 1");
        return;
    }
    qb.push(" AND ").push(column).push(" IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

fn push_type_list(qb: &mut QueryBuilder<'_, Sqlite>, types: &[ReportType]) {
    if types.is_empty() {
        qb.push(" AND 0 = 1");
        return;
    }
    qb.push(" AND r.report_type IN (");
    let mut separated = qb.separated(", ");
    for report_type in types {
        separated.push_bind(report_type.as_str());
    }
    separated.push_unseparated(")");
}

/// Websites and inclusive date range of the filter, applied to `reports r`
fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, filter: &DashboardFilter) {
    push_id_list(qb, "r.website_id", &filter.website_ids);
    qb.push(" AND ")
        .push(REPORT_DATE)
        .push(" >= ")
        .push_bind(filter.start_at());
    qb.push(" AND ")
        .push(REPORT_DATE)
        .push(" < ")
        .push_bind(filter.end_before());
}

/// `LIKE` pattern matching `term` literally anywhere
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// SELECT over each word table joined to its report and website, glued with UNION ALL
fn push_word_union<F>(
    qb: &mut QueryBuilder<'_, Sqlite>,
    tables: &[WordTable],
    columns: F,
    extra: &str,
    filter: &DashboardFilter,
    search: Option<&str>,
) where
    F: Fn(WordTable) -> String,
{
    let search = search.map(str::trim).filter(|s| !s.is_empty()).map(like_pattern);

    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            qb.push(" UNION ALL ");
        }
        qb.push("SELECT ")
            .push(columns(*table))
            .push(" FROM ")
            .push(table.table())
            .push(
                " x JOIN reports r ON r.id = x.report_id \
                 JOIN websites w ON w.id = r.website_id WHERE 1 = 1",
            )
            .push(extra);
        push_scope(qb, filter);

        if let Some(pattern) = &search {
            qb.push(" AND (x.word LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR x.spelling_suggestion LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\')");
        }
    }
}

// Internal entities for database mapping
#[derive(sqlx::FromRow)]
struct WebsiteEntity {
    id: i64,
    name: String,
    url: Option<String>,
}

impl From<WebsiteEntity> for Website {
    fn from(entity: WebsiteEntity) -> Self {
        Website {
            id: entity.id,
            name: entity.name,
            url: entity.url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReportEntity {
    id: i64,
    website_id: i64,
    report_type: String,
    filename: String,
    upload_date: NaiveDateTime,
    processed_at: Option<NaiveDateTime>,
    created_date: Option<NaiveDateTime>,
}

impl TryFrom<ReportEntity> for StoredReport {
    type Error = AppError;

    fn try_from(entity: ReportEntity) -> Result<Self> {
        Ok(StoredReport {
            id: entity.id,
            website_id: entity.website_id,
            report_type: ReportType::from_str(&entity.report_type)
                .map_err(AppError::DatabaseError)?,
            filename: entity.filename,
            upload_date: entity.upload_date,
            processed_at: entity.processed_at,
            created_date: entity.created_date,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DetailedEntity {
    kind: String,
    word: String,
    spelling_suggestion: Option<String>,
    language: Option<String>,
    first_detected: Option<NaiveDateTime>,
    pages_count: Option<i64>,
    probability: Option<String>,
    website: String,
    report_date: Option<NaiveDateTime>,
}

impl From<DetailedEntity> for DetailedRow {
    fn from(entity: DetailedEntity) -> Self {
        DetailedRow {
            kind: entity.kind,
            word: entity.word,
            suggestion: entity.spelling_suggestion,
            language: entity.language,
            first_detected: entity.first_detected,
            pages: entity.pages_count,
            probability: entity.probability,
            website: entity.website,
            report_date: entity.report_date,
        }
    }
}
