//! SQLite storage backend

use super::traits::{
    ArticleFilter, CollocationFilter, CorpusStore, OpenStore, StorageError, StorageResult,
};
use crate::corpus::{
    Article, ArticleCollocation, ArticleId, ClusterId, Collocation, NewArticle, Relevance,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const ARTICLE_COLUMNS: &str = "id, title, abstract, text, stemmed_text, ngram_index, cluster_id, \
     venue, year, link, citations, document_path, stem_method, created_at";

/// Raw article columns as read from a row, before parsing enums and dates
type ArticleRow = (
    ArticleId,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    i32,
    Option<String>,
    i64,
    Option<String>,
    String,
    String,
);

/// SQLite-backed corpus store
///
/// Uses a single SQLite database file with one table for articles, one for
/// per-article collocation counts, one aggregate table per cluster and one
/// table of relevance judgements. Thread-safe via internal mutex on the
/// connection; counter updates are single SQL statements.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Articles table
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL DEFAULT '',
                abstract TEXT NOT NULL DEFAULT '',
                text TEXT NOT NULL DEFAULT '',
                stemmed_text TEXT NOT NULL DEFAULT '',
                ngram_index TEXT NOT NULL DEFAULT '',
                cluster_id TEXT NOT NULL,
                venue TEXT,
                year INTEGER NOT NULL,
                link TEXT,
                citations INTEGER NOT NULL DEFAULT 0,
                document_path TEXT,
                stem_method TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_articles_cluster
                ON articles(cluster_id);

            -- Per-article collocation counts
            CREATE TABLE IF NOT EXISTS article_collocations (
                ngram TEXT NOT NULL,
                article_id INTEGER NOT NULL,
                count INTEGER NOT NULL CHECK (count > 0),
                PRIMARY KEY (ngram, article_id),
                FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_article_collocations_article
                ON article_collocations(article_id);

            -- Relevance judgements, keyed by cluster
            CREATE TABLE IF NOT EXISTS collocation_tags (
                cluster_id TEXT NOT NULL,
                ngram TEXT NOT NULL,
                is_relevant INTEGER NOT NULL,
                PRIMARY KEY (cluster_id, ngram)
            );

            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        // One aggregate table per cluster namespace
        for cluster in ClusterId::ALL {
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    ngram TEXT PRIMARY KEY,
                    count INTEGER NOT NULL DEFAULT 1,
                    source TEXT NOT NULL DEFAULT ''
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_count ON {table}(count DESC);
                "#,
                table = cluster.collocation_table()
            ))?;
        }

        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_article_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArticleRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
            row.get(12)?,
            row.get(13)?,
        ))
    }

    /// Deserialize an article from database columns
    fn row_to_article(row: ArticleRow) -> StorageResult<Article> {
        let (
            id,
            title,
            abstract_text,
            text,
            stemmed_text,
            index,
            cluster,
            venue,
            year,
            link,
            citations,
            document_path,
            stem_method,
            created_at,
        ) = row;

        Ok(Article {
            id,
            title,
            abstract_text,
            text,
            stemmed_text,
            index,
            cluster: cluster.parse().map_err(StorageError::Corrupt)?,
            venue,
            year,
            link,
            citations,
            document_path: document_path.map(PathBuf::from),
            stem_method: stem_method.parse().map_err(StorageError::Corrupt)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| StorageError::DateParse(e.to_string()))?
                .with_timezone(&Utc),
        })
    }

    fn row_to_collocation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Collocation> {
        Ok(Collocation {
            ngram: row.get(0)?,
            count: row.get(1)?,
            source: row.get(2)?,
        })
    }

    fn row_to_article_collocation(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArticleCollocation> {
        Ok(ArticleCollocation {
            article_id: row.get(0)?,
            ngram: row.get(1)?,
            count: row.get(2)?,
        })
    }

    fn check_count(ngram: &str, count: i64) -> StorageResult<()> {
        if count <= 0 {
            return Err(StorageError::InvalidCount {
                ngram: ngram.to_string(),
                count,
            });
        }
        Ok(())
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl CorpusStore for SqliteStore {
    // === Article Operations ===

    fn insert_article(
        &self,
        article: &NewArticle,
        stemmed_text: &str,
        index_json: &str,
    ) -> StorageResult<Article> {
        let conn = self.conn();
        let created_at = Utc::now();

        conn.execute(
            r#"
            INSERT INTO articles (title, abstract, text, stemmed_text, ngram_index, cluster_id,
                                  venue, year, link, citations, document_path, stem_method, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                article.title,
                article.abstract_text,
                article.text,
                stemmed_text,
                index_json,
                article.cluster.as_str(),
                article.venue,
                article.year,
                article.link,
                article.citations,
                article.document_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
                article.stem_method.as_str(),
                created_at.to_rfc3339(),
            ],
        )?;

        Ok(Article {
            id: conn.last_insert_rowid(),
            title: article.title.clone(),
            abstract_text: article.abstract_text.clone(),
            text: article.text.clone(),
            stemmed_text: stemmed_text.to_string(),
            index: index_json.to_string(),
            cluster: article.cluster,
            venue: article.venue.clone(),
            year: article.year,
            link: article.link.clone(),
            citations: article.citations,
            document_path: article.document_path.clone(),
            stem_method: article.stem_method,
            created_at,
        })
    }

    fn load_article(&self, id: ArticleId) -> StorageResult<Option<Article>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                &format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS),
                params![id],
                Self::read_article_row,
            )
            .optional()?;

        row.map(Self::row_to_article).transpose()
    }

    fn update_article_metadata(
        &self,
        id: ArticleId,
        title: &str,
        abstract_text: &str,
    ) -> StorageResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE articles SET title = ?2, abstract = ?3 WHERE id = ?1",
            params![id, title, abstract_text],
        )?;
        Ok(rows > 0)
    }

    fn delete_article(&self, id: ArticleId) -> StorageResult<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM articles WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list_articles(&self, filter: &ArticleFilter) -> StorageResult<Vec<Article>> {
        let conn = self.conn();

        let mut sql = format!("SELECT {} FROM articles WHERE 1 = 1", ARTICLE_COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(cluster) = filter.cluster {
            sql.push_str(" AND cluster_id = ?");
            params_vec.push(Box::new(cluster.as_str()));
        }

        if let Some(max_year) = filter.max_year {
            sql.push_str(" AND year <= ?");
            params_vec.push(Box::new(max_year));
        }

        sql.push_str(" ORDER BY year DESC, id ASC");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), Self::read_article_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::row_to_article).collect()
    }

    // === Article Collocation Operations ===

    fn insert_article_collocation(&self, row: &ArticleCollocation) -> StorageResult<()> {
        Self::check_count(&row.ngram, row.count)?;
        let conn = self.conn();

        let result = conn.execute(
            "INSERT INTO article_collocations (ngram, article_id, count) VALUES (?1, ?2, ?3)",
            params![row.ngram, row.article_id, row.count],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(StorageError::DuplicateArticleCollocation {
                    article_id: row.article_id,
                    ngram: row.ngram.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn load_article_collocation(
        &self,
        article_id: ArticleId,
        ngram: &str,
    ) -> StorageResult<Option<ArticleCollocation>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT article_id, ngram, count FROM article_collocations
                 WHERE article_id = ?1 AND ngram = ?2",
                params![article_id, ngram],
                Self::row_to_article_collocation,
            )
            .optional()?;
        Ok(row)
    }

    fn set_article_collocation_count(
        &self,
        article_id: ArticleId,
        ngram: &str,
        count: i64,
    ) -> StorageResult<bool> {
        Self::check_count(ngram, count)?;
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE article_collocations SET count = ?3 WHERE article_id = ?1 AND ngram = ?2",
            params![article_id, ngram, count],
        )?;
        Ok(rows > 0)
    }

    fn delete_article_collocation(
        &self,
        article_id: ArticleId,
        ngram: &str,
    ) -> StorageResult<Option<ArticleCollocation>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "DELETE FROM article_collocations WHERE article_id = ?1 AND ngram = ?2
                 RETURNING article_id, ngram, count",
                params![article_id, ngram],
                Self::row_to_article_collocation,
            )
            .optional()?;
        Ok(row)
    }

    fn article_collocations(
        &self,
        article_id: ArticleId,
    ) -> StorageResult<Vec<ArticleCollocation>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT article_id, ngram, count FROM article_collocations
             WHERE article_id = ?1 ORDER BY count DESC, ngram ASC",
        )?;
        let rows = stmt
            .query_map(params![article_id], Self::row_to_article_collocation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn has_article_collocations(&self, article_id: ArticleId) -> StorageResult<bool> {
        let conn = self.conn();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM article_collocations WHERE article_id = ?1)",
            params![article_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn ngram_occurrences(
        &self,
        cluster: ClusterId,
        ngram: &str,
    ) -> StorageResult<Vec<ArticleCollocation>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ac.article_id, ac.ngram, ac.count
             FROM article_collocations ac JOIN articles a ON a.id = ac.article_id
             WHERE a.cluster_id = ?1 AND ac.ngram = ?2
             ORDER BY ac.count DESC, ac.article_id ASC",
        )?;
        let rows = stmt
            .query_map(params![cluster.as_str(), ngram], Self::row_to_article_collocation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn sum_article_counts(&self, cluster: ClusterId, ngram: &str) -> StorageResult<i64> {
        let conn = self.conn();
        let sum: i64 = conn.query_row(
            "SELECT COALESCE(SUM(ac.count), 0)
             FROM article_collocations ac JOIN articles a ON a.id = ac.article_id
             WHERE a.cluster_id = ?1 AND ac.ngram = ?2",
            params![cluster.as_str(), ngram],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    fn cluster_article_sums(&self, cluster: ClusterId) -> StorageResult<Vec<(String, i64)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ac.ngram, SUM(ac.count)
             FROM article_collocations ac JOIN articles a ON a.id = ac.article_id
             WHERE a.cluster_id = ?1
             GROUP BY ac.ngram ORDER BY ac.ngram",
        )?;
        let rows = stmt
            .query_map(params![cluster.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // === Aggregate Collocation Operations ===

    fn load_collocation(
        &self,
        cluster: ClusterId,
        ngram: &str,
    ) -> StorageResult<Option<Collocation>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                &format!(
                    "SELECT ngram, count, source FROM {} WHERE ngram = ?1",
                    cluster.collocation_table()
                ),
                params![ngram],
                Self::row_to_collocation,
            )
            .optional()?;
        Ok(row)
    }

    fn increment_collocation(
        &self,
        cluster: ClusterId,
        ngram: &str,
        delta: i64,
    ) -> StorageResult<Collocation> {
        let conn = self.conn();
        let row = conn.query_row(
            &format!(
                r#"
                INSERT INTO {} (ngram, count) VALUES (?1, ?2)
                ON CONFLICT(ngram) DO UPDATE SET count = count + excluded.count
                RETURNING ngram, count, source
                "#,
                cluster.collocation_table()
            ),
            params![ngram, delta],
            Self::row_to_collocation,
        )?;
        Ok(row)
    }

    fn save_collocation_count(
        &self,
        cluster: ClusterId,
        ngram: &str,
        count: i64,
    ) -> StorageResult<()> {
        let conn = self.conn();
        conn.execute(
            &format!(
                r#"
                INSERT INTO {} (ngram, count) VALUES (?1, ?2)
                ON CONFLICT(ngram) DO UPDATE SET count = excluded.count
                "#,
                cluster.collocation_table()
            ),
            params![ngram, count],
        )?;
        Ok(())
    }

    fn set_collocation_source(
        &self,
        cluster: ClusterId,
        ngram: &str,
        source: &str,
    ) -> StorageResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            &format!(
                "UPDATE {} SET source = ?2 WHERE ngram = ?1",
                cluster.collocation_table()
            ),
            params![ngram, source],
        )?;
        Ok(rows > 0)
    }

    fn delete_collocation(&self, cluster: ClusterId, ngram: &str) -> StorageResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            &format!("DELETE FROM {} WHERE ngram = ?1", cluster.collocation_table()),
            params![ngram],
        )?;
        Ok(rows > 0)
    }

    fn list_collocations(
        &self,
        cluster: ClusterId,
        filter: &CollocationFilter,
    ) -> StorageResult<Vec<Collocation>> {
        let conn = self.conn();

        let mut sql = format!(
            "SELECT ngram, count, source FROM {} WHERE 1 = 1",
            cluster.collocation_table()
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref fragment) = filter.containing {
            sql.push_str(" AND instr(ngram, ?) > 0");
            params_vec.push(Box::new(fragment.clone()));
        }

        if let Some(min_count) = filter.min_count {
            sql.push_str(" AND count >= ?");
            params_vec.push(Box::new(min_count));
        }

        sql.push_str(" ORDER BY count DESC, ngram ASC");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), Self::row_to_collocation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn collocation_ngrams(&self, cluster: ClusterId) -> StorageResult<HashSet<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT ngram FROM {}", cluster.collocation_table()))?;
        let ngrams = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ngrams)
    }

    // === Relevance Operations ===

    fn save_relevance(
        &self,
        cluster: ClusterId,
        ngram: &str,
        relevance: Relevance,
    ) -> StorageResult<()> {
        let conn = self.conn();
        match relevance {
            Relevance::Unknown => {
                conn.execute(
                    "DELETE FROM collocation_tags WHERE cluster_id = ?1 AND ngram = ?2",
                    params![cluster.as_str(), ngram],
                )?;
            }
            known => {
                conn.execute(
                    r#"
                    INSERT INTO collocation_tags (cluster_id, ngram, is_relevant)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(cluster_id, ngram) DO UPDATE SET is_relevant = excluded.is_relevant
                    "#,
                    params![cluster.as_str(), ngram, known == Relevance::Relevant],
                )?;
            }
        }
        Ok(())
    }

    fn load_relevance(&self, cluster: ClusterId, ngram: &str) -> StorageResult<Option<Relevance>> {
        let conn = self.conn();
        let flag: Option<bool> = conn
            .query_row(
                "SELECT is_relevant FROM collocation_tags WHERE cluster_id = ?1 AND ngram = ?2",
                params![cluster.as_str(), ngram],
                |row| row.get(0),
            )
            .optional()?;
        Ok(flag.map(Relevance::from_flag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn insert_test_article(store: &SqliteStore, cluster: ClusterId) -> Article {
        let new = NewArticle::new("Neural networks.", cluster, 2013).with_title("Nets");
        store
            .insert_article(&new, "neural network .", r#"{"neural network":1}"#)
            .unwrap()
    }

    fn row(article_id: ArticleId, ngram: &str, count: i64) -> ArticleCollocation {
        ArticleCollocation {
            article_id,
            ngram: ngram.to_string(),
            count,
        }
    }

    // ========================================================================
    // Articles
    // ========================================================================

    #[test]
    fn test_article_roundtrip() {
        let store = create_test_store();
        let article = insert_test_article(&store, ClusterId::ComputerScience);

        let loaded = store.load_article(article.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Nets");
        assert_eq!(loaded.cluster, ClusterId::ComputerScience);
        assert_eq!(loaded.ngram_index().unwrap().get("neural network"), Some(&1));
        assert_eq!(loaded.created_at.timestamp(), article.created_at.timestamp());
    }

    #[test]
    fn test_list_articles_filters_by_cluster() {
        let store = create_test_store();
        insert_test_article(&store, ClusterId::ComputerScience);
        insert_test_article(&store, ClusterId::ScienceWise);

        let cs = store
            .list_articles(&ArticleFilter::new().in_cluster(ClusterId::ComputerScience))
            .unwrap();
        assert_eq!(cs.len(), 1);
        assert_eq!(store.list_articles(&ArticleFilter::new()).unwrap().len(), 2);
        assert!(store
            .list_articles(&ArticleFilter::new().up_to_year(2000))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_update_article_metadata() {
        let store = create_test_store();
        let article = insert_test_article(&store, ClusterId::ComputerScience);
        assert!(store.update_article_metadata(article.id, "Title", "Abstract").unwrap());
        let loaded = store.load_article(article.id).unwrap().unwrap();
        assert_eq!(loaded.abstract_text, "Abstract");
        assert!(!store.update_article_metadata(999, "x", "y").unwrap());
    }

    #[test]
    fn test_delete_article_cascades_rows() {
        let store = create_test_store();
        let article = insert_test_article(&store, ClusterId::ComputerScience);
        store.insert_article_collocation(&row(article.id, "neural network", 3)).unwrap();

        assert!(store.delete_article(article.id).unwrap());
        assert!(store.load_article(article.id).unwrap().is_none());
        assert!(!store.has_article_collocations(article.id).unwrap());
    }

    // ========================================================================
    // Article collocations
    // ========================================================================

    #[test]
    fn test_article_collocation_is_unique_per_article() {
        let store = create_test_store();
        let article = insert_test_article(&store, ClusterId::ComputerScience);
        store.insert_article_collocation(&row(article.id, "neural network", 3)).unwrap();

        let err = store
            .insert_article_collocation(&row(article.id, "neural network", 1))
            .unwrap_err();
        assert!(matches!(err, StorageError::DuplicateArticleCollocation { .. }));
    }

    #[test]
    fn test_non_positive_counts_are_rejected() {
        let store = create_test_store();
        let article = insert_test_article(&store, ClusterId::ComputerScience);
        let err = store
            .insert_article_collocation(&row(article.id, "neural network", 0))
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidCount { count: 0, .. }));
    }

    #[test]
    fn test_article_collocations_ordered_by_count() {
        let store = create_test_store();
        let article = insert_test_article(&store, ClusterId::ComputerScience);
        store.insert_article_collocation(&row(article.id, "deep model", 2)).unwrap();
        store.insert_article_collocation(&row(article.id, "neural network", 7)).unwrap();

        let rows = store.article_collocations(article.id).unwrap();
        assert_eq!(rows[0].ngram, "neural network");
        assert_eq!(rows[1].ngram, "deep model");
    }

    #[test]
    fn test_delete_article_collocation_returns_row() {
        let store = create_test_store();
        let article = insert_test_article(&store, ClusterId::ComputerScience);
        store.insert_article_collocation(&row(article.id, "neural network", 4)).unwrap();

        let deleted = store.delete_article_collocation(article.id, "neural network").unwrap();
        assert_eq!(deleted.map(|r| r.count), Some(4));
        assert!(store
            .delete_article_collocation(article.id, "neural network")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_sums_are_scoped_to_cluster() {
        let store = create_test_store();
        let cs = insert_test_article(&store, ClusterId::ComputerScience);
        let cs2 = insert_test_article(&store, ClusterId::ComputerScience);
        let sw = insert_test_article(&store, ClusterId::ScienceWise);
        store.insert_article_collocation(&row(cs.id, "neural network", 3)).unwrap();
        store.insert_article_collocation(&row(cs2.id, "neural network", 2)).unwrap();
        store.insert_article_collocation(&row(sw.id, "neural network", 10)).unwrap();

        assert_eq!(store.sum_article_counts(ClusterId::ComputerScience, "neural network").unwrap(), 5);
        assert_eq!(
            store.ngram_occurrences(ClusterId::ComputerScience, "neural network").unwrap().len(),
            2
        );
        assert_eq!(
            store.cluster_article_sums(ClusterId::ScienceWise).unwrap(),
            vec![("neural network".to_string(), 10)]
        );
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    #[test]
    fn test_increment_creates_then_adds() {
        let store = create_test_store();
        let cluster = ClusterId::ComputerScience;

        let created = store.increment_collocation(cluster, "neural network", 5).unwrap();
        assert_eq!(created.count, 5);
        let updated = store.increment_collocation(cluster, "neural network", 2).unwrap();
        assert_eq!(updated.count, 7);
        let decremented = store.increment_collocation(cluster, "neural network", -7).unwrap();
        assert_eq!(decremented.count, 0);
    }

    #[test]
    fn test_clusters_are_separate_namespaces() {
        let store = create_test_store();
        store.increment_collocation(ClusterId::ComputerScience, "neural network", 5).unwrap();

        assert!(store.load_collocation(ClusterId::ScienceWise, "neural network").unwrap().is_none());
        assert!(store
            .collocation_ngrams(ClusterId::ComputerScience)
            .unwrap()
            .contains("neural network"));
    }

    #[test]
    fn test_source_and_listing() {
        let store = create_test_store();
        let cluster = ClusterId::ComputerScience;
        store.save_collocation_count(cluster, "neural network", 5).unwrap();
        store.save_collocation_count(cluster, "deep neural network", 9).unwrap();
        store.save_collocation_count(cluster, "decision tree", 1).unwrap();
        assert!(store.set_collocation_source(cluster, "neural network", "dbpedia").unwrap());

        let all = store.list_collocations(cluster, &CollocationFilter::new()).unwrap();
        assert_eq!(all[0].ngram, "deep neural network");

        let nets = store
            .list_collocations(cluster, &CollocationFilter::new().containing("neural network"))
            .unwrap();
        assert_eq!(nets.len(), 2);

        let frequent = store
            .list_collocations(cluster, &CollocationFilter::new().with_min_count(5))
            .unwrap();
        assert_eq!(frequent.len(), 2);

        let loaded = store.load_collocation(cluster, "neural network").unwrap().unwrap();
        assert_eq!(loaded.source, "dbpedia");

        assert!(store.delete_collocation(cluster, "decision tree").unwrap());
        assert!(!store.delete_collocation(cluster, "decision tree").unwrap());
    }

    // ========================================================================
    // Relevance
    // ========================================================================

    #[test]
    fn test_relevance_roundtrip() {
        let store = create_test_store();
        let cluster = ClusterId::ComputerScience;

        assert_eq!(store.load_relevance(cluster, "neural network").unwrap(), None);
        store.save_relevance(cluster, "neural network", Relevance::Relevant).unwrap();
        assert_eq!(
            store.load_relevance(cluster, "neural network").unwrap(),
            Some(Relevance::Relevant)
        );
        store.save_relevance(cluster, "neural network", Relevance::Unknown).unwrap();
        assert_eq!(store.load_relevance(cluster, "neural network").unwrap(), None);
    }

    #[test]
    fn test_wal_mode_enabled_at_connection() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("corpus.db")).unwrap();

        let journal_mode: String = store
            .conn()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();

        assert_eq!(journal_mode, "wal");
    }
}
