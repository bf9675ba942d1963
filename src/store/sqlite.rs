//! SQLite-backed store for documents, chunks, scripts, and settings.
//!
//! Chunk similarity is computed in Rust over every embedded chunk, which is
//! fine for a personal library of a few thousand chunks.

use super::{
    format_timestamp, parse_timestamp, rank_matches, ChunkMatch, Document, DocumentStatus,
    DocumentSummary, LibraryStore, Script, ScriptStatus, ScriptStore, SettingsStore, StoredChunk,
    UserSettings,
};
use crate::chunking::TextChunk;
use crate::error::{Result, RoteiroError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT,
    file_path TEXT NOT NULL,
    file_type TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    status TEXT NOT NULL,
    uploaded_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status, created_at);

CREATE TABLE IF NOT EXISTS document_chunks (
    id TEXT PRIMARY KEY,
    document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB,
    UNIQUE (document_id, chunk_index)
);

CREATE INDEX IF NOT EXISTS idx_chunks_document_id ON document_chunks(document_id);

CREATE TABLE IF NOT EXISTS scripts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    title TEXT NOT NULL,
    theme TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL,
    language_style TEXT NOT NULL,
    environment TEXT NOT NULL,
    environment_description TEXT,
    target_language TEXT NOT NULL,
    content_portuguese TEXT NOT NULL,
    content_final TEXT,
    seo_title TEXT NOT NULL,
    seo_description TEXT NOT NULL,
    seo_tags TEXT NOT NULL,
    thumbnail_prompt TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scripts_user_id ON scripts(user_id, created_at);

CREATE TABLE IF NOT EXISTS user_settings (
    user_id TEXT PRIMARY KEY,
    llm_provider TEXT NOT NULL,
    llm_model TEXT NOT NULL,
    openai_api_key TEXT,
    claude_api_key TEXT,
    gemini_api_key TEXT,
    updated_at TEXT NOT NULL
);
"#;

const DOCUMENT_COLUMNS: &str =
    "id, title, author, file_path, file_type, file_size, status, uploaded_by, created_at";

const SCRIPT_COLUMNS: &str = "id, user_id, title, theme, duration_minutes, language_style, \
     environment, environment_description, target_language, content_portuguese, content_final, \
     seo_title, seo_description, seo_tags, thumbnail_prompt, status, created_at, updated_at";

/// SQLite-based store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RoteiroError::Persistence(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let id: String = row.get(0)?;
        let file_size: i64 = row.get(5)?;
        let status: String = row.get(6)?;
        let created_at: String = row.get(8)?;

        Ok(Document {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            title: row.get(1)?,
            author: row.get(2)?,
            file_path: row.get(3)?,
            file_type: row.get(4)?,
            file_size: file_size.max(0) as u64,
            status: status.parse().unwrap_or(DocumentStatus::Error),
            uploaded_by: row.get(7)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<StoredChunk> {
        let id: String = row.get(0)?;
        let document_id: String = row.get(1)?;
        let chunk_index: i64 = row.get(2)?;
        let embedding: Option<Vec<u8>> = row.get(4)?;

        Ok(StoredChunk {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            document_id: Uuid::parse_str(&document_id).unwrap_or_default(),
            chunk_index: chunk_index.max(0) as usize,
            content: row.get(3)?,
            embedding: embedding.map(|bytes| Self::bytes_to_embedding(&bytes)),
        })
    }

    fn row_to_script(row: &Row<'_>) -> rusqlite::Result<Script> {
        let id: String = row.get(0)?;
        let duration: i64 = row.get(4)?;
        let tags: String = row.get(13)?;
        let status: String = row.get(15)?;
        let created_at: String = row.get(16)?;
        let updated_at: String = row.get(17)?;

        Ok(Script {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            user_id: row.get(1)?,
            title: row.get(2)?,
            theme: row.get(3)?,
            duration_minutes: duration.max(0) as u32,
            language_style: row.get(5)?,
            environment: row.get(6)?,
            environment_description: row.get(7)?,
            target_language: row.get(8)?,
            content_portuguese: row.get(9)?,
            content_final: row.get(10)?,
            seo_title: row.get(11)?,
            seo_description: row.get(12)?,
            seo_tags: serde_json::from_str(&tags).unwrap_or_default(),
            thumbnail_prompt: row.get(14)?,
            status: status.parse().unwrap_or(ScriptStatus::Draft),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn script_params(script: &Script) -> Result<[Box<dyn rusqlite::ToSql>; 18]> {
        let tags = serde_json::to_string(&script.seo_tags)?;
        Ok([
            Box::new(script.id.to_string()),
            Box::new(script.user_id.clone()),
            Box::new(script.title.clone()),
            Box::new(script.theme.clone()),
            Box::new(script.duration_minutes as i64),
            Box::new(script.language_style.clone()),
            Box::new(script.environment.clone()),
            Box::new(script.environment_description.clone()),
            Box::new(script.target_language.clone()),
            Box::new(script.content_portuguese.clone()),
            Box::new(script.content_final.clone()),
            Box::new(script.seo_title.clone()),
            Box::new(script.seo_description.clone()),
            Box::new(tags),
            Box::new(script.thumbnail_prompt.clone()),
            Box::new(script.status.as_str()),
            Box::new(format_timestamp(&script.created_at)),
            Box::new(format_timestamp(&script.updated_at)),
        ])
    }
}

#[async_trait]
impl LibraryStore for SqliteStore {
    #[instrument(skip(self, doc), fields(id = %doc.id))]
    async fn insert_document(&self, doc: &Document) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            &format!(
                "INSERT INTO documents ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                DOCUMENT_COLUMNS
            ),
            params![
                doc.id.to_string(),
                doc.title,
                doc.author,
                doc.file_path,
                doc.file_type,
                doc.file_size as i64,
                doc.status.as_str(),
                doc.uploaded_by,
                format_timestamp(&doc.created_at),
            ],
        )?;

        debug!("Inserted document {}", doc.id);
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let conn = self.lock()?;

        let doc = conn
            .query_row(
                &format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS),
                params![id.to_string()],
                Self::row_to_document,
            )
            .optional()?;

        Ok(doc)
    }

    #[instrument(skip(self))]
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT d.id, d.title, d.author, d.file_path, d.file_type, d.file_size,
                   d.status, d.uploaded_by, d.created_at,
                   COUNT(c.id) AS chunk_count,
                   COUNT(c.embedding) AS embedded_chunks
            FROM documents d
            LEFT JOIN document_chunks c ON c.document_id = d.id
            GROUP BY d.id
            ORDER BY d.created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let chunk_count: i64 = row.get(9)?;
            let embedded_chunks: i64 = row.get(10)?;
            Ok(DocumentSummary {
                document: Self::row_to_document(row)?,
                chunk_count: chunk_count as usize,
                embedded_chunks: embedded_chunks as usize,
            })
        })?;

        let result: Vec<DocumentSummary> = rows.filter_map(|r| r.ok()).collect();
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn update_document_status(&self, id: Uuid, status: DocumentStatus) -> Result<()> {
        let conn = self.lock()?;

        let updated = conn.execute(
            "UPDATE documents SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id.to_string()],
        )?;

        if updated == 0 {
            return Err(RoteiroError::NotFound(format!("Document {}", id)));
        }
        debug!("Document {} is now {}", id, status);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }

    #[instrument(skip(self))]
    async fn find_documents_by_status(
        &self,
        status: DocumentStatus,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Document>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents WHERE status = ?1 AND created_at < ?2 ORDER BY created_at",
            DOCUMENT_COLUMNS
        ))?;

        let docs = stmt.query_map(
            params![status.as_str(), format_timestamp(&created_before)],
            Self::row_to_document,
        )?;

        let result: Vec<Document> = docs.filter_map(|d| d.ok()).collect();
        Ok(result)
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn replace_chunks(&self, document_id: Uuid, chunks: &[TextChunk]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM document_chunks WHERE document_id = ?1",
            params![document_id.to_string()],
        )?;

        for chunk in chunks {
            tx.execute(
                r#"
                INSERT INTO document_chunks (id, document_id, chunk_index, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    Uuid::new_v4().to_string(),
                    document_id.to_string(),
                    chunk.index as i64,
                    chunk.content,
                    chunk.embedding.as_deref().map(Self::embedding_to_bytes),
                ],
            )?;
        }

        tx.commit()?;
        info!("Stored {} chunks for document {}", chunks.len(), document_id);
        Ok(chunks.len())
    }

    #[instrument(skip(self))]
    async fn delete_chunks(&self, document_id: Uuid) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM document_chunks WHERE document_id = ?1",
            params![document_id.to_string()],
        )?;

        info!("Deleted {} chunks for document {}", deleted, document_id);
        Ok(deleted)
    }

    async fn get_chunks(&self, document_id: Uuid) -> Result<Vec<StoredChunk>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, document_id, chunk_index, content, embedding
            FROM document_chunks
            WHERE document_id = ?1
            ORDER BY chunk_index
            "#,
        )?;

        let chunks = stmt.query_map(params![document_id.to_string()], Self::row_to_chunk)?;
        let result: Vec<StoredChunk> = chunks.filter_map(|c| c.ok()).collect();
        Ok(result)
    }

    #[instrument(skip(self, query_embedding))]
    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, document_id, chunk_index, content, embedding
            FROM document_chunks
            WHERE embedding IS NOT NULL
            "#,
        )?;

        let chunks: Vec<StoredChunk> = stmt
            .query_map([], Self::row_to_chunk)?
            .filter_map(|c| c.ok())
            .collect();

        let matches = rank_matches(chunks, query_embedding, threshold, limit);
        debug!("Found {} matching chunks", matches.len());
        Ok(matches)
    }
}

#[async_trait]
impl ScriptStore for SqliteStore {
    #[instrument(skip(self, script), fields(id = %script.id))]
    async fn insert_script(&self, script: &Script) -> Result<()> {
        let values = Self::script_params(script)?;
        let conn = self.lock()?;

        conn.execute(
            &format!(
                "INSERT INTO scripts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, \
                 ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                SCRIPT_COLUMNS
            ),
            rusqlite::params_from_iter(values.iter()),
        )?;

        Ok(())
    }

    async fn get_script(&self, id: Uuid) -> Result<Option<Script>> {
        let conn = self.lock()?;

        let script = conn
            .query_row(
                &format!("SELECT {} FROM scripts WHERE id = ?1", SCRIPT_COLUMNS),
                params![id.to_string()],
                Self::row_to_script,
            )
            .optional()?;

        Ok(script)
    }

    #[instrument(skip(self, script), fields(id = %script.id))]
    async fn update_script(&self, script: &Script) -> Result<()> {
        let values = Self::script_params(script)?;
        let conn = self.lock()?;

        let updated = conn.execute(
            r#"
            UPDATE scripts SET
                user_id = ?2, title = ?3, theme = ?4, duration_minutes = ?5,
                language_style = ?6, environment = ?7, environment_description = ?8,
                target_language = ?9, content_portuguese = ?10, content_final = ?11,
                seo_title = ?12, seo_description = ?13, seo_tags = ?14,
                thumbnail_prompt = ?15, status = ?16, created_at = ?17, updated_at = ?18
            WHERE id = ?1
            "#,
            rusqlite::params_from_iter(values.iter()),
        )?;

        if updated == 0 {
            return Err(RoteiroError::NotFound(format!("Script {}", script.id)));
        }
        Ok(())
    }

    async fn list_scripts(&self, user_id: &str) -> Result<Vec<Script>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM scripts WHERE user_id = ?1 ORDER BY created_at DESC",
            SCRIPT_COLUMNS
        ))?;

        let scripts = stmt.query_map(params![user_id], Self::row_to_script)?;
        let result: Vec<Script> = scripts.filter_map(|s| s.ok()).collect();
        Ok(result)
    }
}

#[async_trait]
impl SettingsStore for SqliteStore {
    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>> {
        let conn = self.lock()?;

        let settings = conn
            .query_row(
                r#"
                SELECT user_id, llm_provider, llm_model, openai_api_key, claude_api_key, gemini_api_key
                FROM user_settings
                WHERE user_id = ?1
                "#,
                params![user_id],
                |row| {
                    let provider: String = row.get(1)?;
                    Ok(UserSettings {
                        user_id: row.get(0)?,
                        llm_provider: provider.parse().unwrap_or_default(),
                        llm_model: row.get(2)?,
                        openai_api_key: row.get(3)?,
                        claude_api_key: row.get(4)?,
                        gemini_api_key: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(settings)
    }

    #[instrument(skip(self, settings), fields(user = %settings.user_id))]
    async fn save_user_settings(&self, settings: &UserSettings) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO user_settings
            (user_id, llm_provider, llm_model, openai_api_key, claude_api_key, gemini_api_key, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                settings.user_id,
                settings.llm_provider.as_str(),
                settings.llm_model,
                settings.openai_api_key,
                settings.claude_api_key,
                settings.gemini_api_key,
                format_timestamp(&Utc::now()),
            ],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;

    fn document(title: &str) -> Document {
        Document::new(
            title.to_string(),
            Some("Autor".to_string()),
            format!("1700000000000-{}.txt", title),
            "txt".to_string(),
            42,
            "user-1".to_string(),
        )
    }

    fn chunk(index: usize, content: &str, embedding: Option<Vec<f32>>) -> TextChunk {
        TextChunk {
            index,
            content: content.to_string(),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = document("livro");

        store.insert_document(&doc).await.unwrap();
        assert_eq!(store.get_document(doc.id).await.unwrap(), Some(doc.clone()));

        store
            .update_document_status(doc.id, DocumentStatus::Ready)
            .await
            .unwrap();
        let loaded = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Ready);

        assert!(store.delete_document(doc.id).await.unwrap());
        assert!(!store.delete_document(doc.id).await.unwrap());
        assert!(store.get_document(doc.id).await.unwrap().is_none());

        let missing = store
            .update_document_status(doc.id, DocumentStatus::Error)
            .await;
        assert!(matches!(missing, Err(RoteiroError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replace_chunks_overwrites_previous_set() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = document("livro");
        store.insert_document(&doc).await.unwrap();

        store
            .replace_chunks(
                doc.id,
                &[
                    chunk(0, "a", Some(vec![1.0, 0.0])),
                    chunk(1, "b", None),
                    chunk(2, "c", None),
                ],
            )
            .await
            .unwrap();
        store
            .replace_chunks(doc.id, &[chunk(0, "novo", Some(vec![0.0, 1.0]))])
            .await
            .unwrap();

        let chunks = store.get_chunks(doc.id).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "novo");
        assert_eq!(chunks[0].embedding, Some(vec![0.0, 1.0]));

        let listed = store.list_documents().await.unwrap();
        assert_eq!(listed[0].chunk_count, 1);
        assert_eq!(listed[0].embedded_chunks, 1);

        assert_eq!(store.delete_chunks(doc.id).await.unwrap(), 1);
        assert!(store.get_chunks(doc.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_document_cascades_to_chunks() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::new(&dir.path().join("db.sqlite")).unwrap();
        let doc = document("livro");
        let other = document("outro");
        store.insert_document(&doc).await.unwrap();
        store.insert_document(&other).await.unwrap();
        store
            .replace_chunks(doc.id, &[chunk(0, "a", None), chunk(1, "b", None)])
            .await
            .unwrap();
        store
            .replace_chunks(other.id, &[chunk(0, "c", None)])
            .await
            .unwrap();

        assert!(store.delete_document(doc.id).await.unwrap());

        assert!(store.get_chunks(doc.id).await.unwrap().is_empty());
        assert_eq!(store.get_chunks(other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_chunks_require_an_existing_document() {
        let store = SqliteStore::in_memory().unwrap();

        let err = store
            .replace_chunks(Uuid::new_v4(), &[chunk(0, "órfão", None)])
            .await
            .unwrap_err();

        assert!(matches!(err, RoteiroError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_match_chunks_orders_by_similarity() {
        let store = SqliteStore::in_memory().unwrap();
        let doc = document("livro");
        store.insert_document(&doc).await.unwrap();
        store
            .replace_chunks(
                doc.id,
                &[
                    chunk(0, "perto", Some(vec![0.9, 0.1, 0.0])),
                    chunk(1, "longe", Some(vec![0.0, 0.0, 1.0])),
                    chunk(2, "exato", Some(vec![1.0, 0.0, 0.0])),
                    chunk(3, "sem vetor", None),
                ],
            )
            .await
            .unwrap();

        let matches = store.match_chunks(&[1.0, 0.0, 0.0], 0.7, 5).await.unwrap();
        let contents: Vec<&str> = matches.iter().map(|m| m.chunk.content.as_str()).collect();
        assert_eq!(contents, vec!["exato", "perto"]);
        assert!((matches[0].similarity - 1.0).abs() < 0.001);

        let limited = store.match_chunks(&[1.0, 0.0, 0.0], 0.7, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_find_documents_by_status_respects_cutoff() {
        let store = SqliteStore::in_memory().unwrap();

        let mut old = document("antigo");
        old.status = DocumentStatus::Processing;
        old.created_at = Utc::now() - chrono::Duration::minutes(10);
        let mut fresh = document("recente");
        fresh.status = DocumentStatus::Processing;

        store.insert_document(&old).await.unwrap();
        store.insert_document(&fresh).await.unwrap();

        let cutoff = Utc::now() - chrono::Duration::minutes(5);
        let stale = store
            .find_documents_by_status(DocumentStatus::Processing, cutoff)
            .await
            .unwrap();

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, old.id);
    }

    #[tokio::test]
    async fn test_scripts_roundtrip_and_update() {
        let store = SqliteStore::in_memory().unwrap();
        let now = Utc::now();
        let mut script = Script {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            title: "Juros compostos".to_string(),
            theme: "juros compostos".to_string(),
            duration_minutes: 10,
            language_style: "casual".to_string(),
            environment: "youtube".to_string(),
            environment_description: None,
            target_language: "en".to_string(),
            content_portuguese: "Olá".to_string(),
            content_final: None,
            seo_title: "Juros".to_string(),
            seo_description: "Descrição".to_string(),
            seo_tags: vec!["juros".to_string(), "dinheiro".to_string()],
            thumbnail_prompt: "moedas".to_string(),
            status: ScriptStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        store.insert_script(&script).await.unwrap();

        script.status = ScriptStatus::Final;
        script.content_final = Some("Hello".to_string());
        store.update_script(&script).await.unwrap();

        let loaded = store.get_script(script.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ScriptStatus::Final);
        assert_eq!(loaded.content_final.as_deref(), Some("Hello"));
        assert_eq!(loaded.seo_tags, script.seo_tags);

        assert_eq!(store.list_scripts("user-1").await.unwrap().len(), 1);
        assert!(store.list_scripts("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_settings_upsert() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_user_settings("user-1").await.unwrap().is_none());

        let mut settings = UserSettings::default_for("user-1");
        settings.llm_provider = LlmProvider::Gemini;
        settings.llm_model = "gemini-1.5-flash".to_string();
        settings.gemini_api_key = Some("g-key".to_string());
        store.save_user_settings(&settings).await.unwrap();

        settings.llm_model = "gemini-1.5-pro".to_string();
        store.save_user_settings(&settings).await.unwrap();

        let loaded = store.get_user_settings("user-1").await.unwrap().unwrap();
        assert_eq!(loaded, settings);
    }
}
