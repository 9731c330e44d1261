//! SQLite-backed catalog store implementation.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{Book, CatalogStore, Category, StoreError};

/// SQLite-backed catalog store.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open a catalog store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- Canonical book records (one row per upstream volume id)
            CREATE TABLE IF NOT EXISTS books (
                book_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT,
                cover_url TEXT,
                description TEXT,
                published_date TEXT,
                ratings_count INTEGER,
                average_rating REAL,
                fetched_at INTEGER NOT NULL,
                last_opened_at INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS categories (
                category_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                query_hint TEXT NOT NULL,
                fetched_at INTEGER NOT NULL DEFAULT 0
            );

            -- Ordered category -> book association, rewritten in full per refresh
            CREATE TABLE IF NOT EXISTS category_books (
                category_id INTEGER NOT NULL REFERENCES categories(category_id) ON DELETE CASCADE,
                book_id TEXT NOT NULL REFERENCES books(book_id),
                sort_order INTEGER NOT NULL,
                PRIMARY KEY (category_id, book_id)
            );

            CREATE INDEX IF NOT EXISTS idx_category_books_order
                ON category_books(category_id, sort_order);

            CREATE TABLE IF NOT EXISTS search_cache (
                query TEXT PRIMARY KEY,
                fetched_at INTEGER NOT NULL DEFAULT 0
            );

            -- Ordered search-query -> book association, rewritten in full per refresh
            CREATE TABLE IF NOT EXISTS search_cache_books (
                query TEXT NOT NULL REFERENCES search_cache(query) ON DELETE CASCADE,
                book_id TEXT NOT NULL REFERENCES books(book_id),
                sort_order INTEGER NOT NULL,
                PRIMARY KEY (query, book_id)
            );

            CREATE INDEX IF NOT EXISTS idx_search_cache_books_order
                ON search_cache_books(query, sort_order);
            "#,
        )?;

        Ok(())
    }

    fn row_to_book(row: &rusqlite::Row) -> rusqlite::Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            cover_url: row.get(3)?,
            description: row.get(4)?,
            published_date: row.get(5)?,
            ratings_count: row.get(6)?,
            average_rating: row.get(7)?,
            fetched_at: row.get(8)?,
            last_opened_at: row.get(9)?,
        })
    }

    fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            query_hint: row.get(2)?,
            fetched_at: row.get(3)?,
        })
    }
}

impl CatalogStore for SqliteCatalog {
    fn upsert_book(&self, book: &Book) -> Result<(), StoreError> {
        if book.title.trim().is_empty() {
            return Err(StoreError::Constraint(format!(
                "book {} has an empty title",
                book.id
            )));
        }

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO books (book_id, title, author, cover_url, description,
                                published_date, ratings_count, average_rating,
                                fetched_at, last_opened_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(book_id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                cover_url = excluded.cover_url,
                description = excluded.description,
                published_date = excluded.published_date,
                ratings_count = excluded.ratings_count,
                average_rating = excluded.average_rating,
                fetched_at = excluded.fetched_at",
            params![
                &book.id,
                &book.title,
                &book.author,
                &book.cover_url,
                &book.description,
                &book.published_date,
                &book.ratings_count,
                &book.average_rating,
                book.fetched_at,
                book.last_opened_at,
            ],
        )?;

        Ok(())
    }

    fn get_book(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let book = conn
            .query_row(
                "SELECT book_id, title, author, cover_url, description,
                        published_date, ratings_count, average_rating,
                        fetched_at, last_opened_at
                 FROM books WHERE book_id = ?",
                params![id],
                Self::row_to_book,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                _ => Err(e),
            })?;

        Ok(book)
    }

    fn touch_last_opened(&self, id: &str, timestamp: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE books SET last_opened_at = ? WHERE book_id = ?",
            params![timestamp, id],
        )?;
        Ok(())
    }

    fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT category_id, name, query_hint, fetched_at
             FROM categories ORDER BY category_id ASC",
        )?;

        let rows = stmt.query_map([], Self::row_to_category)?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    fn get_category(&self, category_id: i64) -> Result<Option<Category>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let category = conn
            .query_row(
                "SELECT category_id, name, query_hint, fetched_at
                 FROM categories WHERE category_id = ?",
                params![category_id],
                Self::row_to_category,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                _ => Err(e),
            })?;

        Ok(category)
    }

    fn insert_category(&self, name: &str, query_hint: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO categories (name, query_hint, fetched_at) VALUES (?, ?, 0)",
            params![name, query_hint],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Constraint(format!("category name '{}' already exists", name))
            }
            _ => StoreError::Database(e.to_string()),
        })?;

        Ok(conn.last_insert_rowid())
    }

    fn get_category_books(&self, category_id: i64) -> Result<Vec<Book>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT b.book_id, b.title, b.author, b.cover_url, b.description,
                    b.published_date, b.ratings_count, b.average_rating,
                    b.fetched_at, b.last_opened_at
             FROM books b
             INNER JOIN category_books cb ON b.book_id = cb.book_id
             WHERE cb.category_id = ?
             ORDER BY cb.sort_order ASC",
        )?;

        let rows = stmt.query_map(params![category_id], Self::row_to_book)?;

        let mut books = Vec::new();
        for row in rows {
            books.push(row?);
        }
        Ok(books)
    }

    fn replace_category_books(
        &self,
        category_id: i64,
        ordered_book_ids: &[String],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM category_books WHERE category_id = ?",
            params![category_id],
        )?;

        for (index, book_id) in ordered_book_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO category_books (category_id, book_id, sort_order)
                 VALUES (?, ?, ?)",
                params![category_id, book_id, index as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_category_fetched_at(&self, category_id: i64) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let fetched_at = conn
            .query_row(
                "SELECT fetched_at FROM categories WHERE category_id = ?",
                params![category_id],
                |row| row.get(0),
            )
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(0),
                _ => Err(e),
            })?;

        Ok(fetched_at)
    }

    fn set_category_fetched_at(&self, category_id: i64, timestamp: i64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE categories SET fetched_at = ? WHERE category_id = ?",
            params![timestamp, category_id],
        )?;
        Ok(())
    }

    fn get_search_cache_books(&self, normalized_query: &str) -> Result<Vec<Book>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT b.book_id, b.title, b.author, b.cover_url, b.description,
                    b.published_date, b.ratings_count, b.average_rating,
                    b.fetched_at, b.last_opened_at
             FROM books b
             INNER JOIN search_cache_books scb ON b.book_id = scb.book_id
             WHERE scb.query = ?
             ORDER BY scb.sort_order ASC",
        )?;

        let rows = stmt.query_map(params![normalized_query], Self::row_to_book)?;

        let mut books = Vec::new();
        for row in rows {
            books.push(row?);
        }
        Ok(books)
    }

    fn replace_search_cache_books(
        &self,
        normalized_query: &str,
        ordered_book_ids: &[String],
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        // Parent row must exist before association rows; fetched_at is set
        // separately once the whole refresh commits.
        tx.execute(
            "INSERT OR IGNORE INTO search_cache (query, fetched_at) VALUES (?, 0)",
            params![normalized_query],
        )?;

        tx.execute(
            "DELETE FROM search_cache_books WHERE query = ?",
            params![normalized_query],
        )?;

        for (index, book_id) in ordered_book_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO search_cache_books (query, book_id, sort_order)
                 VALUES (?, ?, ?)",
                params![normalized_query, book_id, index as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_search_cache_fetched_at(&self, normalized_query: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let fetched_at = conn
            .query_row(
                "SELECT fetched_at FROM search_cache WHERE query = ?",
                params![normalized_query],
                |row| row.get(0),
            )
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(0),
                _ => Err(e),
            })?;

        Ok(fetched_at)
    }

    fn set_search_cache_fetched_at(
        &self,
        normalized_query: &str,
        timestamp: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        // Plain upsert; INSERT OR REPLACE would cascade-delete the
        // association rows through the foreign key.
        conn.execute(
            "INSERT INTO search_cache (query, fetched_at) VALUES (?1, ?2)
             ON CONFLICT(query) DO UPDATE SET fetched_at = excluded.fetched_at",
            params![normalized_query, timestamp],
        )?;
        Ok(())
    }

    fn prune_search_cache(&self, max_entries: u32) -> Result<u32, StoreError> {
        let conn = self.conn.lock().unwrap();

        let total: u32 =
            conn.query_row("SELECT COUNT(*) FROM search_cache", [], |row| row.get(0))?;

        if total <= max_entries {
            return Ok(0);
        }

        let excess = total - max_entries;
        let deleted = conn.execute(
            "DELETE FROM search_cache WHERE query IN (
                 SELECT query FROM search_cache ORDER BY fetched_at ASC LIMIT ?
             )",
            params![excess],
        )?;

        Ok(deleted as u32)
    }
}
