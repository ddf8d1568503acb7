use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};

use crate::catalog::ProductRecord;
use crate::compare::ReferenceProduct;

pub const DB_PATH: &str = "data/catalog.sqlite";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

/// Open a database that `store` already wrote. Never creates the file.
pub fn open_existing(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database {}", path.display()))
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS products (
            sequence     INTEGER PRIMARY KEY,
            ordinal      INTEGER,
            line         INTEGER NOT NULL,
            name         TEXT NOT NULL,
            product_id   TEXT,
            price_major  REAL,
            price_minor  INTEGER,
            quantity     INTEGER CHECK(quantity IS NULL OR quantity >= 0),
            status       TEXT,
            location     TEXT,
            imported_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_products_product_id ON products(product_id);
        ",
    )?;
    Ok(())
}

/// Replace the stored catalog with `products` in one transaction.
pub fn save_products(conn: &Connection, products: &[ProductRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        tx.execute("DELETE FROM products", [])?;
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO products
             (sequence, ordinal, line, name, product_id, price_major, price_minor, quantity, status, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for p in products {
            count += stmt.execute(rusqlite::params![
                p.sequence as i64,
                p.ordinal,
                p.line as i64,
                p.name,
                p.id,
                p.price_major,
                p.price_minor,
                p.quantity,
                p.status,
                p.location,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_products(conn: &Connection) -> Result<Vec<ProductRecord>> {
    let mut stmt = conn.prepare(
        "SELECT sequence, ordinal, line, name, product_id, price_major, price_minor,
                quantity, status, location
         FROM products ORDER BY sequence",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let sequence: i64 = row.get(0)?;
            let line: i64 = row.get(2)?;
            Ok(ProductRecord {
                sequence: sequence as usize,
                ordinal: row.get(1)?,
                line: line as usize,
                name: row.get(3)?,
                id: row.get(4)?,
                price_major: row.get(5)?,
                price_minor: row.get(6)?,
                quantity: row.get(7)?,
                status: row.get(8)?,
                location: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Stored products in the shape of an application export.
pub fn fetch_reference(conn: &Connection) -> Result<Vec<ReferenceProduct>> {
    Ok(fetch_products(conn)?
        .into_iter()
        .map(|p| ReferenceProduct {
            id: p.id,
            name: p.name,
            daily_rate: p.price_major,
            quantity: p.quantity,
        })
        .collect())
}

pub struct Stats {
    pub total: usize,
    pub priced: usize,
    pub with_id: usize,
    pub total_minor: i64,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let (total, priced, with_id, total_minor): (i64, i64, i64, i64) = conn.query_row(
        "SELECT COUNT(*),
                COUNT(price_minor),
                COUNT(product_id),
                CAST(TOTAL(price_minor) AS INTEGER)
         FROM products",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;
    Ok(Stats {
        total: total as usize,
        priced: priced as usize,
        with_id: with_id as usize,
        total_minor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fields::FieldLabels;
    use crate::catalog::parse_catalog;

    fn fixture() -> Vec<ProductRecord> {
        let md = std::fs::read_to_string("tests/fixtures/catalog.md").unwrap();
        parse_catalog(&md, &FieldLabels::PORTUGUESE)
    }

    #[test]
    fn store_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let conn = connect(&dir.path().join("nested/catalog.sqlite")).unwrap();
        init_schema(&conn).unwrap();

        let products = fixture();
        assert_eq!(save_products(&conn, &products).unwrap(), 6);
        assert_eq!(fetch_products(&conn).unwrap(), products);

        let s = get_stats(&conn).unwrap();
        assert_eq!(s.total, 6);
        assert_eq!(s.priced, 5);
        assert_eq!(s.with_id, 5);
        assert_eq!(s.total_minor, 19_079);
    }

    #[test]
    fn open_existing_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo/catalog.sqlite");
        let err = open_existing(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to open database"));
        assert!(!path.exists());
        assert!(!dir.path().join("typo").exists());
    }

    #[test]
    fn open_existing_reads_stored_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.sqlite");
        let conn = connect(&path).unwrap();
        init_schema(&conn).unwrap();
        save_products(&conn, &fixture()).unwrap();
        drop(conn);

        let conn = open_existing(&path).unwrap();
        assert_eq!(fetch_reference(&conn).unwrap().len(), 6);
    }

    #[test]
    fn save_replaces_previous_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let conn = connect(&dir.path().join("catalog.sqlite")).unwrap();
        init_schema(&conn).unwrap();

        save_products(&conn, &fixture()).unwrap();
        let smaller = parse_catalog("#### 1. Tripod\n", &FieldLabels::PORTUGUESE);
        save_products(&conn, &smaller).unwrap();

        let stored = fetch_products(&conn).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Tripod");
        assert_eq!(stored[0].price_minor, None);
    }

    #[test]
    fn stored_catalog_compares_clean_against_itself() {
        let dir = tempfile::tempdir().unwrap();
        let conn = connect(&dir.path().join("catalog.sqlite")).unwrap();
        init_schema(&conn).unwrap();
        let products = fixture();
        save_products(&conn, &products).unwrap();

        let reference = fetch_reference(&conn).unwrap();
        let c = crate::compare::compare(&products, &reference);
        assert_eq!(c.mismatches(), 0);
        assert_eq!(c.missing_in_reference(), 0);
        assert!(c.missing_in_catalog.is_empty());
    }
}
