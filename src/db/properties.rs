use crate::domain::property::PropertyRecord;
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

pub fn exists(conn: &Connection, id: &str) -> Result<bool, ServerError> {
    let found = conn
        .query_row("SELECT 1 FROM properties WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Inserts the record, or refreshes every column if its `id` is already stored.
pub fn upsert(conn: &Connection, record: &PropertyRecord) -> Result<(), ServerError> {
    if record.id.is_empty() {
        return Err(ServerError::BadRequest(format!(
            "listing without id: {}",
            record.url
        )));
    }

    conn.execute(
        r#"
        INSERT INTO properties (
            id, url, operacion, precio, moneda, expensas, calle, altura, barrio, localidad,
            m2T, m2C, ambientes, dormitorios, banios, cocheras, antiguedad, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        ON CONFLICT(id) DO UPDATE SET
            url = excluded.url,
            operacion = excluded.operacion,
            precio = excluded.precio,
            moneda = excluded.moneda,
            expensas = excluded.expensas,
            calle = excluded.calle,
            altura = excluded.altura,
            barrio = excluded.barrio,
            localidad = excluded.localidad,
            m2T = excluded.m2T,
            m2C = excluded.m2C,
            ambientes = excluded.ambientes,
            dormitorios = excluded.dormitorios,
            banios = excluded.banios,
            cocheras = excluded.cocheras,
            antiguedad = excluded.antiguedad
        "#,
        params![
            &record.id,
            &record.url,
            &record.operacion,
            &record.precio,
            &record.moneda,
            &record.expensas,
            &record.calle,
            &record.altura,
            &record.barrio,
            &record.localidad,
            &record.m2_total,
            &record.m2_cubierta,
            &record.ambientes,
            &record.dormitorios,
            &record.banios,
            &record.cocheras,
            &record.antiguedad,
            Utc::now().naive_utc(),
        ],
    )?;
    Ok(())
}

/// Every stored record, oldest first.
pub fn all(conn: &Connection) -> Result<Vec<PropertyRecord>, ServerError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, url, operacion, precio, moneda, expensas, calle, altura, barrio, localidad,
               m2T, m2C, ambientes, dormitorios, banios, cocheras, antiguedad
        FROM properties
        ORDER BY id_internal
        "#,
    )?;

    let rows = stmt.query_map([], |row| {
        // Columns are nullable for rows written by other tools.
        let text = |i: usize| -> rusqlite::Result<String> {
            Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
        };
        Ok(PropertyRecord {
            id: text(0)?,
            url: text(1)?,
            operacion: text(2)?,
            precio: text(3)?,
            moneda: text(4)?,
            expensas: text(5)?,
            calle: text(6)?,
            altura: text(7)?,
            barrio: text(8)?,
            localidad: text(9)?,
            m2_total: text(10)?,
            m2_cubierta: text(11)?,
            ambientes: text(12)?,
            dormitorios: text(13)?,
            banios: text(14)?,
            cocheras: text(15)?,
            antiguedad: text(16)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../../sql/schema.sql")).unwrap();
        conn
    }

    fn record(id: &str, precio: &str) -> PropertyRecord {
        PropertyRecord {
            id: id.into(),
            url: format!("https://www.zonaprop.com.ar/propiedades/x-{id}.html"),
            precio: precio.into(),
            moneda: "USD".into(),
            m2_total: "80".into(),
            ..Default::default()
        }
    }

    #[test]
    fn upsert_then_exists() {
        let conn = conn();
        assert!(!exists(&conn, "100").unwrap());
        upsert(&conn, &record("100", "90000")).unwrap();
        assert!(exists(&conn, "100").unwrap());
    }

    #[test]
    fn upsert_replaces_by_id() {
        let conn = conn();
        upsert(&conn, &record("100", "90000")).unwrap();
        upsert(&conn, &record("100", "85000")).unwrap();
        upsert(&conn, &record("200", "1")).unwrap();

        let stored = all(&conn).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].precio, "85000");
        assert_eq!(stored[0].m2_total, "80");
        assert_eq!(stored[1].id, "200");
    }

    #[test]
    fn rejects_missing_id() {
        let conn = conn();
        assert!(matches!(
            upsert(&conn, &record("", "1")),
            Err(ServerError::BadRequest(_))
        ));
    }
}
