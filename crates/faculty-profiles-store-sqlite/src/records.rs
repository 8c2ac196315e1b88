//! [`RecordIndex`] for [`SqliteStore`]: research records with their creator
//! names and identifiers split out for filtering.

use faculty_profiles_core::{
  record::{CreatorClause, RecordFilter, ResearchRecord},
  search::{RecordPage, RecordQuery},
  store::RecordIndex,
};
use rusqlite::types::Value;

use crate::{
  Error, Result, SqliteStore,
  encode::{RawRecord, encode_dt, like_pattern, sql_offset},
};

/// `WHERE` body and bound values for a creator filter.
fn creator_condition(clauses: &[CreatorClause]) -> (String, Vec<Value>) {
  let mut conds = Vec::with_capacity(clauses.len());
  let mut values = Vec::with_capacity(clauses.len());
  for clause in clauses {
    match clause {
      CreatorClause::Identifier(id) => {
        conds.push(
          "EXISTS (SELECT 1 FROM record_creator_identifiers i
                   WHERE i.record_id = r.record_id AND i.identifier = ?)",
        );
        values.push(Value::Text(id.clone()));
      }
      CreatorClause::Name(name) => {
        conds.push(
          "EXISTS (SELECT 1 FROM record_creator_names n
                   WHERE n.record_id = r.record_id AND n.name = ?)",
        );
        values.push(Value::Text(name.clone()));
      }
    }
  }
  (format!("({})", conds.join(" OR ")), values)
}

impl RecordIndex for SqliteStore {
  type Error = Error;

  async fn index_record(&self, record: ResearchRecord) -> Result<()> {
    let creators_json = serde_json::to_string(&record.creators)?;
    let created_str   = encode_dt(record.created);
    let title_folded  = record.title.to_lowercase();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO records (record_id, title, title_folded, created_at, creators_json)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (record_id) DO UPDATE SET
             title = excluded.title,
             title_folded = excluded.title_folded,
             created_at = excluded.created_at,
             creators_json = excluded.creators_json",
          rusqlite::params![record.id, record.title, title_folded, created_str, creators_json],
        )?;
        tx.execute(
          "DELETE FROM record_creator_names WHERE record_id = ?1",
          rusqlite::params![record.id],
        )?;
        tx.execute(
          "DELETE FROM record_creator_identifiers WHERE record_id = ?1",
          rusqlite::params![record.id],
        )?;
        for creator in &record.creators {
          tx.execute(
            "INSERT INTO record_creator_names (record_id, name) VALUES (?1, ?2)",
            rusqlite::params![record.id, creator.name],
          )?;
          for identifier in &creator.identifiers {
            tx.execute(
              "INSERT INTO record_creator_identifiers (record_id, identifier) VALUES (?1, ?2)",
              rusqlite::params![record.id, identifier],
            )?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn search_records<'a>(&'a self, query: &'a RecordQuery) -> Result<RecordPage> {
    let clauses = match &query.filter {
      RecordFilter::MatchNone => {
        return Ok(RecordPage { hits: Vec::new(), total: 0, page: query.page, size: query.size });
      }
      RecordFilter::AnyOf(clauses) => clauses,
    };

    let (mut where_sql, mut values) = creator_condition(clauses);
    if let Some(q) = &query.q {
      where_sql.push_str(" AND r.title_folded LIKE ? ESCAPE '\\'");
      values.push(Value::Text(like_pattern(q)));
    }
    let limit_val  = query.size as i64;
    let offset_val = sql_offset(query.page, query.size);

    let (raws, total): (Vec<RawRecord>, i64) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM records r WHERE {where_sql}"),
          rusqlite::params_from_iter(values.iter()),
          |row| row.get(0),
        )?;

        values.push(Value::Integer(limit_val));
        values.push(Value::Integer(offset_val));
        let mut stmt = conn.prepare(&format!(
          "SELECT r.record_id, r.title, r.created_at, r.creators_json
           FROM records r
           WHERE {where_sql}
           ORDER BY r.created_at DESC, r.record_id
           LIMIT ? OFFSET ?"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params_from_iter(values.iter()), |row| {
            Ok(RawRecord {
              record_id:     row.get(0)?,
              title:         row.get(1)?,
              created_at:    row.get(2)?,
              creators_json: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((raws, total))
      })
      .await?;

    Ok(RecordPage {
      hits:  raws.into_iter().map(RawRecord::into_record).collect::<Result<_>>()?,
      total: total.unsigned_abs(),
      page:  query.page,
      size:  query.size,
    })
  }
}
