use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// One stored record. `sno` is the surrogate serial number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Record {
    pub sno: i32,
    pub fname: String,
    pub lname: String,
    pub email: String,
}

impl Record {
    /// All records in insertion order.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Record>> {
        let rows = sqlx::query_as::<_, Record>(
            r#"
            SELECT sno, fname, lname, email
            FROM records
            ORDER BY sno
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, sno: i32) -> anyhow::Result<Option<Record>> {
        let row = sqlx::query_as::<_, Record>(
            r#"
            SELECT sno, fname, lname, email
            FROM records
            WHERE sno = $1
            "#,
        )
        .bind(sno)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(
        db: &PgPool,
        fname: &str,
        lname: &str,
        email: &str,
    ) -> anyhow::Result<Record> {
        let mut tx = db.begin().await?;
        let row = sqlx::query_as::<_, Record>(
            r#"
            INSERT INTO records (fname, lname, email)
            VALUES ($1, $2, $3)
            RETURNING sno, fname, lname, email
            "#,
        )
        .bind(fname)
        .bind(lname)
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Overwrite the three fields of one record. Returns the number of rows
    /// touched; zero means the record was gone.
    pub async fn update(
        db: &PgPool,
        sno: i32,
        fname: &str,
        lname: &str,
        email: &str,
    ) -> anyhow::Result<u64> {
        let mut tx = db.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE records
            SET fname = $2, lname = $3, email = $4
            WHERE sno = $1
            "#,
        )
        .bind(sno)
        .bind(fname)
        .bind(lname)
        .bind(email)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    /// Delete by serial number; deleting a missing row affects zero rows and
    /// is not an error.
    pub async fn delete(db: &PgPool, sno: i32) -> anyhow::Result<u64> {
        let mut tx = db.begin().await?;
        let result = sqlx::query(
            r#"
            DELETE FROM records
            WHERE sno = $1
            "#,
        )
        .bind(sno)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn create_then_list_returns_the_new_row(db: PgPool) -> anyhow::Result<()> {
        let created = Record::create(&db, "Ana", "Lee", "ana@x.com").await?;
        assert!(created.sno > 0);

        let rows = Record::list_all(&db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fname, "Ana");
        assert_eq!(rows[0].lname, "Lee");
        assert_eq!(rows[0].email, "ana@x.com");
        Ok(())
    }

    #[sqlx::test]
    async fn delete_of_missing_id_is_a_no_op(db: PgPool) -> anyhow::Result<()> {
        let kept = Record::create(&db, "Ana", "Lee", "ana@x.com").await?;

        let affected = Record::delete(&db, kept.sno + 100).await?;
        assert_eq!(affected, 0);

        // Repeating the miss is equally harmless.
        assert_eq!(Record::delete(&db, kept.sno + 100).await?, 0);
        assert_eq!(Record::list_all(&db).await?.len(), 1);

        assert_eq!(Record::delete(&db, kept.sno).await?, 1);
        assert!(Record::list_all(&db).await?.is_empty());
        Ok(())
    }

    #[sqlx::test]
    async fn update_touches_only_the_target_row(db: PgPool) -> anyhow::Result<()> {
        let first = Record::create(&db, "Ana", "Lee", "ana@x.com").await?;
        let second = Record::create(&db, "Ben", "Cho", "ben@x.com").await?;

        let affected = Record::update(&db, first.sno, "Anya", "Lee", "anya@x.com").await?;
        assert_eq!(affected, 1);

        let updated = Record::find(&db, first.sno).await?.unwrap();
        assert_eq!(updated.fname, "Anya");
        assert_eq!(updated.email, "anya@x.com");

        let untouched = Record::find(&db, second.sno).await?.unwrap();
        assert_eq!(untouched.fname, "Ben");
        assert_eq!(untouched.email, "ben@x.com");

        assert_eq!(
            Record::update(&db, second.sno + 100, "X", "Y", "z@x.com").await?,
            0
        );
        Ok(())
    }
}
