use shared::{Student, StudentFields};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Data access for the students table.
///
/// Each function runs exactly one SQL statement on the caller's session.
pub struct StudentRepository;

impl StudentRepository {
    /// Every student in natural storage order
    pub async fn list_all(conn: &mut SqliteConnection) -> sqlx::Result<Vec<Student>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, age, address, email
            FROM students
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.iter().map(row_to_student).collect())
    }

    /// Look up a student by primary key
    pub async fn get(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<Student>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, age, address, email
            FROM students
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(row_to_student))
    }

    /// Store a new student and return it with the id storage assigned
    pub async fn insert(conn: &mut SqliteConnection, fields: &StudentFields) -> sqlx::Result<Student> {
        let row = sqlx::query(
            r#"
            INSERT INTO students (name, age, address, email)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, age, address, email
            "#,
        )
        .bind(&fields.name)
        .bind(fields.age)
        .bind(&fields.address)
        .bind(&fields.email)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row_to_student(&row))
    }

    /// Overwrite all fields of an existing student. `None` when the id is unknown.
    pub async fn replace(
        conn: &mut SqliteConnection,
        id: i64,
        fields: &StudentFields,
    ) -> sqlx::Result<Option<Student>> {
        let row = sqlx::query(
            r#"
            UPDATE students
            SET name = ?, age = ?, address = ?, email = ?
            WHERE id = ?
            RETURNING id, name, age, address, email
            "#,
        )
        .bind(&fields.name)
        .bind(fields.age)
        .bind(&fields.address)
        .bind(&fields.email)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(row_to_student))
    }

    /// Hard-delete a student. Returns whether a row was removed.
    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_student(row: &SqliteRow) -> Student {
    Student {
        id: row.get("id"),
        name: row.get("name"),
        age: row.get("age"),
        address: row.get("address"),
        email: row.get("email"),
    }
}
