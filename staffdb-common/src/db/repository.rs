//! Repository interface and SQLite repositories
//!
//! Validation code talks to storage only through [`Repository`], so the
//! import pipeline can run against any store that answers `exists`, `get`
//! and `insert` by integer id.

use crate::db::models::{Department, Employee, Job};
use crate::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::marker::PhantomData;

/// Keyed access to one entity kind
#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;

    /// Whether a row with this id is present
    async fn exists(&self, id: i64) -> Result<bool>;

    /// Load a row by id
    async fn get(&self, id: i64) -> Result<Option<Self::Entity>>;

    /// Insert a new row; fails if the id is already taken
    async fn insert(&self, entity: &Self::Entity) -> Result<()>;
}

/// Shape shared by the `{id, name}` reference tables
pub trait ReferenceEntity: Send + Sync + Unpin + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> {
    const TABLE: &'static str;

    fn new(id: i64, name: String) -> Self;
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

impl ReferenceEntity for Department {
    const TABLE: &'static str = "departments";

    fn new(id: i64, name: String) -> Self {
        Self { id, name }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ReferenceEntity for Job {
    const TABLE: &'static str = "jobs";

    fn new(id: i64, name: String) -> Self {
        Self { id, name }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// SQLite repository for a reference table
pub struct ReferenceRepository<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

pub type DepartmentRepository = ReferenceRepository<Department>;
pub type JobRepository = ReferenceRepository<Job>;

impl<T> Clone for ReferenceRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: ReferenceEntity> ReferenceRepository<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// Insert every row whose id is not yet present, in one transaction
    ///
    /// Returns the number of rows inserted. Ids repeated within `rows` are
    /// inserted once (first occurrence wins).
    pub async fn insert_missing(&self, rows: &[T]) -> Result<usize> {
        let exists_sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", T::TABLE);
        let insert_sql = format!("INSERT INTO {} (id, name) VALUES (?, ?)", T::TABLE);

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for row in rows {
            let present: bool = sqlx::query_scalar(&exists_sql)
                .bind(row.id())
                .fetch_one(&mut *tx)
                .await?;
            if present {
                continue;
            }

            sqlx::query(&insert_sql)
                .bind(row.id())
                .bind(row.name())
                .execute(&mut *tx)
                .await?;
            inserted += 1;
        }

        tx.commit().await?;

        Ok(inserted)
    }

    /// Number of rows in the table
    pub async fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// All rows ordered by id
    pub async fn list(&self) -> Result<Vec<T>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY id", T::TABLE);
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

#[async_trait]
impl<T: ReferenceEntity> Repository for ReferenceRepository<T> {
    type Entity = T;

    async fn exists(&self, id: i64) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", T::TABLE);
        let present = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(present)
    }

    async fn get(&self, id: i64) -> Result<Option<T>> {
        let sql = format!("SELECT id, name FROM {} WHERE id = ?", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, entity: &T) -> Result<()> {
        let sql = format!("INSERT INTO {} (id, name) VALUES (?, ?)", T::TABLE);
        sqlx::query(&sql)
            .bind(entity.id())
            .bind(entity.name())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// SQLite repository for imported employees
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Repository for EmployeeRepository {
    type Entity = Employee;

    async fn exists(&self, id: i64) -> Result<bool> {
        let present = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(present)
    }

    async fn get(&self, id: i64) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, hired_at, department_id, job_id
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert(&self, employee: &Employee) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (id, name, hired_at, department_id, job_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee.id)
        .bind(&employee.name)
        .bind(employee.hired_at)
        .bind(employee.department_id)
        .bind(employee.job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
