//! Employee CSV import pipeline
//!
//! Rows are validated and inserted strictly in file order. Later rows can
//! depend on earlier ones (a repeated id is a duplicate only once the first
//! copy is stored), so rows are never validated concurrently.
//!
//! Each row is committed on its own; a rejected row never aborts the import.
//! Only storage failures abort, and rows committed before the failure stay.

pub mod record;
pub mod timestamp;

use serde::Serialize;
use sqlx::SqlitePool;
use staffdb_common::db::{
    Department, DepartmentRepository, Employee, EmployeeRepository, Job, JobRepository,
    Repository,
};
use staffdb_common::Result;
use tracing::debug;

use record::{parse_key, raw_fields, EmployeeRecord, RowRejection};
use timestamp::{parse_hired_at, strip_zulu_suffix};

/// Maximum number of employees created by one upload
///
/// Rejected and skipped rows do not count; reading stops right after the
/// insert that reaches the cap.
pub const ROW_CAP: usize = 1000;

/// Caller-controlled import behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Silently skip rows whose employee id is already stored
    pub skip_existing: bool,
}

/// One rejected row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    #[serde(rename = "row")]
    pub row_index: usize,
    #[serde(rename = "error")]
    pub message: String,
}

/// Result of one import call, serialized as `{total, error, logged}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Employees created
    pub total: usize,
    #[serde(rename = "error")]
    pub errors: Vec<RowError>,
    /// Raw fields of every rejected row, parallel to `errors`
    #[serde(rename = "logged")]
    pub logged_rows: Vec<Vec<String>>,
    /// Rows skipped because the id already existed
    #[serde(skip)]
    pub skipped: usize,
    /// Rows read from the upload
    #[serde(skip)]
    pub processed: usize,
}

#[derive(Debug)]
enum RowOutcome {
    Inserted,
    Skipped,
    Rejected(RowRejection),
}

/// Decision for a row that decoded cleanly
#[derive(Debug)]
enum Verdict {
    Accept(Employee),
    Skip,
    Reject(RowRejection),
}

/// Validates upload rows and stores the valid ones
pub struct ImportPipeline<E, D, J> {
    employees: E,
    departments: D,
    jobs: J,
}

impl ImportPipeline<EmployeeRepository, DepartmentRepository, JobRepository> {
    /// Pipeline backed by the SQLite store
    pub fn sqlite(pool: &SqlitePool) -> Self {
        Self::new(
            EmployeeRepository::new(pool.clone()),
            DepartmentRepository::new(pool.clone()),
            JobRepository::new(pool.clone()),
        )
    }
}

impl<E, D, J> ImportPipeline<E, D, J>
where
    E: Repository<Entity = Employee>,
    D: Repository<Entity = Department>,
    J: Repository<Entity = Job>,
{
    pub fn new(employees: E, departments: D, jobs: J) -> Self {
        Self {
            employees,
            departments,
            jobs,
        }
    }

    /// Import a headerless five-column CSV payload
    pub async fn run(&self, payload: &[u8], options: ImportOptions) -> Result<ImportSummary> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(payload);

        let mut summary = ImportSummary::default();
        let mut record = csv::ByteRecord::new();

        while summary.total < ROW_CAP && reader.read_byte_record(&mut record)? {
            let row_index = summary.processed;
            summary.processed += 1;

            match self.process_row(&record, options).await? {
                RowOutcome::Inserted => summary.total += 1,
                RowOutcome::Skipped => {
                    debug!(row = row_index, "Skipping existing employee");
                    summary.skipped += 1;
                }
                RowOutcome::Rejected(rejection) => {
                    debug!(row = row_index, reason = %rejection, "Row rejected");
                    summary.errors.push(RowError {
                        row_index,
                        message: rejection.to_string(),
                    });
                    summary.logged_rows.push(raw_fields(&record));
                }
            }
        }

        Ok(summary)
    }

    async fn process_row(&self, record: &csv::ByteRecord, options: ImportOptions) -> Result<RowOutcome> {
        let row = match EmployeeRecord::from_byte_record(record) {
            Ok(row) => row,
            Err(rejection) => return Ok(RowOutcome::Rejected(rejection)),
        };

        match self.validate(&row, options).await? {
            Verdict::Accept(employee) => {
                self.employees.insert(&employee).await?;
                Ok(RowOutcome::Inserted)
            }
            Verdict::Skip => Ok(RowOutcome::Skipped),
            Verdict::Reject(rejection) => Ok(RowOutcome::Rejected(rejection)),
        }
    }

    /// Apply the row rules in order; the first failing rule wins
    async fn validate(&self, row: &EmployeeRecord<'_>, options: ImportOptions) -> Result<Verdict> {
        if let Some(field) = row.first_empty_field() {
            return Ok(Verdict::Reject(RowRejection::EmptyField(field)));
        }

        let Some(id) = parse_key(row.id) else {
            return Ok(Verdict::Reject(RowRejection::InvalidEmployeeId(row.id.to_string())));
        };
        if self.employees.exists(id).await? {
            if options.skip_existing {
                return Ok(Verdict::Skip);
            }
            return Ok(Verdict::Reject(RowRejection::DuplicateId(row.id.to_string())));
        }

        if row.name.contains('_') {
            return Ok(Verdict::Reject(RowRejection::InvalidName(row.name.to_string())));
        }

        let hired = strip_zulu_suffix(row.hired_at);
        let Some(hired_at) = parse_hired_at(hired) else {
            return Ok(Verdict::Reject(RowRejection::InvalidTimestamp(hired.to_string())));
        };

        let Some(department_id) = parse_key(row.department_id) else {
            return Ok(Verdict::Reject(RowRejection::InvalidDepartmentId(row.department_id.to_string())));
        };
        let Some(department) = self.departments.get(department_id).await? else {
            return Ok(Verdict::Reject(RowRejection::UnknownDepartment(row.department_id.to_string())));
        };

        let Some(job_id) = parse_key(row.job_id) else {
            return Ok(Verdict::Reject(RowRejection::InvalidJobId(row.job_id.to_string())));
        };
        let Some(job) = self.jobs.get(job_id).await? else {
            return Ok(Verdict::Reject(RowRejection::UnknownJob(row.job_id.to_string())));
        };

        Ok(Verdict::Accept(Employee {
            id,
            name: row.name.to_string(),
            hired_at,
            department_id: department.id,
            job_id: job.id,
        }))
    }
}
