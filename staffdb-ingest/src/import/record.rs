//! Upload row decoding and rejection reasons

use csv::ByteRecord;
use std::fmt;
use thiserror::Error;

/// Number of positional fields in an employee row
pub const EMPLOYEE_FIELDS: usize = 5;

/// Positional field of an employee row, named as in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Name,
    HiredAt,
    Department,
    Job,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Id => "ID",
            Field::Name => "Name",
            Field::HiredAt => "Hired time",
            Field::Department => "Department",
            Field::Job => "Job",
        };
        f.write_str(label)
    }
}

/// Why a row was not imported
///
/// The `Display` text is what the caller sees in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("Malformed row: expected 5 fields, found {found}")]
    Malformed { found: usize },

    #[error("Row is not valid UTF-8")]
    NotUtf8,

    #[error("Employee {0} is empty")]
    EmptyField(Field),

    #[error("Invalid Employee ID {0}")]
    InvalidEmployeeId(String),

    #[error("Employee {0} already exists")]
    DuplicateId(String),

    #[error("Invalid characters in employee name {0}")]
    InvalidName(String),

    #[error("Invalid Datetime Format {0}")]
    InvalidTimestamp(String),

    #[error("Invalid Department ID {0}")]
    InvalidDepartmentId(String),

    #[error("Department ID {0} does not exists.")]
    UnknownDepartment(String),

    #[error("Invalid Job ID {0}")]
    InvalidJobId(String),

    #[error("Job ID {0} does not exists.")]
    UnknownJob(String),
}

/// Borrowed view of the five positional fields of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmployeeRecord<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub hired_at: &'a str,
    pub department_id: &'a str,
    pub job_id: &'a str,
}

impl<'a> EmployeeRecord<'a> {
    /// Decode the first five fields; trailing fields are ignored
    pub fn from_byte_record(record: &'a ByteRecord) -> Result<Self, RowRejection> {
        if record.len() < EMPLOYEE_FIELDS {
            return Err(RowRejection::Malformed {
                found: record.len(),
            });
        }

        let field = move |index: usize| -> Result<&'a str, RowRejection> {
            std::str::from_utf8(&record[index]).map_err(|_| RowRejection::NotUtf8)
        };

        Ok(Self {
            id: field(0)?,
            name: field(1)?,
            hired_at: field(2)?,
            department_id: field(3)?,
            job_id: field(4)?,
        })
    }

    /// First empty field in positional order
    pub fn first_empty_field(&self) -> Option<Field> {
        [
            (Field::Id, self.id),
            (Field::Name, self.name),
            (Field::HiredAt, self.hired_at),
            (Field::Department, self.department_id),
            (Field::Job, self.job_id),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
    }
}

/// Parse an integer key, tolerating surrounding whitespace
pub fn parse_key(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// Raw row as echoed back to the caller
pub fn raw_fields(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}
