//! Strongly typed views over records of the tables that read-side helpers compose.
//!
//! Records stay untyped maps at the storage boundary; these views are produced
//! from them after they pass the whitelist. Numeric columns are decoded leniently
//! because form input frequently arrives as numeric strings.

use crate::domain::model::{Record, Table};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// A typed view bound to one registry table.
pub trait TypedTable: DeserializeOwned + Serialize + Send {
    const TABLE: Table;

    fn from_record(record: Record) -> Result<Self> {
        Ok(serde_json::from_value(JsonValue::Object(record))?)
    }

    fn into_record(self) -> Result<Record> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map),
            _ => Ok(Record::new()),
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    let v = Option::<JsonValue>::deserialize(d)?;
    Ok(match v {
        Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(0.0),
        Some(JsonValue::Bool(b)) => f64::from(u8::from(b)),
        _ => 0.0,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(lenient_opt_string(d)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    let v = Option::<JsonValue>::deserialize(d)?;
    Ok(match v {
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        Some(JsonValue::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub created_at: Option<String>,
}

impl TypedTable for Employee {
    const TABLE: Table = Table::Employees;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: f64,
}

impl TypedTable for Customer {
    const TABLE: Table = Table::Customers;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub bill_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub paid_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub bill_date: Option<String>,
}

impl Bill {
    /// A bill counts as pending until its status says otherwise or it is fully paid.
    pub fn is_pending(&self) -> bool {
        match self.status.as_deref() {
            Some("paid") | Some("cancelled") => false,
            _ => self.paid_amount < self.total_amount,
        }
    }
}

impl TypedTable for Bill {
    const TABLE: Table = Table::Bills;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub bill_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub payment_date: Option<String>,
}

impl TypedTable for Payment {
    const TABLE: Table = Table::Payments;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub basic_salary: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub allowances: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub deductions: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub advance_deduction: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_salary: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
}

impl TypedTable for SalaryRecord {
    const TABLE: Table = Table::SalaryRecords;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryPayment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub salary_record_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub payment_date: Option<String>,
}

impl TypedTable for SalaryPayment {
    const TABLE: Table = Table::SalaryPayments;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancePayment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub employee_id: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub repaid_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub payment_date: Option<String>,
}

impl AdvancePayment {
    pub fn outstanding(&self) -> f64 {
        (self.amount - self.repaid_amount).max(0.0)
    }
}

impl TypedTable for AdvancePayment {
    const TABLE: Table = Table::AdvancePayments;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleAdvance {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub employee_id: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub date: Option<String>,
}

impl TypedTable for SimpleAdvance {
    const TABLE: Table = Table::SimpleAdvances;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hours_worked: f64,
}

impl TypedTable for AttendanceEntry {
    const TABLE: Table = Table::Attendance;
}

/// A record decoded into the typed view for its table, when one exists.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRecord {
    Employee(Employee),
    Customer(Customer),
    Bill(Bill),
    Payment(Payment),
    SalaryRecord(SalaryRecord),
    SalaryPayment(SalaryPayment),
    AdvancePayment(AdvancePayment),
    SimpleAdvance(SimpleAdvance),
    Attendance(AttendanceEntry),
    Untyped(Table, Record),
}

impl TableRecord {
    pub fn decode(table: Table, record: Record) -> Result<Self> {
        Ok(match table {
            Table::Employees => TableRecord::Employee(Employee::from_record(record)?),
            Table::Customers => TableRecord::Customer(Customer::from_record(record)?),
            Table::Bills => TableRecord::Bill(Bill::from_record(record)?),
            Table::Payments => TableRecord::Payment(Payment::from_record(record)?),
            Table::SalaryRecords => TableRecord::SalaryRecord(SalaryRecord::from_record(record)?),
            Table::SalaryPayments => {
                TableRecord::SalaryPayment(SalaryPayment::from_record(record)?)
            }
            Table::AdvancePayments => {
                TableRecord::AdvancePayment(AdvancePayment::from_record(record)?)
            }
            Table::SimpleAdvances => {
                TableRecord::SimpleAdvance(SimpleAdvance::from_record(record)?)
            }
            Table::Attendance => TableRecord::Attendance(AttendanceEntry::from_record(record)?),
            other => TableRecord::Untyped(other, record),
        })
    }

    pub fn table(&self) -> Table {
        match self {
            TableRecord::Employee(_) => Employee::TABLE,
            TableRecord::Customer(_) => Customer::TABLE,
            TableRecord::Bill(_) => Bill::TABLE,
            TableRecord::Payment(_) => Payment::TABLE,
            TableRecord::SalaryRecord(_) => SalaryRecord::TABLE,
            TableRecord::SalaryPayment(_) => SalaryPayment::TABLE,
            TableRecord::AdvancePayment(_) => AdvancePayment::TABLE,
            TableRecord::SimpleAdvance(_) => SimpleAdvance::TABLE,
            TableRecord::Attendance(_) => AttendanceEntry::TABLE,
            TableRecord::Untyped(table, _) => *table,
        }
    }
}
