//! Table registry, record shape and typed record views.

pub mod record;
pub mod table;
pub mod typed;

pub use record::{
    generate_id, into_record, is_valid_timestamp, now_timestamp, record_id, sanitize, stamp_new,
    stamp_update, Record, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
pub use table::{DefaultOrder, IntoTable, Table};
pub use typed::{
    AdvancePayment, AttendanceEntry, Bill, Customer, Employee, Payment, SalaryPayment,
    SalaryRecord, SimpleAdvance, TableRecord, TypedTable,
};
