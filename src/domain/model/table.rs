//! The fixed table registry and per-table field whitelist.

use crate::error::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every logical table the layer knows about. Each maps 1:1 to a remote table
/// and a local cache partition of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Employees,
    Customers,
    Bills,
    Payments,
    SalaryRecords,
    YearlyAllocations,
    AdvancePayments,
    FamilyGroups,
    Attendance,
    SimpleAdvances,
    SalaryPayments,
    Products,
    AdvanceRecords,
}

/// Column a table is ordered by when a caller gives no explicit ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultOrder {
    pub field: &'static str,
    pub ascending: bool,
}

const USERS_FIELDS: &[&str] = &[
    "id",
    "username",
    "email",
    "full_name",
    "role",
    "permissions",
    "is_active",
    "last_login",
    "created_at",
    "updated_at",
];

const EMPLOYEES_FIELDS: &[&str] = &[
    "id",
    "name",
    "phone",
    "email",
    "address",
    "position",
    "department",
    "join_date",
    "salary",
    "salary_type",
    "status",
    "family_group_id",
    "notes",
    "created_at",
    "updated_at",
];

const CUSTOMERS_FIELDS: &[&str] = &[
    "id",
    "name",
    "phone",
    "email",
    "address",
    "gst_number",
    "balance",
    "notes",
    "created_at",
    "updated_at",
];

const BILLS_FIELDS: &[&str] = &[
    "id",
    "bill_number",
    "customer_id",
    "customer_name",
    "items",
    "subtotal",
    "tax_amount",
    "discount",
    "total_amount",
    "paid_amount",
    "status",
    "bill_date",
    "due_date",
    "notes",
    "created_at",
    "updated_at",
];

const PAYMENTS_FIELDS: &[&str] = &[
    "id",
    "bill_id",
    "customer_id",
    "amount",
    "payment_method",
    "payment_date",
    "reference",
    "notes",
    "created_at",
    "updated_at",
];

const SALARY_RECORDS_FIELDS: &[&str] = &[
    "id",
    "employee_id",
    "month",
    "year",
    "basic_salary",
    "allowances",
    "deductions",
    "advance_deduction",
    "net_salary",
    "status",
    "paid_date",
    "notes",
    "created_at",
    "updated_at",
];

const YEARLY_ALLOCATIONS_FIELDS: &[&str] = &[
    "id",
    "employee_id",
    "year",
    "allocated_amount",
    "used_amount",
    "notes",
    "created_at",
    "updated_at",
];

const ADVANCE_PAYMENTS_FIELDS: &[&str] = &[
    "id",
    "employee_id",
    "amount",
    "payment_date",
    "reason",
    "status",
    "repaid_amount",
    "notes",
    "created_at",
    "updated_at",
];

const FAMILY_GROUPS_FIELDS: &[&str] = &[
    "id",
    "name",
    "head_employee_id",
    "members",
    "notes",
    "created_at",
    "updated_at",
];

const ATTENDANCE_FIELDS: &[&str] = &[
    "id",
    "employee_id",
    "date",
    "status",
    "check_in",
    "check_out",
    "hours_worked",
    "notes",
    "created_at",
    "updated_at",
];

const SIMPLE_ADVANCES_FIELDS: &[&str] = &[
    "id",
    "employee_id",
    "amount",
    "date",
    "description",
    "created_at",
    "updated_at",
];

const SALARY_PAYMENTS_FIELDS: &[&str] = &[
    "id",
    "employee_id",
    "salary_record_id",
    "amount",
    "payment_date",
    "payment_method",
    "month",
    "year",
    "notes",
    "created_at",
    "updated_at",
];

const PRODUCTS_FIELDS: &[&str] = &[
    "id",
    "name",
    "sku",
    "category",
    "unit",
    "price",
    "stock_quantity",
    "description",
    "is_active",
    "created_at",
    "updated_at",
];

const ADVANCE_RECORDS_FIELDS: &[&str] = &[
    "id",
    "employee_id",
    "amount",
    "date",
    "type",
    "description",
    "balance",
    "created_at",
    "updated_at",
];

impl Table {
    /// All registered tables, in registry order.
    pub const ALL: [Table; 14] = [
        Table::Users,
        Table::Employees,
        Table::Customers,
        Table::Bills,
        Table::Payments,
        Table::SalaryRecords,
        Table::YearlyAllocations,
        Table::AdvancePayments,
        Table::FamilyGroups,
        Table::Attendance,
        Table::SimpleAdvances,
        Table::SalaryPayments,
        Table::Products,
        Table::AdvanceRecords,
    ];

    /// Remote table name and local cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Employees => "employees",
            Table::Customers => "customers",
            Table::Bills => "bills",
            Table::Payments => "payments",
            Table::SalaryRecords => "salary_records",
            Table::YearlyAllocations => "yearly_allocations",
            Table::AdvancePayments => "advance_payments",
            Table::FamilyGroups => "family_groups",
            Table::Attendance => "attendance",
            Table::SimpleAdvances => "simple_advances",
            Table::SalaryPayments => "salary_payments",
            Table::Products => "products",
            Table::AdvanceRecords => "advance_records",
        }
    }

    /// The ordered whitelist of fields permitted in a write to this table.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Table::Users => USERS_FIELDS,
            Table::Employees => EMPLOYEES_FIELDS,
            Table::Customers => CUSTOMERS_FIELDS,
            Table::Bills => BILLS_FIELDS,
            Table::Payments => PAYMENTS_FIELDS,
            Table::SalaryRecords => SALARY_RECORDS_FIELDS,
            Table::YearlyAllocations => YEARLY_ALLOCATIONS_FIELDS,
            Table::AdvancePayments => ADVANCE_PAYMENTS_FIELDS,
            Table::FamilyGroups => FAMILY_GROUPS_FIELDS,
            Table::Attendance => ATTENDANCE_FIELDS,
            Table::SimpleAdvances => SIMPLE_ADVANCES_FIELDS,
            Table::SalaryPayments => SALARY_PAYMENTS_FIELDS,
            Table::Products => PRODUCTS_FIELDS,
            Table::AdvanceRecords => ADVANCE_RECORDS_FIELDS,
        }
    }

    pub fn allows(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }

    pub fn default_order(&self) -> DefaultOrder {
        match self {
            Table::Attendance => DefaultOrder {
                field: "date",
                ascending: false,
            },
            Table::Products | Table::FamilyGroups => DefaultOrder {
                field: "name",
                ascending: true,
            },
            _ => DefaultOrder {
                field: "created_at",
                ascending: false,
            },
        }
    }

    /// Resolves a table name, failing fast on anything outside the registry.
    pub fn parse(name: &str) -> Result<Table, DataError> {
        name.parse()
    }
}

impl FromStr for Table {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DataError::InvalidTable(s.to_string()))
    }
}

/// Anything the data service accepts as a table reference.
pub trait IntoTable {
    fn into_table(self) -> Result<Table, DataError>;
}

impl IntoTable for Table {
    fn into_table(self) -> Result<Table, DataError> {
        Ok(self)
    }
}

impl IntoTable for &str {
    fn into_table(self) -> Result<Table, DataError> {
        Table::parse(self)
    }
}

impl IntoTable for &String {
    fn into_table(self) -> Result<Table, DataError> {
        Table::parse(self)
    }
}

impl IntoTable for String {
    fn into_table(self) -> Result<Table, DataError> {
        Table::parse(&self)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
