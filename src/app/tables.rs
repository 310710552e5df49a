//! Named per-table wrappers over the generic verbs.
//!
//! They add nothing but the table's fixed default ordering on reads.

use crate::app::data_service::DataService;
use crate::domain::model::{Record, Table};
use crate::domain::query::Query;
use crate::error::Result;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Equality / set-membership filters, as in `Query::where`.
pub type Filters = BTreeMap<String, JsonValue>;

/// Query with `filters` and the table's default ordering.
pub fn default_query(table: Table, filters: Filters) -> Query {
    let order = table.default_order();
    Query {
        r#where: filters,
        ..Query::default()
    }
    .order_by(order.field, order.ascending)
}

macro_rules! table_wrappers {
    ($($table:ident => $get:ident, $create:ident, $update:ident, $delete:ident;)*) => {
        impl DataService {
            $(
                #[doc = concat!("Reads `", stringify!($table), "` with its default ordering.")]
                pub async fn $get(&self, filters: Filters) -> Result<Vec<Record>> {
                    self.read(Table::$table, default_query(Table::$table, filters)).await
                }

                pub async fn $create(&self, data: Record) -> Result<Record> {
                    self.create(Table::$table, data).await
                }

                pub async fn $update(&self, id: &str, data: Record) -> Result<Record> {
                    self.update(Table::$table, id, data).await
                }

                pub async fn $delete(&self, id: &str) -> Result<()> {
                    self.delete(Table::$table, id).await
                }
            )*
        }
    };
}

table_wrappers! {
    Users => get_users, create_user, update_user, delete_user;
    Employees => get_employees, create_employee, update_employee, delete_employee;
    Customers => get_customers, create_customer, update_customer, delete_customer;
    Bills => get_bills, create_bill, update_bill, delete_bill;
    Payments => get_payments, create_payment, update_payment, delete_payment;
    SalaryRecords => get_salary_records, create_salary_record, update_salary_record, delete_salary_record;
    YearlyAllocations => get_yearly_allocations, create_yearly_allocation, update_yearly_allocation, delete_yearly_allocation;
    AdvancePayments => get_advance_payments, create_advance_payment, update_advance_payment, delete_advance_payment;
    FamilyGroups => get_family_groups, create_family_group, update_family_group, delete_family_group;
    Attendance => get_attendance, create_attendance, update_attendance, delete_attendance;
    SimpleAdvances => get_simple_advances, create_simple_advance, update_simple_advance, delete_simple_advance;
    SalaryPayments => get_salary_payments, create_salary_payment, update_salary_payment, delete_salary_payment;
    Products => get_products, create_product, update_product, delete_product;
    AdvanceRecords => get_advance_records, create_advance_record, update_advance_record, delete_advance_record;
}
