//! Read-side aggregates. Best-effort: a constituent read that fails counts as
//! empty, so these never return an error.

use crate::app::data_service::DataService;
use crate::domain::model::{
    AdvancePayment, AttendanceEntry, Bill, Customer, Employee, Payment, SalaryPayment,
    SalaryRecord, SimpleAdvance, TypedTable,
};
use crate::domain::query::Query;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceCounts {
    pub present: usize,
    pub absent: usize,
    pub half_day: usize,
    pub leave: usize,
    pub total: usize,
}

impl AttendanceCounts {
    fn record(&mut self, status: Option<&str>) {
        self.total += 1;
        let status = status
            .unwrap_or_default()
            .trim()
            .to_lowercase()
            .replace(['-', ' '], "_");
        match status.as_str() {
            "present" => self.present += 1,
            "absent" => self.absent += 1,
            "half_day" | "halfday" => self.half_day += 1,
            "leave" | "on_leave" => self.leave += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct EmployeeSummary {
    pub employee_id: String,
    pub salary_records: usize,
    pub total_net_salary: f64,
    pub total_salary_paid: f64,
    pub advance_count: usize,
    pub total_advances: f64,
    pub outstanding_advances: f64,
    pub attendance: AttendanceCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_customers: usize,
    pub total_employees: usize,
    pub total_bills: usize,
    pub total_revenue: f64,
    pub total_received: f64,
    pub outstanding_amount: f64,
    pub pending_bills: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CustomerStatement {
    pub customer_id: String,
    #[schema(value_type = Vec<Object>)]
    pub bills: Vec<Bill>,
    #[schema(value_type = Vec<Object>)]
    pub payments: Vec<Payment>,
    pub total_billed: f64,
    pub total_paid: f64,
    pub balance: f64,
}

fn for_employee(employee_id: &str) -> Query {
    Query::new().filter("employee_id", JsonValue::String(employee_id.to_string()))
}

fn for_customer(customer_id: &str) -> Query {
    Query::new().filter("customer_id", JsonValue::String(customer_id.to_string()))
}

impl DataService {
    async fn read_or_empty<T: TypedTable>(&self, query: Query) -> Vec<T> {
        match self.read_typed::<T>(query).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(table = %T::TABLE, error = %e, "summary input unavailable; counting it as empty");
                Vec::new()
            }
        }
    }

    pub async fn employee_summary(&self, employee_id: &str) -> EmployeeSummary {
        let salaries: Vec<SalaryRecord> = self.read_or_empty(for_employee(employee_id)).await;
        let salary_payments: Vec<SalaryPayment> =
            self.read_or_empty(for_employee(employee_id)).await;
        let advances: Vec<AdvancePayment> = self.read_or_empty(for_employee(employee_id)).await;
        let simple_advances: Vec<SimpleAdvance> =
            self.read_or_empty(for_employee(employee_id)).await;
        let attendance: Vec<AttendanceEntry> =
            self.read_or_empty(for_employee(employee_id)).await;

        let mut counts = AttendanceCounts::default();
        for entry in &attendance {
            counts.record(entry.status.as_deref());
        }

        EmployeeSummary {
            employee_id: employee_id.to_string(),
            salary_records: salaries.len(),
            total_net_salary: salaries.iter().map(|s| s.net_salary).sum(),
            total_salary_paid: salary_payments.iter().map(|p| p.amount).sum(),
            advance_count: advances.len() + simple_advances.len(),
            total_advances: advances.iter().map(|a| a.amount).sum::<f64>()
                + simple_advances.iter().map(|a| a.amount).sum::<f64>(),
            // Simple advances carry no repayment column.
            outstanding_advances: advances.iter().map(AdvancePayment::outstanding).sum::<f64>()
                + simple_advances.iter().map(|a| a.amount).sum::<f64>(),
            attendance: counts,
        }
    }

    pub async fn dashboard_stats(&self) -> DashboardStats {
        let customers: Vec<Customer> = self.read_or_empty(Query::new()).await;
        let employees: Vec<Employee> = self.read_or_empty(Query::new()).await;
        let bills: Vec<Bill> = self.read_or_empty(Query::new()).await;
        let payments: Vec<Payment> = self.read_or_empty(Query::new()).await;

        let total_revenue: f64 = bills.iter().map(|b| b.total_amount).sum();
        let total_received: f64 = payments.iter().map(|p| p.amount).sum();

        DashboardStats {
            total_customers: customers.len(),
            total_employees: employees.len(),
            total_bills: bills.len(),
            total_revenue,
            total_received,
            outstanding_amount: total_revenue - total_received,
            pending_bills: bills.iter().filter(|b| b.is_pending()).count(),
        }
    }

    pub async fn customer_statement(&self, customer_id: &str) -> CustomerStatement {
        let bills: Vec<Bill> = self.read_or_empty(for_customer(customer_id)).await;
        let payments: Vec<Payment> = self.read_or_empty(for_customer(customer_id)).await;

        let total_billed: f64 = bills.iter().map(|b| b.total_amount).sum();
        let total_paid: f64 = payments.iter().map(|p| p.amount).sum();

        CustomerStatement {
            customer_id: customer_id.to_string(),
            bills,
            payments,
            total_billed,
            total_paid,
            balance: total_billed - total_paid,
        }
    }
}
