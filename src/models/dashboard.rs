use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EmployeeSummary {
    pub employee_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub admin_name: String,
    pub total_products: i64,
    pub total_customers: i64,
    pub todays_revenue: f64,
    pub orders_today: i64,
    pub employees: Vec<EmployeeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeDashboard {
    pub name: String,
    pub department_id: Option<i64>,
    pub orders_today: i64,
    pub revenue_today: f64,
    pub low_stock_products: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub transaction_id: i64,
    pub transaction_date: DateTime<Utc>,
    pub total_amount: f64,
    pub order_status: Option<String>,
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerDashboard {
    pub name: String,
    pub email: String,
    pub orders: Vec<OrderSummary>,
    pub total_saved: f64,
    pub total_orders: i64,
}
