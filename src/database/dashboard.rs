use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::dashboard::{AdminDashboard, CustomerDashboard, EmployeeDashboard, EmployeeSummary, OrderSummary};

#[async_trait::async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn admin_dashboard(&self, admin_id: i64) -> Result<AdminDashboard, AppError>;
    /// `None` when the employee row is missing or deactivated.
    async fn employee_dashboard(&self, employee_id: i64) -> Result<Option<EmployeeDashboard>, AppError>;
    /// `None` when the customer row is missing.
    async fn customer_dashboard(&self, customer_id: i64) -> Result<Option<CustomerDashboard>, AppError>;
}

#[derive(sqlx::FromRow)]
struct AdminTotals {
    total_products: i64,
    total_customers: i64,
    todays_revenue: f64,
    orders_today: i64,
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    name: String,
    department_id: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct EmployeeTotals {
    orders_today: i64,
    revenue_today: f64,
    low_stock_products: i64,
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    name: String,
    email: String,
}

#[derive(sqlx::FromRow)]
struct CustomerTotals {
    total_saved: f64,
    total_orders: i64,
}

#[async_trait::async_trait]
impl DashboardRepository for PostgresRepository {
    async fn admin_dashboard(&self, admin_id: i64) -> Result<AdminDashboard, AppError> {
        let admin_name = sqlx::query_scalar::<_, String>("SELECT name FROM administrator WHERE admin_id = $1")
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?
            .unwrap_or_else(|| "Admin".to_string());

        let totals = sqlx::query_as::<_, AdminTotals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM product) AS total_products,
                (SELECT COUNT(*) FROM customer) AS total_customers,
                (SELECT COALESCE(SUM(total_amount), 0)::float8 FROM sales_transaction
                    WHERE transaction_date::date = CURRENT_DATE) AS todays_revenue,
                (SELECT COUNT(*) FROM sales_transaction
                    WHERE transaction_date::date = CURRENT_DATE) AS orders_today
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let employees = sqlx::query_as::<_, EmployeeSummary>(
            r#"
            SELECT employee_id, name, email, department_id
            FROM employee
            WHERE is_active
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(AdminDashboard {
            admin_name,
            total_products: totals.total_products,
            total_customers: totals.total_customers,
            todays_revenue: totals.todays_revenue,
            orders_today: totals.orders_today,
            employees,
        })
    }

    async fn employee_dashboard(&self, employee_id: i64) -> Result<Option<EmployeeDashboard>, AppError> {
        let Some(employee) = sqlx::query_as::<_, EmployeeRow>("SELECT name, department_id FROM employee WHERE employee_id = $1 AND is_active")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let totals = sqlx::query_as::<_, EmployeeTotals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM transaction_details
                    WHERE employee_id = $1 AND created_at::date = CURRENT_DATE) AS orders_today,
                (SELECT COALESCE(SUM(subtotal), 0)::float8 FROM transaction_details
                    WHERE employee_id = $1 AND created_at::date = CURRENT_DATE) AS revenue_today,
                (SELECT COUNT(*) FROM inventory i
                    JOIN employee e ON e.department_id = i.department_id
                    WHERE e.employee_id = $1 AND i.quantity_available <= i.reorder_level) AS low_stock_products
            "#,
        )
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(EmployeeDashboard {
            name: employee.name,
            department_id: employee.department_id,
            orders_today: totals.orders_today,
            revenue_today: totals.revenue_today,
            low_stock_products: totals.low_stock_products,
        }))
    }

    async fn customer_dashboard(&self, customer_id: i64) -> Result<Option<CustomerDashboard>, AppError> {
        let Some(customer) = sqlx::query_as::<_, CustomerRow>("SELECT name, email FROM customer WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let orders = sqlx::query_as::<_, OrderSummary>(
            r#"
            SELECT
                t.transaction_id,
                t.transaction_date,
                t.total_amount::float8 AS total_amount,
                t.order_status,
                COALESCE(SUM(td.quantity), 0)::BIGINT AS item_count
            FROM sales_transaction t
            JOIN transaction_details td ON td.transaction_id = t.transaction_id
            WHERE t.customer_id = $1
            GROUP BY t.transaction_id, t.transaction_date, t.total_amount, t.order_status
            ORDER BY t.transaction_date DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let totals = sqlx::query_as::<_, CustomerTotals>(
            r#"
            SELECT
                COALESCE(SUM(order_discount), 0)::float8 AS total_saved,
                COUNT(*) AS total_orders
            FROM sales_transaction
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(CustomerDashboard {
            name: customer.name,
            email: customer.email,
            orders,
            total_saved: totals.total_saved,
            total_orders: totals.total_orders,
        }))
    }
}
