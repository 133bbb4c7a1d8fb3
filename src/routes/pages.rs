use crate::auth::{AdminSession, CustomerSession, EmployeeSession, Principal, Role};
use crate::error::app_error::AppError;
use crate::error::page::PageError;
use crate::models::dashboard::{AdminDashboard, CustomerDashboard, EmployeeDashboard};
use crate::models::product::{Department, Product};
use crate::render::Pages;
use crate::service::Services;
use crate::session::SessionManager;
use rocket::http::CookieJar;
use rocket::response::content::RawHtml;
use rocket::{State, routes};
use serde::Serialize;

#[derive(Serialize)]
struct Viewer {
    name: String,
    role: Role,
}

#[derive(Serialize)]
struct HomeContext {
    products: Vec<Product>,
    departments: Vec<Department>,
    user: Option<Viewer>,
    bag_count: i64,
}

#[derive(Serialize)]
struct BagContext {
    user: Option<Viewer>,
    bag_count: i64,
}

#[derive(Serialize)]
struct DashboardContext<D> {
    user: Option<Viewer>,
    dashboard: D,
}

async fn viewer(services: &Services, principal: Principal) -> Result<Option<Viewer>, AppError> {
    let Some(role) = principal.role() else {
        return Ok(None);
    };
    let name = services.users.display_name(principal).await?;
    Ok(name.map(|name| Viewer { name, role }))
}

async fn bag_count(services: &Services, principal: Principal) -> i64 {
    match principal.bag_owner() {
        Some(owner) => services.bags.total_quantity(owner).await,
        None => 0,
    }
}

#[rocket::get("/")]
pub async fn home(
    principal: Principal,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    pages: &State<Pages>,
    cookies: &CookieJar<'_>,
) -> Result<RawHtml<String>, PageError> {
    sessions.touch(cookies).await;

    let context = HomeContext {
        products: services.products.list_active_products().await?,
        departments: services.products.list_departments().await?,
        user: viewer(services, principal).await?,
        bag_count: bag_count(services, principal).await,
    };
    Ok(pages.render("index", &context)?)
}

#[rocket::get("/bag")]
pub async fn bag_page(
    principal: Principal,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    pages: &State<Pages>,
    cookies: &CookieJar<'_>,
) -> Result<RawHtml<String>, PageError> {
    if principal.bag_owner().is_none() {
        return Err(AppError::Unauthenticated.into());
    }
    sessions.touch(cookies).await;

    let context = BagContext {
        user: viewer(services, principal).await?,
        bag_count: bag_count(services, principal).await,
    };
    Ok(pages.render("bag", &context)?)
}

#[rocket::get("/admin")]
pub async fn admin_dashboard(
    admin: AdminSession,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    pages: &State<Pages>,
    cookies: &CookieJar<'_>,
) -> Result<RawHtml<String>, PageError> {
    sessions.touch(cookies).await;

    let principal = Principal::Admin { id: admin.user_id };
    let context: DashboardContext<AdminDashboard> = DashboardContext {
        user: viewer(services, principal).await?,
        dashboard: services.dashboards.admin_dashboard(admin.user_id).await?,
    };
    Ok(pages.render("admin_dashboard", &context)?)
}

#[rocket::get("/employee")]
pub async fn employee_dashboard(
    employee: EmployeeSession,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    pages: &State<Pages>,
    cookies: &CookieJar<'_>,
) -> Result<RawHtml<String>, PageError> {
    // A deactivated or deleted employee keeps a valid session but has no row.
    let Some(dashboard) = services.dashboards.employee_dashboard(employee.user_id).await? else {
        return Err(AppError::Unauthenticated.into());
    };
    sessions.touch(cookies).await;

    let principal = Principal::Employee { id: employee.user_id };
    let context: DashboardContext<EmployeeDashboard> = DashboardContext {
        user: viewer(services, principal).await?,
        dashboard,
    };
    Ok(pages.render("employee_dashboard", &context)?)
}

#[rocket::get("/customer")]
pub async fn customer_dashboard(
    customer: CustomerSession,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    pages: &State<Pages>,
    cookies: &CookieJar<'_>,
) -> Result<RawHtml<String>, PageError> {
    let Some(dashboard) = services.dashboards.customer_dashboard(customer.user_id).await? else {
        return Err(AppError::Unauthenticated.into());
    };
    sessions.touch(cookies).await;

    let principal = Principal::Customer { id: customer.user_id };
    let context: DashboardContext<CustomerDashboard> = DashboardContext {
        user: viewer(services, principal).await?,
        dashboard,
    };
    Ok(pages.render("customer_dashboard", &context)?)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![home, bag_page, admin_dashboard, employee_dashboard, customer_dashboard]
}
