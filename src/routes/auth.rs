use crate::auth::Principal;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::error::page::{LOGIN_PATH, PageError};
use crate::models::user::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::render::Pages;
use crate::service::Services;
use crate::session::{SessionData, SessionManager};
use rocket::form::Form;
use rocket::http::{CookieJar, Status};
use rocket::response::Redirect;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{State, routes};
use serde_json::json;
use tracing::info;

async fn login_with(services: &Services, sessions: &SessionManager, cookies: &CookieJar<'_>, request: &LoginRequest) -> Result<Json<LoginResponse>, AppError> {
    let Some((login, password)) = request.credentials() else {
        return Err(AppError::BadRequest("Missing credentials".to_string()));
    };

    let account = services.auth.login(login, password).await?;
    sessions.start(cookies, SessionData::for_user(account.id, account.role)).await;
    info!(user_id = account.id, role = %account.role, "user logged in");

    Ok(Json(LoginResponse {
        success: true,
        role: account.role,
        redirect_url: account.role.home_path().to_string(),
    }))
}

async fn register_with(services: &Services, request: RegisterRequest) -> Result<(Status, Json<RegisterResponse>), AppError> {
    services.auth.register(request).await?;
    Ok((
        Status::Created,
        Json(RegisterResponse {
            success: true,
            message: "Registration successful. Please log in.".to_string(),
        }),
    ))
}

#[rocket::get("/login")]
pub async fn login_page(principal: Principal, pages: &State<Pages>) -> Result<RawHtml<String>, PageError> {
    Ok(pages.render("login", &json!({ "role": principal.role() }))?)
}

#[rocket::get("/register")]
pub async fn register_page(pages: &State<Pages>) -> Result<RawHtml<String>, PageError> {
    Ok(pages.render("register", &json!({}))?)
}

#[rocket::post("/login", format = "json", data = "<payload>", rank = 1)]
pub async fn login_json(
    services: &State<Services>,
    sessions: &State<SessionManager>,
    cookies: &CookieJar<'_>,
    payload: JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    login_with(services, sessions, cookies, &payload).await
}

#[rocket::post("/login", format = "form", data = "<payload>", rank = 2)]
pub async fn login_form(
    services: &State<Services>,
    sessions: &State<SessionManager>,
    cookies: &CookieJar<'_>,
    payload: Form<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    login_with(services, sessions, cookies, &payload).await
}

/// Requests without a JSON or form content type are read as JSON.
#[rocket::post("/login", data = "<payload>", rank = 3)]
pub async fn login_untyped(
    services: &State<Services>,
    sessions: &State<SessionManager>,
    cookies: &CookieJar<'_>,
    payload: JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    login_with(services, sessions, cookies, &payload).await
}

#[rocket::post("/register", format = "json", data = "<payload>", rank = 1)]
pub async fn register_json(services: &State<Services>, payload: JsonBody<RegisterRequest>) -> Result<(Status, Json<RegisterResponse>), AppError> {
    register_with(services, payload.into_inner()).await
}

#[rocket::post("/register", format = "form", data = "<payload>", rank = 2)]
pub async fn register_form(services: &State<Services>, payload: Form<RegisterRequest>) -> Result<(Status, Json<RegisterResponse>), AppError> {
    register_with(services, payload.into_inner()).await
}

#[rocket::post("/register", data = "<payload>", rank = 3)]
pub async fn register_untyped(services: &State<Services>, payload: JsonBody<RegisterRequest>) -> Result<(Status, Json<RegisterResponse>), AppError> {
    register_with(services, payload.into_inner()).await
}

#[rocket::get("/logout")]
pub async fn logout(sessions: &State<SessionManager>, cookies: &CookieJar<'_>) -> Redirect {
    sessions.end(cookies).await;
    Redirect::found(LOGIN_PATH)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        login_page,
        register_page,
        login_json,
        login_form,
        login_untyped,
        register_json,
        register_form,
        register_untyped,
        logout
    ]
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{ADMIN_LOGIN, CUSTOMER_LOGIN, EMPLOYEE_LOGIN, TestApp};
    use rocket::http::{ContentType, Status};
    use serde_json::{Value, json};

    #[rocket::async_test]
    async fn login_sets_session_cookie_and_redirect_target() {
        let app = TestApp::new().await;

        for ((username, password), role, target) in [
            (ADMIN_LOGIN, "admin", "/admin"),
            (EMPLOYEE_LOGIN, "employee", "/employee"),
            (CUSTOMER_LOGIN, "customer", "/customer"),
        ] {
            let response = app
                .client
                .post("/login")
                .header(ContentType::JSON)
                .body(json!({"user_id": username, "password": password}).to_string())
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Ok);

            let set_cookie = response.headers().get_one("Set-Cookie").expect("session cookie").to_string();
            assert!(set_cookie.starts_with("sessionId="));
            assert!(set_cookie.contains("HttpOnly"));
            assert!(set_cookie.contains("Path=/"));
            assert!(set_cookie.contains("Max-Age=86400"));

            let body: Value = response.into_json().await.expect("json body");
            assert_eq!(body, json!({"success": true, "role": role, "redirectUrl": target}));
        }
    }

    #[rocket::async_test]
    async fn login_accepts_form_posts() {
        let app = TestApp::new().await;
        let (username, password) = CUSTOMER_LOGIN;

        let response = app
            .client
            .post("/login")
            .header(ContentType::Form)
            .body(format!("username={username}&password={password}"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = app.client.get("/api/bag").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn bad_or_missing_credentials() {
        let app = TestApp::new().await;

        let response = app
            .client
            .post("/login")
            .header(ContentType::JSON)
            .body(r#"{"user_id": "ada", "password": "nope"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(response.into_json::<Value>().await, Some(json!({"message": "Invalid ID or Password"})));

        let response = app.client.post("/login").header(ContentType::JSON).body(r#"{"user_id": "ada"}"#).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(response.into_json::<Value>().await, Some(json!({"message": "Missing credentials"})));
    }

    #[rocket::async_test]
    async fn logout_clears_cookie_and_session() {
        let app = TestApp::new().await;
        let (username, password) = CUSTOMER_LOGIN;
        app.client
            .post("/login")
            .header(ContentType::JSON)
            .body(json!({"username": username, "password": password}).to_string())
            .dispatch()
            .await;
        let token = app.client.cookies().get("sessionId").map(|c| c.value().to_string()).expect("logged in");

        let response = app.client.get("/logout").dispatch().await;
        assert_eq!(response.status(), Status::Found);
        assert_eq!(response.headers().get_one("Location"), Some("/login"));
        let set_cookie = response.headers().get_one("Set-Cookie").expect("removal cookie");
        assert!(set_cookie.contains("Max-Age=0"));

        assert!(app.sessions().store().get(&token).await.is_none());
    }

    #[rocket::async_test]
    async fn register_then_conflict() {
        let app = TestApp::new().await;
        let body = json!({
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "username": "grace",
            "password": "cobol-forever"
        })
        .to_string();

        let response = app.client.post("/register").header(ContentType::JSON).body(&body).dispatch().await;
        assert_eq!(response.status(), Status::Created);

        let response = app.client.post("/register").header(ContentType::JSON).body(&body).dispatch().await;
        assert_eq!(response.status(), Status::Conflict);
        assert_eq!(response.into_json::<Value>().await, Some(json!({"message": "Email already registered"})));
    }

    #[rocket::async_test]
    async fn login_without_json_content_type_is_read_as_json() {
        let (username, password) = CUSTOMER_LOGIN;
        let body = json!({"username": username, "password": password}).to_string();

        for content_type in [None, Some(ContentType::Plain)] {
            let app = TestApp::new().await;
            let request = app.client.post("/login").body(&body);
            let request = match content_type.clone() {
                Some(content_type) => request.header(content_type),
                None => request,
            };

            let response = request.dispatch().await;
            assert_eq!(response.status(), Status::Ok, "{content_type:?}");
            assert_eq!(response.content_type(), Some(ContentType::JSON));
            let body: Value = response.into_json().await.expect("json body");
            assert_eq!(body["redirectUrl"], "/customer");
        }
    }

    #[rocket::async_test]
    async fn register_without_content_type_is_read_as_json() {
        let app = TestApp::new().await;
        let body = json!({
            "name": "Alan Turing",
            "email": "alan@example.com",
            "username": "alan",
            "password": "enigma-1912"
        })
        .to_string();

        let response = app.client.post("/register").body(body).dispatch().await;
        assert_eq!(response.status(), Status::Created);
    }

    #[rocket::async_test]
    async fn body_errors_on_login_and_register_are_json() {
        let app = TestApp::new().await;

        for (path, content_type) in [("/login", Some(ContentType::JSON)), ("/login", None), ("/register", Some(ContentType::JSON))] {
            let request = app.client.post(path).body("{not json");
            let request = match content_type {
                Some(content_type) => request.header(content_type),
                None => request,
            };

            let response = request.dispatch().await;
            assert_eq!(response.status(), Status::BadRequest, "{path}");
            assert_eq!(response.content_type(), Some(ContentType::JSON), "{path}");
            assert_eq!(response.into_json::<Value>().await, Some(json!({"message": "Bad request"})));
        }

        let response = app.client.post("/register").header(ContentType::Form).body("name=Ada").dispatch().await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        assert_eq!(response.content_type(), Some(ContentType::JSON));
    }

    #[rocket::async_test]
    async fn oversized_login_is_json_413_and_closes() {
        let app = TestApp::new().await;
        let padding = "x".repeat(1_100_000);

        let response = app
            .client
            .post("/login")
            .header(ContentType::JSON)
            .body(format!(r#"{{"username": "ada", "password": "{padding}"}}"#))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::PayloadTooLarge);
        assert_eq!(response.headers().get_one("Connection"), Some("close"));
        assert_eq!(response.into_json::<Value>().await, Some(json!({"message": "Request body too large"})));
    }

    #[rocket::async_test]
    async fn login_page_renders() {
        let app = TestApp::new().await;
        let response = app.client.get("/login").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::HTML));
    }
}
