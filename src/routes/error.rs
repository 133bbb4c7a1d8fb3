use crate::error::app_error::ErrorBody;
use crate::error::page::{LOGIN_PATH, status_page};
use rocket::http::{Header, Method, Status};
use rocket::response::content::RawHtml;
use rocket::response::{Redirect, Responder};
use rocket::serde::json::Json;
use rocket::{Either, Request, catch, catchers};

/// Wraps a catcher response so the server drops the connection afterwards;
/// the unread remainder of an oversized body must not be parsed as the next
/// request.
#[derive(Responder)]
pub struct CloseConnection<R> {
    inner: R,
    connection: Header<'static>,
}

impl<R> CloseConnection<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            connection: Header::new("Connection", "close"),
        }
    }
}

fn json_error(message: &str) -> Json<ErrorBody> {
    Json(ErrorBody::new(message))
}

fn api_message(status: Status) -> &'static str {
    match status.code {
        400 => "Bad request",
        401 => "Login required",
        404 => "Not found",
        409 => "Conflict",
        413 => "Request body too large",
        422 => "Invalid request body",
        500 => "Internal server error",
        _ => status.reason_lossy(),
    }
}

/// `POST /login` and `POST /register` are API calls mounted outside `/api`,
/// so their errors are answered in JSON by the root catchers too.
fn is_json_endpoint(req: &Request<'_>) -> bool {
    req.method() == Method::Post && matches!(req.uri().path().as_str(), "/login" | "/register")
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorBody> {
    json_error(api_message(Status::BadRequest))
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<ErrorBody> {
    json_error(api_message(Status::Unauthorized))
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorBody> {
    json_error(api_message(Status::NotFound))
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<ErrorBody> {
    json_error(api_message(Status::Conflict))
}

#[catch(413)]
pub fn payload_too_large(_: &Request) -> CloseConnection<Json<ErrorBody>> {
    CloseConnection::new(json_error(api_message(Status::PayloadTooLarge)))
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<ErrorBody> {
    json_error(api_message(Status::UnprocessableEntity))
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<ErrorBody> {
    json_error(api_message(Status::InternalServerError))
}

#[catch(default)]
pub fn api_default(status: Status, _: &Request) -> Json<ErrorBody> {
    json_error(api_message(status))
}

pub fn api_catchers() -> Vec<rocket::Catcher> {
    catchers![bad_request, unauthorized, not_found, conflict, payload_too_large, unprocessable_entity, internal_error, api_default]
}

#[catch(401)]
pub fn login_redirect(req: &Request) -> Either<Json<ErrorBody>, Redirect> {
    if is_json_endpoint(req) {
        return Either::Left(json_error(api_message(Status::Unauthorized)));
    }
    Either::Right(Redirect::found(LOGIN_PATH))
}

#[catch(413)]
pub fn page_too_large(req: &Request) -> CloseConnection<Either<Json<ErrorBody>, RawHtml<String>>> {
    if is_json_endpoint(req) {
        return CloseConnection::new(Either::Left(json_error(api_message(Status::PayloadTooLarge))));
    }
    CloseConnection::new(Either::Right(status_page(Status::PayloadTooLarge, "The request body was too large.")))
}

#[catch(default)]
pub fn page_error(status: Status, req: &Request) -> Either<Json<ErrorBody>, RawHtml<String>> {
    if is_json_endpoint(req) {
        return Either::Left(json_error(api_message(status)));
    }

    let message = if status.class().is_server_error() {
        "Something went wrong on the server."
    } else {
        "The page you requested could not be served."
    };
    Either::Right(status_page(status, message))
}

pub fn page_catchers() -> Vec<rocket::Catcher> {
    catchers![login_redirect, page_too_large, page_error]
}
