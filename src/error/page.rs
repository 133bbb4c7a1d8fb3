use crate::error::app_error::AppError;
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::response::{Redirect, Responder};
use rocket::{Request, Response};

pub const LOGIN_PATH: &str = "/login";

/// Error returned by rendered page routes. Authentication failures become a
/// redirect to the login page instead of a JSON body.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(e: AppError) -> Self {
        PageError(e)
    }
}

pub fn status_page(status: Status, message: &str) -> RawHtml<String> {
    RawHtml(format!(
        "<!doctype html><html><head><title>{code}</title></head><body><h1>{code} - {reason}</h1><p>{message}</p></body></html>",
        code = status.code,
        reason = status.reason_lossy(),
        message = message,
    ))
}

impl<'r> Responder<'r, 'static> for PageError {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'static> {
        let PageError(err) = self;
        err.log(req);

        if err.is_auth_failure() {
            return Redirect::found(LOGIN_PATH).respond_to(req);
        }

        let status = Status::from(&err);
        let message = if err.is_internal() {
            "Something went wrong on the server."
        } else {
            "The page you requested could not be served."
        };

        Response::build_from(status_page(status, message).respond_to(req)?)
            .status(status)
            .ok()
    }
}
