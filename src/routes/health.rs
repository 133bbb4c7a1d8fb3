use rocket::serde::json::Json;
use rocket::{routes, serde::Serialize};

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StatusResponse {
    pub message: &'static str,
}

#[rocket::get("/status")]
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse { message: "Server is running" })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![status]
}
