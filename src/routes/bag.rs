use crate::auth::{BagOwner, Principal};
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::bag::{BagCountResponse, BagItemRequest, BagItemResponse, BagMutationResponse, BagQuantityRequest};
use crate::service::Services;
use crate::session::SessionManager;
use rocket::http::CookieJar;
use rocket::serde::json::Json;
use rocket::{State, routes};

#[rocket::get("/")]
pub async fn get_bag(owner: BagOwner, services: &State<Services>) -> Result<Json<Vec<BagItemResponse>>, AppError> {
    Ok(Json(services.bags.list(owner).await?))
}

#[rocket::post("/", data = "<payload>")]
pub async fn add_to_bag(
    owner: BagOwner,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    cookies: &CookieJar<'_>,
    payload: JsonBody<BagItemRequest>,
) -> Result<Json<BagMutationResponse>, AppError> {
    let outcome = services.bags.add_item(owner, payload.product_id, payload.quantity).await?;
    sessions.touch(cookies).await;
    Ok(Json(BagMutationResponse::ok(outcome.message())))
}

#[rocket::patch("/<product_id>", data = "<payload>")]
pub async fn set_bag_quantity(
    owner: BagOwner,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    cookies: &CookieJar<'_>,
    product_id: i64,
    payload: JsonBody<BagQuantityRequest>,
) -> Result<Json<BagMutationResponse>, AppError> {
    services.bags.set_quantity(owner, product_id, payload.quantity).await?;
    sessions.touch(cookies).await;
    Ok(Json(BagMutationResponse::ok("Cart updated")))
}

#[rocket::delete("/<product_id>")]
pub async fn remove_from_bag(
    owner: BagOwner,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    cookies: &CookieJar<'_>,
    product_id: i64,
) -> Result<Json<BagMutationResponse>, AppError> {
    services.bags.remove_item(owner, product_id).await?;
    sessions.touch(cookies).await;
    Ok(Json(BagMutationResponse::ok("Item removed")))
}

#[rocket::delete("/")]
pub async fn clear_bag(
    owner: BagOwner,
    services: &State<Services>,
    sessions: &State<SessionManager>,
    cookies: &CookieJar<'_>,
) -> Result<Json<BagMutationResponse>, AppError> {
    services.bags.clear(owner).await?;
    sessions.touch(cookies).await;
    Ok(Json(BagMutationResponse::ok("Cart cleared")))
}

/// Guests and admins have no bag and always read 0.
#[rocket::get("/count")]
pub async fn bag_count(principal: Principal, services: &State<Services>) -> Json<BagCountResponse> {
    let count = match principal.bag_owner() {
        Some(owner) => services.bags.total_quantity(owner).await,
        None => 0,
    };
    Json(BagCountResponse { count })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![get_bag, add_to_bag, set_bag_quantity, remove_from_bag, clear_bag, bag_count]
}
