use std::sync::Arc;

use crate::coins::model::Coin;
use crate::coins::store::CoinRepository;
use crate::error::ApiError;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::router::{Route, RouteError};

pub const COINS_PATH: &str = "/coins";
pub const COIN_ID_PATTERN: &str = r"^/coins/(\d+)$";

/// The coin routes, in registration order.
///
/// The literal `/coins` routes come first; the id pattern only accepts
/// digits so it cannot shadow them anyway.
pub fn routes(repo: Arc<dyn CoinRepository>) -> Result<Vec<Route>, RouteError> {
    let list = Arc::clone(&repo);
    let create = Arc::clone(&repo);
    let fetch = Arc::clone(&repo);
    let replace = Arc::clone(&repo);
    let remove = repo;

    Ok(vec![
        Route::literal(Method::GET, COINS_PATH, move |_, _| list_coins(list.as_ref())),
        Route::literal(Method::POST, COINS_PATH, move |req, _| {
            create_coin(create.as_ref(), req)
        }),
        Route::pattern(Method::GET, COIN_ID_PATTERN, move |_, id| {
            get_coin(fetch.as_ref(), parse_id(id)?)
        })?,
        Route::pattern(Method::PUT, COIN_ID_PATTERN, move |req, id| {
            update_coin(replace.as_ref(), parse_id(id)?, req)
        })?,
        Route::pattern(Method::DELETE, COIN_ID_PATTERN, move |_, id| {
            delete_coin(remove.as_ref(), parse_id(id)?)
        })?,
    ])
}

fn parse_id(raw: Option<&str>) -> Result<u64, ApiError> {
    let raw = raw.unwrap_or_default();
    // Digits only by pattern; this fails only on overflow, so no such coin.
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("Coin not found: {}", raw)))
}

fn list_coins(repo: &dyn CoinRepository) -> Result<Response, ApiError> {
    Ok(Response::json(StatusCode::Ok, &repo.find_all())?)
}

fn create_coin(repo: &dyn CoinRepository, req: &Request) -> Result<Response, ApiError> {
    let coin: Coin = req.json()?;
    let created = repo.insert(coin);
    Ok(Response::json(StatusCode::Created, &created)?)
}

fn get_coin(repo: &dyn CoinRepository, id: u64) -> Result<Response, ApiError> {
    let coin = repo.find_by_id(id)?;
    Ok(Response::json(StatusCode::Ok, &coin)?)
}

fn update_coin(repo: &dyn CoinRepository, id: u64, req: &Request) -> Result<Response, ApiError> {
    let coin: Coin = req.json()?;
    if coin.id.is_some_and(|body_id| body_id != id) {
        tracing::debug!(path_id = id, body_id = ?coin.id, "Ignoring id in request body");
    }
    let updated = repo.update(id, coin)?;
    Ok(Response::json(StatusCode::Ok, &updated)?)
}

fn delete_coin(repo: &dyn CoinRepository, id: u64) -> Result<Response, ApiError> {
    repo.delete(id)?;
    Ok(Response::no_content())
}
