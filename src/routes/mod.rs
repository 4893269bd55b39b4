use axum::Router;

use crate::{config::Service, state::AppState};

pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod users;

pub fn service_router(service: Service) -> Router<AppState> {
    match service {
        Service::User => users::router(),
        Service::Product => products::router(),
        Service::Cart => cart::router(),
        Service::Order => orders::router(),
    }
}

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(services: &[Service]) -> Router<AppState> {
    services.iter().fold(Router::new(), |router, service| {
        router.nest(service.path_prefix(), service_router(*service))
    })
}
