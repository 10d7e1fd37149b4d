use axum::{routing::get, Router};
use std::sync::Arc;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::api::handlers::{self, AppState};
use crate::config::ApiConfig;
use crate::model::{
    AddressFamily, AutonomousSystem, PeerEndpoint, PeerGroup, PeerGroupTemplate, Peering, PeeringRole,
    RoutingInstance,
};
use crate::serializers::{Mapper, PLUGIN_ROOT};
use crate::store::Store;

pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .merge(resource::<AutonomousSystem, S>())
        .merge(resource::<PeeringRole, S>())
        .merge(resource::<PeerGroupTemplate, S>())
        .merge(resource::<PeerGroup, S>())
        .merge(resource::<PeerEndpoint, S>())
        .merge(resource::<Peering, S>())
        .merge(resource::<RoutingInstance, S>())
        .merge(resource::<AddressFamily, S>())
}

/// Collection and item routes for one record type.
fn resource<R: Mapper, S: Store + 'static>() -> Router<AppState<S>> {
    let collection = format!("{}/{}", PLUGIN_ROOT, R::KIND.path());
    let item = format!("{}/:id", collection);

    Router::new()
        .route(
            &collection,
            get(handlers::list::<R, S>).post(handlers::create::<R, S>),
        )
        .route(
            &item,
            get(handlers::retrieve::<R, S>)
                .put(handlers::replace::<R, S>)
                .patch(handlers::partial_update::<R, S>)
                .delete(handlers::destroy::<R, S>),
        )
}

/// The stateful router wrapped so `/peerings/` and `/peerings` both match.
pub fn build_app<S: Store + 'static>(store: Arc<S>, api: ApiConfig) -> NormalizePath<Router> {
    let router = create_router().with_state(AppState::new(store, api));
    NormalizePathLayer::trim_trailing_slash().layer(router)
}
