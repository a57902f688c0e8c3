use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, catalog, ingestion, plugin, ssh_key};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/plugins", plugin_routes())
        .nest("/ssh-keys", ssh_key_routes())
        .nest("/authors", OpenApiRouter::new().routes(routes!(catalog::list_authors)))
        .nest(
            "/categories",
            OpenApiRouter::new().routes(routes!(catalog::list_categories)),
        )
        .nest("/tags", OpenApiRouter::new().routes(routes!(catalog::list_tags)))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn plugin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(plugin::list_plugins))
        .routes(routes!(plugin::list_my_plugins))
        .routes(routes!(plugin::get_plugin))
        .routes(routes!(plugin::approve_plugin))
        .routes(routes!(plugin::reject_plugin))
        .routes(routes!(plugin::set_recommended_commit))
        .routes(routes!(ingestion::submit_plugin))
        .routes(routes!(ingestion::batch_submit))
        .routes(routes!(ingestion::refresh_plugin))
        .routes(routes!(ingestion::sync_plugin))
        .routes(routes!(ingestion::check_update))
}

fn ssh_key_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(ssh_key::list_ssh_keys, ssh_key::create_ssh_key))
        .routes(routes!(ssh_key::delete_ssh_key))
}
