mod block;
mod preview;
mod project;
mod run;
mod transcode;
mod upload;

use crate::state::AppState;
use axum::{
	extract::Request,
	http::HeaderValue,
	middleware::{self, Next},
	response::Response,
	routing::{get, post},
	Router,
};

/// Attaches the no-browser-cache header to every response as a cross-cutting layer, rather than
/// repeating the header in each handler.
async fn no_cache_headers(request: Request, next: Next) -> Response {
	let mut response = next.run(request).await;
	response
		.headers_mut()
		.insert("Expires", HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT"));
	response
		.headers_mut()
		.insert("Cache-Control", HeaderValue::from_static("no-store"));
	response
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/VIPS/upload", post(upload::upload))
		.route("/VIPS/preview/:uuid", get(preview::preview))
		.route("/VIPS/run", post(run::run))
		.route("/VIPS/block/:block_id/image", get(block::latest_image))
		.route(
			"/VIPS/block/:block_id/image/:input_uuid",
			get(block::image_for_input),
		)
		.route(
			"/VIPS/project/:projectid/image/:input_uuid",
			get(project::image_for_input),
		)
		.route("/VIPS/project/:projectid/outputs", post(project::outputs))
		.route(
			"/VIPS/block/:block_id/toggle_enabled",
			axum::routing::any(block::toggle_enabled),
		)
		.layer(middleware::from_fn(no_cache_headers))
		.with_state(state)
}
