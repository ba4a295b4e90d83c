use crate::{server::SharedState, templates};
use axum::{extract::State, response::Html};
use tracing::instrument;

#[instrument(skip(state))]
pub async fn index(State(state): State<SharedState>) -> Html<String> {
    state.metrics.record_request("/");
    Html(templates::render_index())
}
