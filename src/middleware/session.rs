use crate::cookies;
use crate::error::AppResult;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use std::panic::{self, AssertUnwindSafe};

/// Session load/save stage.
///
/// Loads the session named by the request cookie, puts the handle into the
/// request extensions and commits it once the rest of the chain is done. The
/// commit happens on every exit path: normal responses, short-circuits from
/// later stages, error responses and panics. A panic is re-raised after the
/// commit so the recovery stage still answers it.
pub async fn load_and_save(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = cookies::read(request.headers(), &state.sessions.settings().cookie_name);
    let session = state.sessions.load(token.as_deref()).await?;
    request.extensions_mut().insert(session.clone());

    let outcome = AssertUnwindSafe(next.run(request)).catch_unwind().await;
    let committed = state.sessions.commit(&session).await;

    match outcome {
        Ok(mut response) => {
            if let Some(cookie) = committed? {
                cookies::append(&mut response, &cookie)?;
            }
            Ok(response)
        }
        Err(payload) => {
            if let Err(e) = committed {
                tracing::error!("Session commit after panic failed: {}", e);
            }
            panic::resume_unwind(payload)
        }
    }
}

