//! Route definitions for the employee's own resources (`/me`).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{entries, me_assignments};
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// GET    /assignments                  -> list
/// GET    /assignments/{id}             -> detail with permissions and lock
/// POST   /assignments/{id}/ack         -> confirm or decline
/// POST   /assignments/{id}/done        -> mark done
/// POST   /assignments/{id}/signatures  -> submit signature
/// GET    /time-entries                 -> list
/// POST   /time-entries                 -> create
/// DELETE /time-entries?id=             -> delete
/// GET    /km-entries                   -> list
/// POST   /km-entries                   -> create
/// GET    /customers                    -> list
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/assignments", get(me_assignments::list))
        .route("/assignments/{id}", get(me_assignments::get_by_id))
        .route("/assignments/{id}/ack", post(me_assignments::acknowledge))
        .route("/assignments/{id}/done", post(me_assignments::mark_done))
        .route(
            "/assignments/{id}/signatures",
            post(me_assignments::submit_signature),
        )
        .route(
            "/time-entries",
            get(entries::list_time_entries)
                .post(entries::create_time_entry)
                .delete(entries::delete_time_entry),
        )
        .route(
            "/km-entries",
            get(entries::list_km_entries).post(entries::create_km_entry),
        )
        .route("/customers", get(entries::list_my_customers))
}
