//! Route definitions for the `/admin` resources. Every handler requires
//! the `ADMIN` role.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{admin_assignments, corrections, customers, users};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET, POST    /assignments                                   -> list, create
/// GET, PATCH   /assignments/{id}                              -> detail, update
/// GET          /assignments/{id}/signatures                   -> list signatures
///
/// GET          /corrections/day?employeeId=&date=             -> day bundle + summary
/// POST         /time-adjustments                              -> append time delta
/// POST         /km-adjustments                                -> append km delta
///
/// GET, POST    /customers                                     -> list, create
/// PATCH        /customers/{id}                                -> update
/// PATCH        /customers/{id}/deactivate                     -> soft delete
/// PATCH        /customers/{id}/reactivate                     -> undo soft delete
/// GET, POST    /customers/{id}/emergency-contacts             -> list, create
/// PATCH, DEL   /customers/{id}/emergency-contacts/{cid}       -> update, delete
///
/// GET, POST    /users                                         -> list, create
/// POST         /users/{id}/password                           -> reset password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        // Assignments
        .route(
            "/assignments",
            get(admin_assignments::list).post(admin_assignments::create),
        )
        .route(
            "/assignments/{id}",
            get(admin_assignments::get_by_id).patch(admin_assignments::update),
        )
        .route(
            "/assignments/{id}/signatures",
            get(admin_assignments::list_signatures),
        )
        // Corrections
        .route("/corrections/day", get(corrections::get_day))
        .route(
            "/time-adjustments",
            post(corrections::create_time_adjustment),
        )
        .route("/km-adjustments", post(corrections::create_km_adjustment))
        // Customers
        .route("/customers", get(customers::list).post(customers::create))
        .route("/customers/{id}", patch(customers::update))
        .route("/customers/{id}/deactivate", patch(customers::deactivate))
        .route("/customers/{id}/reactivate", patch(customers::reactivate))
        .route(
            "/customers/{id}/emergency-contacts",
            get(customers::list_contacts).post(customers::create_contact),
        )
        .route(
            "/customers/{id}/emergency-contacts/{contact_id}",
            patch(customers::update_contact).delete(customers::delete_contact),
        )
        // Users
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}/password", post(users::reset_password))
}
