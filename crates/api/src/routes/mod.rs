pub mod admin;
pub mod auth;
pub mod health;
pub mod me;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login (public)
/// /auth/logout                                 logout (public)
/// /auth/me                                     current identity
///
/// /me/assignments                              list
/// /me/assignments/{id}                         detail, permissions, day lock, edit mode
/// /me/assignments/{id}/ack                     confirm or decline (POST)
/// /me/assignments/{id}/done                    mark done (POST)
/// /me/assignments/{id}/signatures              submit signature (POST)
/// /me/time-entries                             list, create, delete (?id=)
/// /me/km-entries                               list, create
/// /me/customers                                list
///
/// /admin/assignments                           list, create (admin only)
/// /admin/assignments/{id}                      detail, update
/// /admin/assignments/{id}/signatures           list
/// /admin/corrections/day                       day bundle, summary, lock
/// /admin/time-adjustments                      append (POST)
/// /admin/km-adjustments                        append (POST)
/// /admin/customers                             list, create
/// /admin/customers/{id}                        update (PATCH)
/// /admin/customers/{id}/deactivate             soft delete (PATCH)
/// /admin/customers/{id}/reactivate             undo soft delete (PATCH)
/// /admin/customers/{id}/emergency-contacts     list, create
/// /admin/customers/{id}/emergency-contacts/{cid}  update, delete
/// /admin/users                                 list, create
/// /admin/users/{id}/password                   reset (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/me", me::router())
        .nest("/admin", admin::router())
}
