//! Well-known role name constants.
//!
//! These must match the `role` values returned by the upstream `/users/me`.

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_EMPLOYEE: &str = "EMPLOYEE";

/// Case-insensitive admin check (`"admin"` and `"ADMIN"` are both accepted).
pub fn is_admin(role: &str) -> bool {
    role.trim().eq_ignore_ascii_case(ROLE_ADMIN)
}
