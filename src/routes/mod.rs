/// Router Module Index
///
/// Routes grouped by the access tier `create_router` layers onto them.

/// Routes open to anonymous clients: health and token issuance.
pub mod public;

/// Routes behind the `AuthUser` pipeline (`/api/v1`).
pub mod authenticated;

/// Routes behind the pipeline plus the admin role check (`/api/v1/admin`).
pub mod admin;
