pub mod claims;
pub mod context;
pub mod jwks;
pub mod middleware;
pub mod roles;

pub use claims::Claims;
pub use context::AuthContext;
pub use jwks::JwksCache;
pub use middleware::{AuthError, RequireAuth};
pub use roles::{CurrentUser, RequireContractor, RequireCouncil};
