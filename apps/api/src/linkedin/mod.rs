// LinkedIn profile import: OAuth authorization, code exchange, sanitized import.
// All provider traffic goes through `IdentityProvider`.

pub mod client;
pub mod flow;
pub mod handlers;
pub mod profile;

pub use client::{IdentityProvider, LinkedInClient};
