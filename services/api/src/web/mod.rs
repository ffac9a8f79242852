pub mod middleware;
pub mod profile;
pub mod protocol;
pub mod quests;
pub mod reflections;
pub mod rest;
pub mod state;
pub mod stats;

// Re-export what the binaries need to assemble the server.
pub use middleware::require_user;
pub use rest::{router, ApiDoc};
