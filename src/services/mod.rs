/// OpenAPI documentation generation.
pub mod documentation;
/// Session lifecycle, turns and candidate search.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Read access to user stats.
pub mod profile_service;
