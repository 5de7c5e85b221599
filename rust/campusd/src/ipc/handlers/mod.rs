pub mod attendance;
pub mod auth;
pub mod core;
pub mod courses;
pub mod dashboard;
pub mod facilities;
pub mod nav;
pub mod students;
