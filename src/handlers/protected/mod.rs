// Tier 2: JWT-authenticated endpoints under /api/institute
pub mod attendance;
pub mod category;
pub mod course;
pub mod institute;
pub mod library;
pub mod student;
pub mod teacher;
