//! Lesson domain
//!
//! Lessons and everything hanging off them: enrollments with progress,
//! uploaded materials, threaded comments and the teacher/student
//! statistics views. Every repository talks to the backend's REST data
//! API through the shared table client; mutations append to the
//! activity log.

pub mod comments;
pub mod entity;
pub mod enrollments;
pub mod error;
pub mod lessons;
pub mod materials;
pub mod stats;

pub use comments::CommentRepository;
pub use entity::{
    Comment, Enrollment, Lesson, LessonFilters, LessonUpdate, Material, NewComment, NewLesson,
};
pub use enrollments::EnrollmentRepository;
pub use error::LessonError;
pub use lessons::LessonRepository;
pub use materials::{MaterialRepository, MaterialUpload};
pub use stats::{StatsRepository, StudentStats, TeacherStats};
