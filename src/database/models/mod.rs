pub mod attendance;
pub mod category;
pub mod course;
pub mod institute;
pub mod library;
pub mod student;
pub mod teacher;
pub mod user;

pub use attendance::{Attendance, AttendanceStatus};
pub use category::{Category, DEFAULT_CATEGORIES};
pub use course::{Course, CourseLevel, CourseWithCategory};
pub use institute::Institute;
pub use library::{Book, BorrowHistoryEntry, BorrowRecord, BorrowStatus, StockStatus};
pub use student::Student;
pub use teacher::{Teacher, TeacherWithCourse};
pub use user::User;
