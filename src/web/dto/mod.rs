pub mod account;
pub mod chapters;
pub mod commerce;
pub mod courses;
pub mod progress;
pub mod quizzes;
