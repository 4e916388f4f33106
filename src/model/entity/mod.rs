mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod course;
pub use course::{Course, CourseCreate};

mod chapter;
pub use chapter::{Chapter, ChapterCreate};

mod attachment;
pub use attachment::{Attachment, AttachmentCreate};

mod quiz;
pub use quiz::{Quiz, QuizCreate};

mod question;
pub use question::{Question, QuestionCreate};

pub mod purchase;
pub use purchase::{Purchase, PurchaseSource};

pub mod purchase_code;
pub use purchase_code::PurchaseCode;

mod balance_transaction;
pub use balance_transaction::BalanceTransaction;

mod user_progress;
pub use user_progress::{CourseProgressRow, UserProgress};

mod quiz_result;
pub use quiz_result::{GradeRow, QuizAnswer, QuizResult};
