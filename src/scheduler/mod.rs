//! Per-entity polling scheduler: the job registry plus the two watch
//! controllers that own job lifecycle and tick behavior.

mod author_watch;
mod question_watch;
mod registry;

pub use author_watch::{author_job_key, AuthorWatch, CreateAuthor};
pub use question_watch::{question_job_key, CreateQuestion, QuestionWatch};
pub use registry::{JobHandle, JobRegistry};
