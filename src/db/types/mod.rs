mod author_type;
mod notify_type;
mod question_kind;
mod stream_type;

pub use author_type::*;
pub use notify_type::*;
pub use question_kind::*;
pub use stream_type::*;
