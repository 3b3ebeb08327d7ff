//! Mail fan-out and notification history.

pub mod mailer;
pub mod notifier;

pub use mailer::{MailError, Mailer, SmtpMailer};
pub use notifier::{author_question_body, red_packet_body, Notifier};
