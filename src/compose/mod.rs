//! Message composition: subject line, recipient resolution and the static
//! HTML body with its inline banner.

pub mod banner;
pub mod message;

pub use banner::{BANNER_CID, InlineImage};
pub use message::{ComposedMessage, MessageComposer, resolve_recipient, subject_line};
