pub mod datetime;
pub mod error;
pub mod migrate;
pub mod mime;
pub mod part_of;
pub mod reseed;

pub use error::{Result, TransformError};
pub use migrate::migrate;
pub use mime::{resolve_content_type, update_mime_type};
pub use part_of::apply_part_of;
pub use reseed::reseed;
