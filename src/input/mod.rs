//! Input channels and the coordinator that reconciles them.

mod coordinator;
mod fetch;
mod file;

pub use coordinator::{
    Channel, ClipboardItem, InputCoordinator, InputCoordinatorBuilder, InputSnapshot, StalePolicy,
};
pub use fetch::fetch_data_url;
pub use file::{Base64FileDecoder, FileContents, FileDecoder, ImageFile};
