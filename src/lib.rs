//! # Yoctorfid
//!
//! Asynchronous client for RFID reader modules behind a VirtualHub-style
//! gateway: tag memory read/write, block locking, ISO-15693 AFI/DSFID
//! access, and tag arrival/removal events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use yoctorfid::{RfidOptions, RfidReader, VirtualHub};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = Arc::new(VirtualHub::new("127.0.0.1:4444"));
//!     let reader = RfidReader::new(hub, "rfid");
//!     for tag_id in reader.get_tag_id_list().await {
//!         match reader.tag_read_bin(&tag_id, 4, 16, &RfidOptions::new()).await {
//!             Ok(data) => println!("{}: {:02x?}", tag_id, data),
//!             Err(status) => eprintln!("{}: {}", tag_id, status),
//!         }
//!     }
//! }
//! ```
//!
#[macro_use]
pub mod macros;
pub mod error;
pub mod events;
pub mod options;
pub mod reader;
pub mod status;
pub mod taginfo;
pub mod transport;

pub use error::{Result, RfidError};
pub use events::{EventKind, TagEvent};
pub use options::{KeyType, RfidOptions};
pub use reader::RfidReader;
pub use status::{BlockRange, Classification, OperationStatus, TagResult};
pub use taginfo::{RfidTagInfo, TagType};
pub use transport::{HubTransport, VirtualHub};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}
