//! Storage module for order files.
//!
//! Google Drive is the primary backend when credentials are configured;
//! local disk is the staging area and the fallback. The dispatcher holds
//! the routing policy between them.

mod dispatcher;
mod drive_client;
mod local_store;

pub use dispatcher::{StorageDispatcher, StorageProvider, StoredFile, StoredRecord};
pub use drive_client::{DriveClient, DriveFile};
pub use local_store::{LocalStore, StagedFile, StagedUpload};
