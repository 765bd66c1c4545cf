#![allow(unused_imports)]

pub use crate::base::attributes::{AttributeUpdate, ImportOption};
pub use crate::base::model::{AccountSnapshot, Folder, FolderLink, FolderListing, Grant, SessionToken};
pub use crate::execution::runner::{BatchRunner, RunMode};
pub use crate::ops::interface::{
    AccountDirectory, DirectoryClient, LogLevel, LogSink, MountpointSpec, SessionProvider,
    SnapshotSource,
};
pub use crate::reconcile::outcome::{AccountResult, AccountState, FailedStage, OutcomeStatus};
pub use crate::utils::error::{Error, Result};

pub use async_trait::async_trait;
pub use log::{debug, error, info, trace, warn};
