pub mod grants;
pub mod links;
pub mod lookup;
pub mod outcome;
pub mod task_group;

pub use grants::{FolderNotFound, GrantAdd, GrantPlan, reconcile_grants};
pub use links::{LinkFieldMissing, LinkPlan, StaleLink, reconcile_links};
pub use outcome::{
    AccountResult, AccountState, AccountStatus, FailedStage, OperationOutcome, OperationTarget,
    OutcomeStatus,
};
