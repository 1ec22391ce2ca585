mod election;
mod election_state;
mod local_store;
mod ready;

pub use local_store::CommitError;
pub use ready::ReadyListener;

pub(crate) use election::ElectionDriver;
pub(crate) use election::ElectionTimings;
pub(crate) use election_state::new as role_channel;
pub(crate) use election_state::RoleChangeListener;
pub(crate) use election_state::RoleChangeNotifier;
pub(crate) use election_state::RoleSnapshot;
pub(crate) use local_store::CommitInput;
pub(crate) use local_store::LocalStore;
pub(crate) use ready::new as ready_signal;
pub(crate) use ready::ReadyNotifier;
