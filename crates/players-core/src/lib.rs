//! Players Core - Player aggregate, storage ports, and use cases.
//!
//! This crate contains the domain logic for player accounts. It knows nothing
//! about SQL or HTTP; storage backends implement the traits in [`storage`].

pub mod address;
pub mod clock;
pub mod error;
pub mod event;
pub mod outbox;
pub mod player;
pub mod service;
pub mod status;
pub mod storage;
pub mod validation;

// Re-exports for convenience
pub use address::Address;
pub use clock::{Clock, SystemClock};
pub use error::{PlayerError, StorageError, ValidationError};
pub use event::{StatusChangedPayload, StatusEvent};
pub use outbox::OutboxMessage;
pub use player::{Metadata, NewPlayer, Player, PlayerSnapshot};
pub use service::{ChangeStatus, CreatePlayer, PlayerService};
pub use status::{ActorType, Gender, Status};
pub use storage::{
    within_transaction, OutboxStore, PlayerStore, Session, StatusEventStore, UnitOfWork,
};
pub use validation::Validator;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::FixedClock;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::{
    InMemoryDatabase, InMemoryOutboxStore, InMemoryPlayerStore, InMemoryStatusEventStore,
    InMemoryTx, InMemoryUnitOfWork,
};
