//! Contract lifecycle: issuance from funding requests, the status state
//! machine, and the persistence collaborators it drives.

pub mod clock;
pub mod manager;
pub mod memory;
pub mod model;
pub mod numbering;
pub mod ports;
pub mod status;

pub use clock::{Clock, FixedClock, SystemClock};
pub use manager::LifecycleManager;
pub use memory::InMemoryLendingStore;
pub use model::{
    Contract, ContractFilter, ContractId, CreateContractParams, FundingRequest,
    FundingRequestStatus, Guarantee, ScheduleItem,
};
pub use numbering::{ContractNumberAllocator, RandomContractNumbers, SequentialContractNumbers};
pub use ports::{
    ContractEventSink, ContractStore, EventError, FundingRequestStore, LendingStore,
    ScheduleStore, TracingEventSink, UnitOfWork,
};
pub use status::{validate_transition, ContractStatus, InstallmentStatus, StatusChange};
