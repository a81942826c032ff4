//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod action_log;
pub mod attachment;
pub mod user;
pub mod vehicle;
pub mod vehicle_type;
pub mod workflow;

pub use action_log::{ActionLogRepository, RecordActionInput};
pub use attachment::SeaOrmAttachmentRepository;
pub use user::{CreateUserInput, IdentityError, UpdateUserInput, UserRepository};
pub use vehicle::{CreateVehicleInput, UpdateVehicleInput, VehicleError, VehicleRepository};
pub use vehicle_type::{
    CreateVehicleTypeInput, UpdateVehicleTypeInput, VehicleTypeError, VehicleTypeRepository,
};
pub use workflow::{RequestDetail, WorkflowRepository};
