mod address;
mod models;
mod permission;
mod storage;

pub use address::{Address, NetworkType};
pub use models::{AccountDescriptor, CatchRecord, NetworkDescriptor, Row};
pub use permission::{OperationKind, PermissionDeclaration, Target};
pub use storage::StorageDescriptor;
