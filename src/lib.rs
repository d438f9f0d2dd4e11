//! CRM bridge: schema-driven code generation and object/record synchronization for a remote CRM
//! speaking the JSON envelope record protocol.

pub mod bean;
pub mod case;
pub mod client;
pub mod codegen;
pub mod config;
pub mod error;
pub mod response;
pub mod service;
pub mod transport;
mod translit;
pub mod wire;

pub use bean::{DataObject, DynamicBean, FieldValue, SystemFields};
pub use client::CrmClient;
pub use config::{ClientSettings, FieldCatalog, FieldDescriptor, ModuleDescriptor, TypeTag};
pub use error::{BatchFailure, ConfigError, CrmError, FailureCause, TransportError};
pub use response::{interpret, Response};
pub use service::{Dao, DataAccess, DynamicAccess};
pub use transport::Transport;
