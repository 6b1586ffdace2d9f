// Maman & Bébé - health chat brain
// Intent matching, emergency detection and response assembly.

pub mod brain;
pub mod config;
pub mod consultation;
pub mod error;
pub mod fs_manager;

pub use brain::{HealthProcessor, MessageReply, QueryContext, QueryResult, Urgency};
pub use config::ProcessorConfig;
pub use consultation::Consultation;
pub use error::AppError;

#[cfg(test)]
mod tests;
