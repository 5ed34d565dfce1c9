// Core moderation module - the gate every confession passes before storage.

pub mod lexical_filter;
pub mod moderation_gateway;
pub mod moderation_models;
pub mod moderation_pipeline;

pub use lexical_filter::LexicalFilter;
pub use moderation_gateway::{Classifier, ClassifierError, ModerationGateway};
pub use moderation_models::*;
pub use moderation_pipeline::{validate_length, ModerationError, ModerationPipeline};
