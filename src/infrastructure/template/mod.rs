//! Template resolver implementations

pub mod static_resolver;

pub use static_resolver::{StaticTemplateResolver, TemplateConfig};
