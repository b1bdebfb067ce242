//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Validation queries run before any mutation; a failed check aborts
//!   the whole operation
//! - Transactions for multi-step operations
//! - One repository per resource, borrowing the shared pool

pub mod categories;
pub mod prompts;
pub mod templates;

pub use categories::{Category, CategoryNode, CategoryRepo, DbError};
pub use prompts::{Prompt, PromptChanges, PromptFilter, PromptRepo};
pub use templates::{Template, TemplateChanges, TemplateRepo, TEMPLATE_PAGE_SIZE};
