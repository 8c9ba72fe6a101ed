mod condition;
mod error;
mod traits;
mod types;

pub use condition::{Comparator, Condition, Expression};
pub use error::{RepositoryError, Result, ALLOWED_KEY_TYPES};
pub use traits::{SharedStore, TableStore};
pub use types::{Item, ScanPage, ScanRequest};
