pub mod error;
pub mod payload;
pub mod traits;
pub mod validation;

pub use error::{ImporterError, Result};
pub use payload::{JsonFileSource, StageImportFile, StageRef};
pub use traits::{ImportContext, StageResultSource};
pub use validation::{StageFileValidator, ValidationReport};
