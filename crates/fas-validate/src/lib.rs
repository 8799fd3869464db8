pub mod error;
pub mod ledger;
pub mod validator;

pub use error::{Result, ValidateError};
pub use ledger::ReferenceLedger;
pub use validator::{StructuralValidator, Validator};
