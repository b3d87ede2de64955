//! The domain-metadata model built from decoded classfiles

mod annotations;
mod class;
mod convert;
mod domain;
mod field;
mod interface;
mod method;

pub use annotations::*;
pub use class::*;
pub use convert::*;
pub use domain::*;
pub use field::*;
pub use interface::*;
pub use method::*;
