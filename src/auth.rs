//! Auth-domain identifiers, roles, principals, and token wrappers.

pub mod id;
pub mod principal;
pub mod role;
pub mod token;

pub use id::*;
pub use principal::*;
pub use role::*;
pub use token::*;
