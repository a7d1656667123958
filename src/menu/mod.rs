//! Menu module
//!
//! Domain types for extracted menus, the parsers that turn vision model
//! replies into items, and the service that ties extraction to storage.

mod parser;
mod service;
mod types;

pub use parser::{BalancedParser, ParseError, ResponseParser, SubstringParser};
pub use service::MenuService;
pub use types::{Menu, MenuItem};
