//! Entforge Script - FGD text front end
//!
//! Reads entity schemas written in FGD syntax:
//! - Tokenizing with line tracking (`Lexer`)
//! - Class headers, keyvalues, option blocks and I/O signals (`parse_document`)
//! - Multi-chunk, file and directory loading into one resolved `Schema` (`Loader`)
//! - Writing a schema back out as FGD text (`write_schema`)
//!
//! ```
//! let schema = entforge_script::build_schema([
//!     "@BaseClass = Targetname [ targetname(target_source) : \"Name\" ]",
//!     "@PointClass base(Targetname) = info_target []",
//! ])
//! .unwrap();
//! assert!(schema.lookup("info_target").unwrap().field("targetname").is_some());
//! ```

mod config;
mod error;
mod lexer;
mod loader;
mod parser;
mod writer;

pub use config::LoaderConfig;
pub use error::{Error, LexError, ParseError, Result};
pub use lexer::{Lexer, Token, TokenKind};
pub use loader::{build_schema, Loader};
pub use parser::{parse_document, Document};
pub use writer::{schema_to_string, write_class, write_schema};
