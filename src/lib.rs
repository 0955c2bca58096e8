// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Internet Address Parsing and Validation
//!
//! Parses free-form text into a typed model of email mailboxes (display
//! names, quoted strings, internationalized domains) and URLs, then
//! optionally validates parsed addresses against live mail-exchanger
//! records and provider-specific local-part grammars.
//!
//! # Features
//!
//! - Strongly-typed address model with RFC-compliant normalization
//! - Tolerant list parsing that partitions input instead of failing
//! - DNS mail-exchanger validation with pluggable provider grammars
//! - Per-stage timing metrics on every entry point
//!
//! # Example
//!
//! ```rust
//! use address_extract::{parse, parse_list};
//!
//! let addr = parse("John Smith <john@smith.com>", false).unwrap();
//! assert_eq!(addr.full_spec(), "John Smith <john@smith.com>");
//!
//! let (parsed, unparsed) = parse_list(vec!["A <a@b>", "C", "D <d@e>"]);
//! assert_eq!(parsed.len(), 2);
//! assert_eq!(unparsed, vec!["C"]);
//! ```

mod encoding;
mod error;
pub mod grammar;
mod metrics;
mod parser;
mod types;
mod validate;

pub use error::{EncodingError, ParseError, Result};
pub use metrics::Metrics;
pub use parser::{
    MAX_ADDRESS_LENGTH, MAX_ADDRESS_LIST_LENGTH, MAX_ADDRESS_NUMBER, ListItem, ListSource,
    is_email, parse, parse_discrete_list, parse_discrete_list_with_metrics, parse_list,
    parse_list_with_metrics, parse_with_metrics, try_parse, try_parse_discrete_list,
};
pub use types::{AddrType, Address, AddressList, EmailAddress, UrlAddress};
pub use validate::{
    DefaultPreparser, DnsMxLookup, Exchanger, GmailGrammar, LocalPartGrammar, MxLookup, MxMetrics,
    MxOutcome, PluginRegistry, Preparser, Validator,
};
