//! Parsing orchestration: single addresses, discrete lists and tolerant
//! per-item list parsing

use crate::error::{ParseError, Result};
use crate::grammar::{self, GrammarVariant, SyntaxTree, Tokenizer};
use crate::metrics::Metrics;
use crate::types::{Address, AddressList, EmailAddress, UrlAddress};
use std::time::Instant;
use tracing::warn;

/// Maximum length of a single address, in bytes
pub const MAX_ADDRESS_LENGTH: usize = 1024;

/// Maximum number of addresses accepted in one list
pub const MAX_ADDRESS_NUMBER: usize = 1024;

/// Maximum length of a delimited address-list string, in bytes
pub const MAX_ADDRESS_LIST_LENGTH: usize = MAX_ADDRESS_LENGTH * MAX_ADDRESS_NUMBER;

/// Parse a single full mailbox, addr-spec or URL.
///
/// With `addr_spec_only` the input must be a bare `local@domain`. Malformed,
/// empty or oversized input is never fatal: it is logged at warning level
/// and `None` is returned. Use [`try_parse`] to get the failure reason.
///
/// # Examples
///
/// ```rust
/// use address_extract::parse;
///
/// let addr = parse("John Smith <john@smith.com>", false).unwrap();
/// assert_eq!(addr.full_spec(), "John Smith <john@smith.com>");
///
/// assert!(parse("john@smith.com", true).is_some());
/// assert!(parse("John <john@smith.com>", true).is_none());
/// assert!(parse("foo", false).is_none());
/// ```
#[must_use]
pub fn parse(address: &str, addr_spec_only: bool) -> Option<Address> {
    parse_with_metrics(address, addr_spec_only).0
}

/// [`parse`], also returning stage timing.
#[must_use]
pub fn parse_with_metrics(address: &str, addr_spec_only: bool) -> (Option<Address>, Metrics) {
    let mut metrics = Metrics::default();
    let start = Instant::now();
    let result = try_parse(address, addr_spec_only);
    metrics.parsing = start.elapsed();

    match result {
        Ok(addr) => (Some(addr), metrics),
        Err(ParseError::Empty) => (None, metrics),
        Err(err) => {
            warn!(length = address.len(), "failed to parse address: {err}");
            (None, metrics)
        }
    }
}

/// Like [`parse`], but the failure reason is handed to the caller instead
/// of being logged.
pub fn try_parse(address: &str, addr_spec_only: bool) -> Result<Address> {
    if address.is_empty() {
        return Err(ParseError::Empty);
    }
    if address.len() > MAX_ADDRESS_LENGTH {
        return Err(ParseError::TooLong {
            length: address.len(),
            max: MAX_ADDRESS_LENGTH,
        });
    }

    let variant = if addr_spec_only {
        GrammarVariant::AddrSpec
    } else {
        GrammarVariant::MailboxOrUrl
    };
    let mut lexer = Tokenizer::template().fresh();
    let tree = grammar::parse(address, &mut lexer, variant)?;
    lift_single(tree)
}

/// Parse a delimited address-list string as one grammatical unit: all
/// elements parse or the whole call returns `None`.
#[must_use]
pub fn parse_discrete_list(address_list: &str) -> Option<AddressList> {
    parse_discrete_list_with_metrics(address_list).0
}

/// [`parse_discrete_list`], also returning stage timing.
#[must_use]
pub fn parse_discrete_list_with_metrics(address_list: &str) -> (Option<AddressList>, Metrics) {
    let mut metrics = Metrics::default();
    let start = Instant::now();
    let result = try_parse_discrete_list(address_list);
    metrics.parsing = start.elapsed();

    match result {
        Ok(list) => (Some(list), metrics),
        Err(ParseError::Empty) => (None, metrics),
        Err(err) => {
            warn!(
                length = address_list.len(),
                "failed to parse address list: {err}"
            );
            (None, metrics)
        }
    }
}

/// Like [`parse_discrete_list`], with the failure reason.
pub fn try_parse_discrete_list(address_list: &str) -> Result<AddressList> {
    if address_list.is_empty() {
        return Err(ParseError::Empty);
    }
    if address_list.len() > MAX_ADDRESS_LIST_LENGTH {
        return Err(ParseError::TooLong {
            length: address_list.len(),
            max: MAX_ADDRESS_LIST_LENGTH,
        });
    }

    let mut lexer = Tokenizer::template().fresh();
    let tree = grammar::parse(address_list, &mut lexer, GrammarVariant::MailboxOrUrlList)?;
    lift_list(tree)
}

/// One element of a [`ListSource::Items`] sequence: raw text still to be
/// parsed, or an address that already passed the grammar.
#[derive(Debug, Clone)]
pub enum ListItem {
    Raw(String),
    Parsed(Address),
}

impl From<&str> for ListItem {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<String> for ListItem {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<Address> for ListItem {
    fn from(addr: Address) -> Self {
        Self::Parsed(addr)
    }
}

impl From<EmailAddress> for ListItem {
    fn from(addr: EmailAddress) -> Self {
        Self::Parsed(Address::Email(addr))
    }
}

impl From<UrlAddress> for ListItem {
    fn from(addr: UrlAddress) -> Self {
        Self::Parsed(Address::Url(addr))
    }
}

/// Input to [`parse_list`]: either one delimited string or a sequence of
/// individual items.
#[derive(Debug, Clone)]
pub enum ListSource {
    Text(String),
    Items(Vec<ListItem>),
}

impl From<&str> for ListSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ListSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<ListItem>> for ListSource {
    fn from(items: Vec<ListItem>) -> Self {
        Self::Items(items)
    }
}

impl From<Vec<&str>> for ListSource {
    fn from(items: Vec<&str>) -> Self {
        Self::Items(items.into_iter().map(ListItem::from).collect())
    }
}

impl From<Vec<String>> for ListSource {
    fn from(items: Vec<String>) -> Self {
        Self::Items(items.into_iter().map(ListItem::from).collect())
    }
}

impl From<Vec<Address>> for ListSource {
    fn from(items: Vec<Address>) -> Self {
        Self::Items(items.into_iter().map(ListItem::from).collect())
    }
}

/// Tolerant list parsing: partitions input into parsed addresses and
/// unparsed raw text, never failing the batch for one bad item.
///
/// Sequence input is parsed item by item; each item lands in exactly one
/// partition, in its original order. String input is delegated to
/// [`parse_discrete_list`]: on success everything is parsed, on failure the
/// whole string lands in the unparsed bucket verbatim.
///
/// # Examples
///
/// ```rust
/// use address_extract::parse_list;
///
/// let (parsed, unparsed) = parse_list(vec!["A <a@b>", "C", "D <d@e>"]);
/// assert_eq!(parsed.len(), 2);
/// assert_eq!(unparsed, vec!["C"]);
/// ```
pub fn parse_list(input: impl Into<ListSource>) -> (AddressList, Vec<String>) {
    let (parsed, unparsed, _metrics) = parse_list_with_metrics(input);
    (parsed, unparsed)
}

/// [`parse_list`], also returning stage timing summed across items.
pub fn parse_list_with_metrics(
    input: impl Into<ListSource>,
) -> (AddressList, Vec<String>, Metrics) {
    let mut metrics = Metrics::default();

    match input.into() {
        ListSource::Text(text) => {
            if text.is_empty() {
                return (AddressList::new(), Vec::new(), metrics);
            }
            if text.len() > MAX_ADDRESS_LIST_LENGTH {
                warn!(
                    length = text.len(),
                    "address list exceeds maximum length of {MAX_ADDRESS_LIST_LENGTH}"
                );
                return (AddressList::new(), vec![text], metrics);
            }
            let (parsed, m) = parse_discrete_list_with_metrics(&text);
            metrics.parsing += m.parsing;
            match parsed {
                Some(list) => (list, Vec::new(), metrics),
                None => (AddressList::new(), vec![text], metrics),
            }
        }
        ListSource::Items(items) => {
            if items.len() > MAX_ADDRESS_NUMBER {
                warn!(
                    count = items.len(),
                    "address list exceeds maximum items of {MAX_ADDRESS_NUMBER}"
                );
                let unparsed = items
                    .into_iter()
                    .map(|item| match item {
                        ListItem::Raw(s) => s,
                        ListItem::Parsed(a) => a.full_spec(),
                    })
                    .collect();
                return (AddressList::new(), unparsed, metrics);
            }

            let mut parsed = AddressList::new();
            let mut unparsed = Vec::new();
            for item in items {
                match item {
                    ListItem::Raw(raw) => {
                        let (result, m) = parse_with_metrics(&raw, false);
                        metrics.parsing += m.parsing;
                        match result {
                            Some(addr) => parsed.push(addr),
                            None => unparsed.push(raw),
                        }
                    }
                    ListItem::Parsed(addr) => parsed.push(addr),
                }
            }
            (parsed, unparsed, metrics)
        }
    }
}

/// True iff the text parses as a bare addr-spec. No DNS or provider checks.
#[must_use]
pub fn is_email(text: &str) -> bool {
    parse(text, true).is_some()
}

fn lift_single(tree: SyntaxTree) -> Result<Address> {
    match tree {
        SyntaxTree::Mailbox {
            display_name,
            local_part,
            domain,
        } => {
            let addr = EmailAddress::from_components(
                &crate::types::unquote_display_name(&display_name),
                &local_part,
                &domain,
            )?;
            Ok(Address::Email(addr))
        }
        SyntaxTree::Url { address } => Ok(Address::Url(UrlAddress::from_address(address)?)),
        SyntaxTree::List(_) => Err(ParseError::Syntax(
            "expected a single address, found a list".into(),
        )),
    }
}

fn lift_list(tree: SyntaxTree) -> Result<AddressList> {
    let SyntaxTree::List(items) = tree else {
        return Err(ParseError::Syntax("expected an address list".into()));
    };
    items.into_iter().map(lift_single).collect()
}
