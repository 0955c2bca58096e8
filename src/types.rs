//! Core address model: email addresses, URLs and address lists

use crate::encoding::{domain_to_ace, encode_word, is_pure_ascii, smart_quote, smart_unquote};
use crate::error::{EncodingError, ParseError, Result};
use crate::grammar::{self, GrammarVariant, SyntaxTree, Tokenizer};
use crate::parser::MAX_ADDRESS_LENGTH;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Index};

/// The kind of a parsed address
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AddrType {
    Email,
    Url,
}

/// A parsed internet address: either an email mailbox or a URL.
///
/// Instances only exist for text that passed the grammar, or for parts
/// supplied through the trusted component constructors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Address {
    Email(EmailAddress),
    Url(UrlAddress),
}

impl Address {
    #[must_use]
    pub const fn addr_type(&self) -> AddrType {
        match self {
            Self::Email(_) => AddrType::Email,
            Self::Url(_) => AddrType::Url,
        }
    }

    /// Canonical textual form, ASCII-compatible where possible.
    #[must_use]
    pub fn full_spec(&self) -> String {
        match self {
            Self::Email(e) => e.full_spec(),
            Self::Url(u) => u.address().to_string(),
        }
    }

    /// Literal Unicode textual form.
    #[must_use]
    pub fn to_unicode(&self) -> String {
        match self {
            Self::Email(e) => e.to_unicode(),
            Self::Url(u) => u.address().to_string(),
        }
    }

    /// Only email addresses can be routed.
    #[must_use]
    pub const fn supports_routing(&self) -> bool {
        matches!(self, Self::Email(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(e) => write!(f, "{e}"),
            Self::Url(u) => write!(f, "{u}"),
        }
    }
}

impl From<EmailAddress> for Address {
    fn from(addr: EmailAddress) -> Self {
        Self::Email(addr)
    }
}

impl From<UrlAddress> for Address {
    fn from(addr: UrlAddress) -> Self {
        Self::Url(addr)
    }
}

/// A fully parsed email address.
///
/// The canonical `local@domain` form is always derived; the domain keeps
/// its original case in storage and is lower-cased on read. Two addresses
/// are equal iff their derived addresses match case-insensitively, and
/// hashing is consistent with that equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAddress {
    display_name: String,
    local_part: String,
    domain: String,
}

impl EmailAddress {
    /// Parse a full mailbox (`Display Name <local@domain>` or bare
    /// addr-spec) through the mailbox grammar.
    pub fn from_raw_mailbox(raw: &str) -> Result<Self> {
        let mut lexer = Tokenizer::template().fresh();
        let tree = grammar::parse(raw, &mut lexer, GrammarVariant::Mailbox)?;
        Self::from_tree(tree)
    }

    /// Parse a bare `local@domain` through the addr-spec grammar.
    pub fn from_raw_addr_spec(raw: &str) -> Result<Self> {
        let mut lexer = Tokenizer::template().fresh();
        let tree = grammar::parse(raw, &mut lexer, GrammarVariant::AddrSpec)?;
        Self::from_tree(tree)
    }

    /// Combine a display name with a raw addr-spec, parsing only the
    /// addr-spec.
    pub fn from_display_and_spec(display_name: &str, raw_addr_spec: &str) -> Result<Self> {
        let mut lexer = Tokenizer::template().fresh();
        let tree = grammar::parse(raw_addr_spec, &mut lexer, GrammarVariant::AddrSpec)?;
        let SyntaxTree::Mailbox {
            local_part, domain, ..
        } = tree
        else {
            return Err(ParseError::Syntax("expected an addr-spec".into()));
        };
        Ok(Self {
            display_name: unquote_display_name(display_name),
            local_part,
            domain,
        })
    }

    /// Build directly from already-validated parts. The local part and
    /// domain must be non-empty; anything else is a caller bug.
    pub fn from_components(display_name: &str, local_part: &str, domain: &str) -> Result<Self> {
        if local_part.is_empty() || domain.is_empty() {
            return Err(ParseError::BadParameters(
                "local part and domain must be non-empty".into(),
            ));
        }
        Ok(Self {
            display_name: display_name.to_string(),
            local_part: local_part.to_string(),
            domain: domain.to_string(),
        })
    }

    fn from_tree(tree: SyntaxTree) -> Result<Self> {
        let SyntaxTree::Mailbox {
            display_name,
            local_part,
            domain,
        } = tree
        else {
            return Err(ParseError::Syntax("expected a mailbox".into()));
        };
        Ok(Self {
            display_name: unquote_display_name(&display_name),
            local_part,
            domain,
        })
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The display name is the only mutable attribute.
    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }

    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// Domain with original case preserved
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Canonical `local@domain` with the domain lower-cased
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}@{}", self.local_part, self.domain.to_lowercase())
    }

    /// Canonical textual form: ASCII-compatible when the local part allows
    /// it, the literal Unicode form otherwise.
    #[must_use]
    pub fn full_spec(&self) -> String {
        if self.requires_non_ascii() {
            self.to_unicode()
        } else {
            self.to_ace().unwrap_or_else(|_| self.to_unicode())
        }
    }

    /// ASCII-compatible encoding: IDNA domain, display name as an encoded
    /// word, quoted if it contains syntax-significant characters.
    pub fn to_ace(&self) -> Result<String, EncodingError> {
        if !is_pure_ascii(&self.local_part) {
            return Err(EncodingError {
                address: self.address(),
            });
        }
        let ace_domain = domain_to_ace(&self.domain).ok_or_else(|| EncodingError {
            address: self.address(),
        })?;
        if self.display_name.is_empty() {
            Ok(format!("{}@{ace_domain}", self.local_part))
        } else {
            let name = smart_quote(&encode_word(&self.display_name, MAX_ADDRESS_LENGTH));
            Ok(format!("{name} <{}@{ace_domain}>", self.local_part))
        }
    }

    /// `display_name <local@domain>` with the domain in original case
    #[must_use]
    pub fn to_unicode(&self) -> String {
        if self.display_name.is_empty() {
            format!("{}@{}", self.local_part, self.domain)
        } else {
            format!("{} <{}@{}>", self.display_name, self.local_part, self.domain)
        }
    }

    /// Does the canonical address contain any non-ASCII characters?
    #[must_use]
    pub fn contains_non_ascii(&self) -> bool {
        !is_pure_ascii(&self.address())
    }

    /// True iff the local part rules out an ASCII-compatible encoding
    #[must_use]
    pub fn requires_non_ascii(&self) -> bool {
        !is_pure_ascii(&self.local_part)
    }

    /// Is the domain a bracketed literal (`[...]`)? Such domains have no
    /// DNS records to check.
    #[must_use]
    pub fn contains_domain_literal(&self) -> bool {
        self.domain.starts_with('[') && self.domain.ends_with(']')
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}

impl PartialEq for EmailAddress {
    fn eq(&self, other: &Self) -> bool {
        self.address().to_lowercase() == other.address().to_lowercase()
    }
}

impl Eq for EmailAddress {}

impl Hash for EmailAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().to_lowercase().hash(state);
    }
}

/// A name handed back by the grammar may still carry its quotes. A name of
/// exactly `""` is left alone: it means "no name", not an empty quoted name.
pub(crate) fn unquote_display_name(display_name: &str) -> String {
    if display_name.starts_with('"') && display_name.ends_with('"') && display_name != "\"\"" {
        smart_unquote(display_name)
    } else {
        display_name.to_string()
    }
}

/// A parsed URL.
///
/// Component accessors are computed on demand from standard URL
/// decomposition; equality and hashing use the exact address string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UrlAddress {
    address: String,
}

impl UrlAddress {
    /// Parse raw text through the URL grammar.
    pub fn from_raw(raw: &str) -> Result<Self> {
        let mut lexer = Tokenizer::template().fresh();
        let tree = grammar::parse(raw, &mut lexer, GrammarVariant::Url)?;
        let SyntaxTree::Url { address } = tree else {
            return Err(ParseError::Syntax("expected a url".into()));
        };
        Ok(Self { address })
    }

    /// Build directly from an already-validated address string.
    pub fn from_address(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(ParseError::BadParameters("url must be non-empty".into()));
        }
        Ok(Self { address })
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Lower-cased host, if the URL has one
    #[must_use]
    pub fn hostname(&self) -> Option<String> {
        url::Url::parse(&self.address)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
    }

    #[must_use]
    pub fn port(&self) -> Option<u16> {
        url::Url::parse(&self.address).ok().and_then(|u| u.port())
    }

    #[must_use]
    pub fn scheme(&self) -> Option<String> {
        url::Url::parse(&self.address)
            .ok()
            .map(|u| u.scheme().to_string())
    }

    #[must_use]
    pub fn path(&self) -> Option<String> {
        url::Url::parse(&self.address)
            .ok()
            .map(|u| u.path().to_string())
    }

    #[must_use]
    pub fn full_spec(&self) -> String {
        self.address.clone()
    }

    #[must_use]
    pub fn to_unicode(&self) -> String {
        self.address.clone()
    }
}

impl fmt::Display for UrlAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// An ordered collection of parsed addresses.
///
/// Order is preserved for iteration and display, but equality is set-based:
/// two lists are equal iff they contain the same addresses, ignoring order
/// and duplicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressList {
    container: Vec<Address>,
}

impl AddressList {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            container: Vec::new(),
        }
    }

    pub fn push(&mut self, address: impl Into<Address>) {
        self.container.push(address.into());
    }

    /// Remove the first element equal to `address`. Returns whether
    /// anything was removed.
    pub fn remove(&mut self, address: &Address) -> bool {
        if let Some(idx) = self.container.iter().position(|a| a == address) {
            self.container.remove(idx);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.container.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Address> {
        self.container.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.container.iter()
    }

    /// Is an address equal to the parse of `raw` present?
    #[must_use]
    pub fn contains(&self, raw: &str) -> bool {
        crate::parser::parse(raw, false).is_some_and(|addr| self.container.contains(&addr))
    }

    /// Canonical forms joined with `", "`
    #[must_use]
    pub fn full_spec(&self) -> String {
        self.join_full_spec(", ")
    }

    #[must_use]
    pub fn join_full_spec(&self, delimiter: &str) -> String {
        self.container
            .iter()
            .map(Address::full_spec)
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    #[must_use]
    pub fn to_unicode(&self) -> String {
        self.container
            .iter()
            .map(Address::to_unicode)
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[must_use]
    pub fn to_ascii_list(&self) -> Vec<String> {
        self.container.iter().map(Address::full_spec).collect()
    }

    /// Canonical address strings, without display names
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.container
            .iter()
            .map(|addr| match addr {
                Address::Email(e) => e.address(),
                Address::Url(u) => u.address().to_string(),
            })
            .collect()
    }

    /// The set of hosts across all elements
    #[must_use]
    pub fn hostnames(&self) -> HashSet<String> {
        self.container
            .iter()
            .filter_map(|addr| match addr {
                Address::Email(e) => Some(e.domain().to_lowercase()),
                Address::Url(u) => u.hostname(),
            })
            .collect()
    }

    /// The set of address kinds present
    #[must_use]
    pub fn addr_types(&self) -> HashSet<AddrType> {
        self.container.iter().map(Address::addr_type).collect()
    }
}

impl PartialEq for AddressList {
    fn eq(&self, other: &Self) -> bool {
        let ours: HashSet<&Address> = self.container.iter().collect();
        let theirs: HashSet<&Address> = other.container.iter().collect();
        ours == theirs
    }
}

impl Eq for AddressList {}

impl fmt::Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.full_spec())
    }
}

impl Index<usize> for AddressList {
    type Output = Address;

    fn index(&self, index: usize) -> &Address {
        &self.container[index]
    }
}

impl FromIterator<Address> for AddressList {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            container: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AddressList {
    type Item = Address;
    type IntoIter = std::vec::IntoIter<Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.container.into_iter()
    }
}

impl<'a> IntoIterator for &'a AddressList {
    type Item = &'a Address;
    type IntoIter = std::slice::Iter<'a, Address>;

    fn into_iter(self) -> Self::IntoIter {
        self.container.iter()
    }
}

impl Add for AddressList {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self.container.extend(other.container);
        self
    }
}

/// Concatenating raw text parses it first; only the parseable portion is
/// appended.
impl Add<&str> for AddressList {
    type Output = Self;

    fn add(self, other: &str) -> Self {
        let (parsed, _unparsed) = crate::parser::parse_list(other);
        self + parsed
    }
}
