//! Tokenizer and grammar engine for mailboxes, addr-specs and URLs.
//!
//! The tokenizer is stateful and must never be shared across concurrent
//! parses: every entry point clones an independent instance from the
//! immutable [`Tokenizer::template`] before running a grammar.

use crate::error::{ParseError, Result};
use regex::Regex;
use std::sync::LazyLock;

static URL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://\S+$").unwrap());

/// Which grammar to run the token stream against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarVariant {
    /// Bare `local@domain`, nothing else
    AddrSpec,
    /// Full mailbox: optional display name plus angle-addr or bare addr-spec
    Mailbox,
    /// A mailbox or a URL
    MailboxOrUrl,
    /// A comma/semicolon delimited list of mailboxes and URLs
    MailboxOrUrlList,
    /// A URL, nothing else
    Url,
}

/// Result of a successful grammar run.
///
/// Display names and local parts are returned verbatim, including any
/// surrounding quotes; unquoting is the model's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxTree {
    Mailbox {
        display_name: String,
        local_part: String,
        domain: String,
    },
    Url {
        address: String,
    },
    List(Vec<SyntaxTree>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Atom(String),
    /// Raw quoted string, surrounding quotes and escapes intact
    QuotedString(String),
    /// Domain literal, brackets intact
    DomainLiteral(String),
    Url(String),
    At,
    LAngle,
    RAngle,
    Comma,
    Semi,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Atom(a) => format!("atom '{a}'"),
            Self::QuotedString(q) => format!("quoted string {q}"),
            Self::DomainLiteral(d) => format!("domain literal {d}"),
            Self::Url(u) => format!("url '{u}'"),
            Self::At => "'@'".into(),
            Self::LAngle => "'<'".into(),
            Self::RAngle => "'>'".into(),
            Self::Comma => "','".into(),
            Self::Semi => "';'".into(),
        }
    }
}

/// Token-stream reader over one input buffer.
///
/// Cheap to clone; [`Tokenizer::fresh`] hands out an independent reader so
/// parsing stays reentrant.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pos: usize,
}

static TEMPLATE: Tokenizer = Tokenizer::new();

impl Tokenizer {
    #[must_use]
    pub const fn new() -> Self {
        Self { pos: 0 }
    }

    /// The shared read-only template all parses clone from.
    #[must_use]
    pub fn template() -> &'static Self {
        &TEMPLATE
    }

    /// An independent reader positioned at the start of input.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self { pos: 0 }
    }

    fn tokenize(&mut self, input: &str) -> Result<Vec<Token>> {
        let bytes = input.as_bytes();
        let len = bytes.len();
        let mut tokens = Vec::new();

        while self.pos < len {
            match bytes[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'<' => {
                    tokens.push(Token::LAngle);
                    self.pos += 1;
                }
                b'>' => {
                    tokens.push(Token::RAngle);
                    self.pos += 1;
                }
                b'@' => {
                    tokens.push(Token::At);
                    self.pos += 1;
                }
                b',' => {
                    tokens.push(Token::Comma);
                    self.pos += 1;
                }
                b';' => {
                    tokens.push(Token::Semi);
                    self.pos += 1;
                }
                b'"' => tokens.push(self.quoted_string(input)?),
                b'[' => tokens.push(self.domain_literal(input)?),
                b']' => {
                    return Err(ParseError::Lexical(format!(
                        "unexpected ']' at offset {}",
                        self.pos
                    )));
                }
                // ':' only occurs inside a URL token; bare colons have no
                // grammar to land in, and the atom scanner stops before
                // them, so reject here to guarantee progress.
                b':' => {
                    return Err(ParseError::Lexical(format!(
                        "unexpected ':' at offset {}",
                        self.pos
                    )));
                }
                b if b.is_ascii_control() => {
                    return Err(ParseError::Lexical(format!(
                        "control character 0x{b:02x} at offset {}",
                        self.pos
                    )));
                }
                _ => tokens.push(self.atom_or_url(input)),
            }
        }

        Ok(tokens)
    }

    /// Scan a quoted string, honoring backslash escapes. The raw text
    /// including the surrounding quotes becomes the token value.
    fn quoted_string(&mut self, input: &str) -> Result<Token> {
        let bytes = input.as_bytes();
        let len = bytes.len();
        let start = self.pos;
        self.pos += 1;

        while self.pos < len {
            match bytes[self.pos] {
                b'\\' if self.pos + 1 < len => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Ok(Token::QuotedString(input[start..self.pos].to_string()));
                }
                _ => self.pos += 1,
            }
        }

        Err(ParseError::Lexical(format!(
            "unterminated quoted string starting at offset {start}"
        )))
    }

    fn domain_literal(&mut self, input: &str) -> Result<Token> {
        let bytes = input.as_bytes();
        let len = bytes.len();
        let start = self.pos;
        self.pos += 1;

        while self.pos < len {
            match bytes[self.pos] {
                b']' => {
                    self.pos += 1;
                    return Ok(Token::DomainLiteral(input[start..self.pos].to_string()));
                }
                b'[' => break,
                b if b.is_ascii_control() => break,
                _ => self.pos += 1,
            }
        }

        Err(ParseError::Lexical(format!(
            "unterminated domain literal starting at offset {start}"
        )))
    }

    /// Scan a run of atom characters. A run shaped like `scheme://...` is
    /// promoted to a URL token, which keeps characters an atom would stop
    /// at (`@`, `:`) inside the token.
    fn atom_or_url(&mut self, input: &str) -> Token {
        let bytes = input.as_bytes();
        let len = bytes.len();
        let start = self.pos;

        let mut url_end = self.pos;
        while url_end < len && !matches!(bytes[url_end], b' ' | b'\t' | b'\r' | b'\n' | b',' | b';' | b'<' | b'>' | b'"')
        {
            url_end += 1;
        }
        if URL_TOKEN.is_match(&input[start..url_end]) {
            self.pos = url_end;
            return Token::Url(input[start..url_end].to_string());
        }

        while self.pos < len
            && !matches!(
                bytes[self.pos],
                b' ' | b'\t'
                    | b'\r'
                    | b'\n'
                    | b'<'
                    | b'>'
                    | b'@'
                    | b','
                    | b';'
                    | b':'
                    | b'"'
                    | b'['
                    | b']'
            )
            && !bytes[self.pos].is_ascii_control()
        {
            self.pos += 1;
        }

        Token::Atom(input[start..self.pos].to_string())
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `input` through the grammar selected by `variant`, consuming the
/// whole token stream.
pub fn parse(input: &str, lexer: &mut Tokenizer, variant: GrammarVariant) -> Result<SyntaxTree> {
    let tokens = lexer.tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };

    let tree = match variant {
        GrammarVariant::AddrSpec => parser.addr_spec()?,
        GrammarVariant::Mailbox => parser.mailbox()?,
        GrammarVariant::MailboxOrUrl => parser.mailbox_or_url()?,
        GrammarVariant::Url => parser.url()?,
        GrammarVariant::MailboxOrUrlList => parser.list()?,
    };

    parser.expect_end()?;
    Ok(tree)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(ParseError::Syntax(format!(
                "trailing input: unexpected {}",
                t.describe()
            ))),
        }
    }

    fn addr_spec(&mut self) -> Result<SyntaxTree> {
        let (local_part, domain) = self.addr_spec_parts()?;
        Ok(SyntaxTree::Mailbox {
            display_name: String::new(),
            local_part,
            domain,
        })
    }

    /// `local-part "@" domain`
    fn addr_spec_parts(&mut self) -> Result<(String, String)> {
        let local_part = match self.bump() {
            Some(Token::Atom(a)) => {
                check_dot_atom(&a, "local part")?;
                a
            }
            Some(Token::QuotedString(q)) => q,
            Some(t) => {
                return Err(ParseError::Syntax(format!(
                    "expected local part, found {}",
                    t.describe()
                )));
            }
            None => return Err(ParseError::Syntax("expected local part, found end of input".into())),
        };

        match self.bump() {
            Some(Token::At) => {}
            Some(t) => {
                return Err(ParseError::Syntax(format!(
                    "expected '@', found {}",
                    t.describe()
                )));
            }
            None => return Err(ParseError::Syntax("expected '@', found end of input".into())),
        }

        let domain = match self.bump() {
            Some(Token::Atom(a)) => {
                check_dot_atom(&a, "domain")?;
                a
            }
            Some(Token::DomainLiteral(d)) => d,
            Some(t) => {
                return Err(ParseError::Syntax(format!(
                    "expected domain, found {}",
                    t.describe()
                )));
            }
            None => return Err(ParseError::Syntax("expected domain, found end of input".into())),
        };

        Ok((local_part, domain))
    }

    /// `[phrase] "<" addr-spec ">"` or a bare addr-spec.
    fn mailbox(&mut self) -> Result<SyntaxTree> {
        let mut phrase: Vec<String> = Vec::new();

        // Bare addr-spec: exactly one word followed by '@'.
        loop {
            match self.peek() {
                Some(Token::At) if phrase.len() == 1 => {
                    self.pos += 1;
                    let local_part = phrase.pop().unwrap_or_default();
                    if !local_part.starts_with('"') {
                        check_dot_atom(&local_part, "local part")?;
                    }
                    let domain = match self.bump() {
                        Some(Token::Atom(a)) => {
                            check_dot_atom(&a, "domain")?;
                            a
                        }
                        Some(Token::DomainLiteral(d)) => d,
                        Some(t) => {
                            return Err(ParseError::Syntax(format!(
                                "expected domain, found {}",
                                t.describe()
                            )));
                        }
                        None => {
                            return Err(ParseError::Syntax(
                                "expected domain, found end of input".into(),
                            ));
                        }
                    };
                    return Ok(SyntaxTree::Mailbox {
                        display_name: String::new(),
                        local_part,
                        domain,
                    });
                }
                Some(Token::Atom(_) | Token::QuotedString(_)) => {
                    if let Some(Token::Atom(word) | Token::QuotedString(word)) = self.bump() {
                        phrase.push(word);
                    }
                }
                Some(Token::LAngle) => {
                    self.pos += 1;
                    let (local_part, domain) = self.addr_spec_parts()?;
                    match self.bump() {
                        Some(Token::RAngle) => {}
                        Some(t) => {
                            return Err(ParseError::Syntax(format!(
                                "expected '>', found {}",
                                t.describe()
                            )));
                        }
                        None => {
                            return Err(ParseError::Syntax(
                                "expected '>', found end of input".into(),
                            ));
                        }
                    }
                    return Ok(SyntaxTree::Mailbox {
                        display_name: phrase.join(" "),
                        local_part,
                        domain,
                    });
                }
                Some(t) => {
                    return Err(ParseError::Syntax(format!(
                        "expected mailbox, found {}",
                        t.describe()
                    )));
                }
                None => {
                    return Err(ParseError::Syntax(
                        "expected mailbox, found end of input".into(),
                    ));
                }
            }
        }
    }

    fn url(&mut self) -> Result<SyntaxTree> {
        match self.bump() {
            Some(Token::Url(address)) => Ok(SyntaxTree::Url { address }),
            Some(t) => Err(ParseError::Syntax(format!(
                "expected url, found {}",
                t.describe()
            ))),
            None => Err(ParseError::Syntax("expected url, found end of input".into())),
        }
    }

    fn mailbox_or_url(&mut self) -> Result<SyntaxTree> {
        if matches!(self.peek(), Some(Token::Url(_))) {
            self.url()
        } else {
            self.mailbox()
        }
    }

    fn list(&mut self) -> Result<SyntaxTree> {
        let mut items = vec![self.mailbox_or_url()?];
        while matches!(self.peek(), Some(Token::Comma | Token::Semi)) {
            self.pos += 1;
            items.push(self.mailbox_or_url()?);
        }
        Ok(SyntaxTree::List(items))
    }
}

/// A dot-atom must not start or end with a dot or contain consecutive dots.
fn check_dot_atom(atom: &str, role: &str) -> Result<()> {
    if atom.starts_with('.') || atom.ends_with('.') || atom.contains("..") {
        return Err(ParseError::Syntax(format!(
            "{role} '{atom}' is not a valid dot-atom"
        )));
    }
    Ok(())
}
