//! Validation pipeline: preparse, grammar parse, mail-exchanger lookup and
//! provider-specific local-part grammar checks

use crate::metrics::Metrics;
use crate::parser::{self, ListSource};
use crate::types::{Address, AddressList, EmailAddress};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;
use trust_dns_resolver::Resolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;

/// A resolved mail exchanger host for some domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchanger(pub String);

impl Exchanger {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of a mail-exchanger lookup.
///
/// `NoExchanger` and `LookupFailed` are kept distinct so monitoring can tell
/// a domain without mail service apart from broken lookup infrastructure;
/// the pipeline rejects the address either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxOutcome {
    /// The domain advertises a mail exchanger
    Exchanger(Exchanger),
    /// The domain has no mail exchanger
    NoExchanger,
    /// The lookup itself failed
    LookupFailed(String),
}

/// Sub-stage timing reported by an [`MxLookup`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxMetrics {
    pub mx_lookup: Duration,
    pub dns_lookup: Duration,
    pub mx_conn: Duration,
}

/// Provider-aware cleanup of a raw addr-spec into `(local_part, domain)`.
/// `None` means the text is not even address-shaped.
pub trait Preparser {
    fn preparse(&self, addr_spec: &str) -> Option<(String, String)>;
}

/// Confirms whether a domain currently advertises a mail exchanger.
///
/// Implementations own their caching and timeout/retry policy; the pipeline
/// tolerates arbitrary latency and never imposes its own timeouts.
pub trait MxLookup {
    fn lookup(&self, domain: &str) -> (MxOutcome, MxMetrics);
}

/// Local-part grammar for a specific provider.
pub trait LocalPartGrammar {
    fn validate(&self, local_part: &str) -> bool;
}

/// Registry of provider grammars, keyed by a pattern over the resolved
/// exchanger host.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<(Regex, Box<dyn LocalPartGrammar + Send + Sync>)>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in provider grammars.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(GMAIL_EXCHANGER.clone(), Box::new(GmailGrammar::new()));
        registry
    }

    pub fn register(&mut self, exchanger: Regex, plugin: Box<dyn LocalPartGrammar + Send + Sync>) {
        self.plugins.push((exchanger, plugin));
    }

    /// The first plugin whose pattern matches the exchanger host, if any.
    #[must_use]
    pub fn plugin_for(&self, exchanger: &Exchanger) -> Option<&dyn LocalPartGrammar> {
        self.plugins
            .iter()
            .find(|(pattern, _)| pattern.is_match(exchanger.as_str()))
            .map(|(_, plugin)| plugin.as_ref() as &dyn LocalPartGrammar)
    }
}

static GMAIL_EXCHANGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|\.)google(mail)?\.com\.?$").unwrap());

static GMAIL_LOCAL_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9](\.?[a-zA-Z0-9]){5,29}$").unwrap());

/// Gmail local parts: 6-30 alphanumerics with single interior dots, an
/// optional `+tag` suffix ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GmailGrammar;

impl GmailGrammar {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LocalPartGrammar for GmailGrammar {
    fn validate(&self, local_part: &str) -> bool {
        let base = local_part.split('+').next().unwrap_or(local_part);
        GMAIL_LOCAL_PART.is_match(base)
    }
}

/// Default preparser: trims whitespace, strips one pair of angle brackets,
/// splits at the last `@`, lower-cases the domain and drops one trailing
/// dot from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPreparser;

impl Preparser for DefaultPreparser {
    fn preparse(&self, addr_spec: &str) -> Option<(String, String)> {
        let mut spec = addr_spec.trim();
        if spec.starts_with('<') && spec.ends_with('>') && spec.len() >= 2 {
            spec = &spec[1..spec.len() - 1];
        }
        let (local_part, domain) = spec.rsplit_once('@')?;
        let local_part = local_part.trim();
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        if local_part.is_empty() || domain.is_empty() {
            return None;
        }
        Some((local_part.to_string(), domain))
    }
}

/// DNS-backed mail-exchanger lookup with a process-wide result cache.
///
/// Domains with a definite answer (exchanger found or no records) are
/// cached; transient lookup failures are not, so they can be retried.
pub struct DnsMxLookup {
    resolver: Resolver,
    cache: Mutex<HashMap<String, MxOutcome>>,
}

impl DnsMxLookup {
    /// Resolver with the default configuration. `None` if the resolver
    /// cannot be constructed.
    #[must_use]
    pub fn from_system() -> Option<Self> {
        match Resolver::new(ResolverConfig::default(), ResolverOpts::default()) {
            Ok(resolver) => Some(Self {
                resolver,
                cache: Mutex::new(HashMap::new()),
            }),
            Err(err) => {
                warn!("failed to construct dns resolver: {err}");
                None
            }
        }
    }
}

impl MxLookup for DnsMxLookup {
    fn lookup(&self, domain: &str) -> (MxOutcome, MxMetrics) {
        let mut metrics = MxMetrics::default();
        let key = domain.to_lowercase();

        if let Ok(cache) = self.cache.lock()
            && let Some(outcome) = cache.get(&key)
        {
            return (outcome.clone(), metrics);
        }

        let start = Instant::now();
        let outcome = match self.resolver.mx_lookup(key.as_str()) {
            Ok(records) => records
                .iter()
                .min_by_key(|mx| mx.preference())
                .map_or(MxOutcome::NoExchanger, |mx| {
                    let host = mx.exchange().to_utf8();
                    MxOutcome::Exchanger(Exchanger(host.trim_end_matches('.').to_string()))
                }),
            Err(err) => match err.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => MxOutcome::NoExchanger,
                _ => MxOutcome::LookupFailed(err.to_string()),
            },
        };
        metrics.dns_lookup = start.elapsed();
        metrics.mx_lookup = metrics.dns_lookup;

        if !matches!(outcome, MxOutcome::LookupFailed(_))
            && let Ok(mut cache) = self.cache.lock()
        {
            cache.insert(key, outcome.clone());
        }

        (outcome, metrics)
    }
}

/// The validation pipeline over pluggable collaborators.
pub struct Validator {
    preparser: Box<dyn Preparser + Send + Sync>,
    mx: Box<dyn MxLookup + Send + Sync>,
    plugins: PluginRegistry,
}

impl Validator {
    #[must_use]
    pub fn new(
        preparser: Box<dyn Preparser + Send + Sync>,
        mx: Box<dyn MxLookup + Send + Sync>,
        plugins: PluginRegistry,
    ) -> Self {
        Self {
            preparser,
            mx,
            plugins,
        }
    }

    /// Default preparser and built-in plugins over the given lookup.
    #[must_use]
    pub fn with_lookup(mx: Box<dyn MxLookup + Send + Sync>) -> Self {
        Self::new(
            Box::new(DefaultPreparser),
            mx,
            PluginRegistry::with_builtins(),
        )
    }

    /// Fully default pipeline: system DNS resolver, default preparser,
    /// built-in plugins. `None` if the resolver cannot be constructed.
    #[must_use]
    pub fn with_defaults() -> Option<Self> {
        DnsMxLookup::from_system().map(|mx| Self::with_lookup(Box::new(mx)))
    }

    /// Validate a single addr-spec: preparse, grammar parse, MX lookup,
    /// provider grammar. Any stage failing ends the pipeline with `None`.
    #[must_use]
    pub fn validate_address(&self, addr_spec: &str) -> Option<EmailAddress> {
        self.validate_address_with_metrics(addr_spec).0
    }

    /// [`Validator::validate_address`], also returning per-stage timing.
    #[must_use]
    pub fn validate_address_with_metrics(&self, addr_spec: &str) -> (Option<EmailAddress>, Metrics) {
        let mut metrics = Metrics::default();

        let Some((local_part, domain)) = self.preparser.preparse(addr_spec) else {
            return (None, metrics);
        };

        let start = Instant::now();
        let parsed = parser::parse(&format!("{local_part}@{domain}"), true);
        metrics.parsing = start.elapsed();
        let Some(Address::Email(addr)) = parsed else {
            return (None, metrics);
        };

        // Literal-IP domains have nothing to look up; syntax is all we can
        // check.
        if addr.contains_domain_literal() {
            return (Some(addr), metrics);
        }

        let (outcome, mx_metrics) = self.mx.lookup(&domain);
        metrics.mx_lookup += mx_metrics.mx_lookup;
        metrics.dns_lookup += mx_metrics.dns_lookup;
        metrics.mx_conn += mx_metrics.mx_conn;
        let exchanger = match outcome {
            MxOutcome::Exchanger(exchanger) => exchanger,
            MxOutcome::NoExchanger => {
                warn!(domain = %domain, "no mail exchanger");
                return (None, metrics);
            }
            MxOutcome::LookupFailed(reason) => {
                warn!(domain = %domain, "mail exchanger lookup failed: {reason}");
                return (None, metrics);
            }
        };

        let start = Instant::now();
        let accepted = self
            .plugins
            .plugin_for(&exchanger)
            .is_none_or(|plugin| plugin.validate(addr.local_part()));
        metrics.custom_grammar = start.elapsed();
        if !accepted {
            warn!(domain = %domain, "local part rejected by provider grammar");
            return (None, metrics);
        }

        (Some(addr), metrics)
    }

    /// Validate a list tolerantly, partitioning into accepted addresses and
    /// rejected raw text.
    ///
    /// Addresses that parsed in the batch pass go through MX and provider
    /// checks only; items the batch pass could not parse are retried
    /// through the full single-address pipeline, whose preparsing can
    /// repair them.
    pub fn validate_list(&self, input: impl Into<ListSource>) -> (AddressList, Vec<String>) {
        let (accepted, rejected, _metrics) = self.validate_list_with_metrics(input);
        (accepted, rejected)
    }

    /// [`Validator::validate_list`], also returning aggregated timing.
    pub fn validate_list_with_metrics(
        &self,
        input: impl Into<ListSource>,
    ) -> (AddressList, Vec<String>, Metrics) {
        let mut metrics = Metrics::default();
        let (parsed, unparsed, parse_metrics) = parser::parse_list_with_metrics(input);
        metrics.parsing = parse_metrics.parsing;

        let mut accepted = AddressList::new();
        let mut rejected = Vec::new();

        for addr in parsed {
            let email = match addr {
                Address::Email(email) => email,
                Address::Url(url) => {
                    // URLs cannot be routed
                    rejected.push(url.address().to_string());
                    continue;
                }
            };

            if email.contains_domain_literal() {
                accepted.push(email);
                continue;
            }

            let (outcome, mx_metrics) = self.mx.lookup(&email.domain().to_lowercase());
            metrics.mx_lookup += mx_metrics.mx_lookup;
            metrics.dns_lookup += mx_metrics.dns_lookup;
            metrics.mx_conn += mx_metrics.mx_conn;
            let MxOutcome::Exchanger(exchanger) = outcome else {
                rejected.push(email.full_spec());
                continue;
            };

            let plugin = self.plugins.plugin_for(&exchanger);
            let start = Instant::now();
            if plugin.is_some_and(|p| !p.validate(email.local_part())) {
                rejected.push(email.full_spec());
                continue;
            }
            // Last accepted item wins for this stage's timing; the MX
            // stages above accumulate.
            metrics.custom_grammar = start.elapsed();

            accepted.push(email);
        }

        for raw in unparsed {
            let (result, item_metrics) = self.validate_address_with_metrics(&raw);
            metrics.absorb(&item_metrics);
            match result {
                Some(email) => accepted.push(email),
                None => rejected.push(raw),
            }
        }

        (accepted, rejected, metrics)
    }
}
