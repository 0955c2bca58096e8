use address_extract::*;
use std::collections::HashMap;
use std::time::Duration;

/// Fixed domain-to-exchanger table standing in for DNS.
struct StaticMx {
    exchangers: HashMap<String, String>,
}

impl StaticMx {
    fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            exchangers: entries
                .iter()
                .map(|(domain, host)| ((*domain).to_string(), (*host).to_string()))
                .collect(),
        }
    }
}

impl MxLookup for StaticMx {
    fn lookup(&self, domain: &str) -> (MxOutcome, MxMetrics) {
        let metrics = MxMetrics {
            mx_lookup: Duration::from_millis(5),
            dns_lookup: Duration::from_millis(3),
            mx_conn: Duration::from_millis(1),
        };
        let outcome = self.exchangers.get(domain).map_or(MxOutcome::NoExchanger, |host| {
            MxOutcome::Exchanger(Exchanger(host.clone()))
        });
        (outcome, metrics)
    }
}

struct BrokenMx;

impl MxLookup for BrokenMx {
    fn lookup(&self, _domain: &str) -> (MxOutcome, MxMetrics) {
        (
            MxOutcome::LookupFailed("resolver unreachable".into()),
            MxMetrics::default(),
        )
    }
}

struct RejectAll;

impl LocalPartGrammar for RejectAll {
    fn validate(&self, _local_part: &str) -> bool {
        false
    }
}

fn validator(entries: &[(&str, &str)]) -> Validator {
    Validator::with_lookup(Box::new(StaticMx::new(entries)))
}

// --- validate_address ---

#[test]
fn test_validate_address_accepts_known_domain() {
    let v = validator(&[("smith.com", "mx.smith.com")]);
    let addr = v.validate_address("john@smith.com").unwrap();
    assert_eq!(addr.local_part(), "john");
    assert_eq!(addr.address(), "john@smith.com");
}

#[test]
fn test_validate_address_rejects_unknown_domain() {
    let v = validator(&[]);
    assert!(v.validate_address("user@nonexistent-domain-xyz.invalid").is_none());
}

#[test]
fn test_validate_address_rejects_on_lookup_failure() {
    let v = Validator::with_lookup(Box::new(BrokenMx));
    assert!(v.validate_address("john@smith.com").is_none());
}

#[test]
fn test_validate_address_rejects_non_address_shape() {
    let v = validator(&[("smith.com", "mx.smith.com")]);
    assert!(v.validate_address("no-at-sign").is_none());
    assert!(v.validate_address("").is_none());
}

#[test]
fn test_validate_address_preparses_sloppy_input() {
    let v = validator(&[("smith.com", "mx.smith.com")]);
    // angle brackets, whitespace and the trailing domain dot are cleaned up
    let addr = v.validate_address("  <John@Smith.COM.>  ").unwrap();
    assert_eq!(addr.address(), "John@smith.com");
}

#[test]
fn test_validate_address_skips_dns_for_domain_literals() {
    let v = validator(&[]);
    let addr = v.validate_address("user@[127.0.0.1]").unwrap();
    assert!(addr.contains_domain_literal());
}

#[test]
fn test_validate_address_rejects_bad_grammar_after_preparse() {
    let v = validator(&[("smith.com", "mx.smith.com")]);
    assert!(v.validate_address("a..b@smith.com").is_none());
}

// --- provider grammar plugins ---

#[test]
fn test_gmail_grammar_rules() {
    let v = validator(&[("gmail.com", "aspmx.l.google.com")]);
    assert!(v.validate_address("user.1234@gmail.com").is_some());
    assert!(v.validate_address("longuser+tag@gmail.com").is_some());
    // too short for gmail's local-part rules
    assert!(v.validate_address("u@gmail.com").is_none());
}

#[test]
fn test_custom_plugin_can_reject() {
    let mut plugins = PluginRegistry::new();
    plugins.register(
        regex::Regex::new(r"^mx\.picky\.example$").unwrap(),
        Box::new(RejectAll),
    );
    let v = Validator::new(
        Box::new(DefaultPreparser),
        Box::new(StaticMx::new(&[("picky.example", "mx.picky.example")])),
        plugins,
    );
    assert!(v.validate_address("anyone@picky.example").is_none());
}

#[test]
fn test_missing_plugin_accepts() {
    let v = validator(&[("plain.example", "mx.plain.example")]);
    assert!(v.validate_address("anyone@plain.example").is_some());
}

// --- validate_list ---

#[test]
fn test_validate_list_partitions_by_mx() {
    let v = validator(&[("known.com", "mx.known.com")]);
    let (accepted, rejected) = v.validate_list(vec!["a@known.com", "c@unknown.com"]);
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].full_spec(), "a@known.com");
    // rejects are keyed by canonical full-spec text
    assert_eq!(rejected, vec!["c@unknown.com"]);
}

#[test]
fn test_validate_list_repair_pass_recovers_items() {
    let v = validator(&[("known.com", "mx.known.com")]);
    let items = vec!["a@known.com", "bogus", "b@known.com."];
    let total = items.len();
    let (accepted, rejected) = v.validate_list(items);

    // "b@known.com." fails the batch grammar but the repair pass preparses
    // the trailing dot away and revalidates it in full
    assert_eq!(accepted.len(), 2);
    assert_eq!(rejected, vec!["bogus"]);
    assert_eq!(accepted.len() + rejected.len(), total);
}

#[test]
fn test_validate_list_rejects_urls() {
    let v = validator(&[("known.com", "mx.known.com")]);
    let (accepted, rejected) = v.validate_list(vec!["a@known.com", "http://localhost/x"]);
    assert_eq!(accepted.len(), 1);
    assert_eq!(rejected, vec!["http://localhost/x"]);
}

#[test]
fn test_validate_list_plugin_rejections() {
    let v = validator(&[("gmail.com", "aspmx.l.google.com")]);
    let (accepted, rejected) = v.validate_list(vec!["user.1234@gmail.com", "u@gmail.com"]);
    assert_eq!(accepted.len(), 1);
    assert_eq!(rejected, vec!["u@gmail.com"]);
}

#[test]
fn test_validate_list_string_input() {
    let v = validator(&[("known.com", "mx.known.com")]);
    let (accepted, rejected) = v.validate_list("a@known.com, b@known.com");
    assert_eq!(accepted.len(), 2);
    assert!(rejected.is_empty());
}

#[test]
fn test_validate_list_empty_input() {
    let v = validator(&[]);
    let (accepted, rejected) = v.validate_list("");
    assert!(accepted.is_empty());
    assert!(rejected.is_empty());
}

// --- metrics ---

#[test]
fn test_validate_metrics_cover_all_stages() {
    let v = validator(&[("known.com", "mx.known.com")]);
    let (addr, metrics) = v.validate_address_with_metrics("john@known.com");
    assert!(addr.is_some());
    assert_eq!(metrics.mx_lookup, Duration::from_millis(5));
    assert_eq!(metrics.dns_lookup, Duration::from_millis(3));
    assert_eq!(metrics.mx_conn, Duration::from_millis(1));
}

#[test]
fn test_validate_metrics_returned_on_failure() {
    let v = validator(&[]);
    let (addr, metrics) = v.validate_address_with_metrics("john@unknown.com");
    assert!(addr.is_none());
    assert_eq!(metrics.mx_lookup, Duration::from_millis(5));
}

#[test]
fn test_validate_list_accumulates_mx_metrics() {
    let v = validator(&[("known.com", "mx.known.com")]);
    let (accepted, _rejected, metrics) =
        v.validate_list_with_metrics(vec!["a@known.com", "b@known.com"]);
    assert_eq!(accepted.len(), 2);
    assert_eq!(metrics.mx_lookup, Duration::from_millis(10));
    assert_eq!(metrics.dns_lookup, Duration::from_millis(6));
    assert_eq!(metrics.mx_conn, Duration::from_millis(2));
}
