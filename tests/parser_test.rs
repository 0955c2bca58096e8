use address_extract::*;

// --- parse ---

#[test]
fn test_parse_full_mailbox() {
    let addr = parse("John Smith <john@smith.com>", false).unwrap();
    let Address::Email(email) = addr else {
        panic!("expected an email address");
    };
    assert_eq!(email.display_name(), "John Smith");
    assert_eq!(email.local_part(), "john");
    assert_eq!(email.domain(), "smith.com");
}

#[test]
fn test_parse_addr_spec_only() {
    let addr = parse("john@smith.com", true).unwrap();
    assert_eq!(addr.full_spec(), "john@smith.com");
}

#[test]
fn test_parse_addr_spec_only_rejects_mailbox() {
    assert!(parse("John <john@smith.com>", true).is_none());
}

#[test]
fn test_parse_url() {
    let addr = parse("http://host.com/post?q", false).unwrap();
    assert_eq!(addr.addr_type(), AddrType::Url);
    assert_eq!(addr.full_spec(), "http://host.com/post?q");
}

#[test]
fn test_parse_angle_addr_without_name() {
    let addr = parse("<bob@test.io>", false).unwrap();
    let Address::Email(email) = addr else {
        panic!("expected an email address");
    };
    assert_eq!(email.display_name(), "");
    assert_eq!(email.address(), "bob@test.io");
}

#[test]
fn test_parse_quoted_display_name() {
    let addr = parse("\"Jane Q. Smith\" <jane@mail.com>", false).unwrap();
    let Address::Email(email) = addr else {
        panic!("expected an email address");
    };
    assert_eq!(email.display_name(), "Jane Q. Smith");
}

#[test]
fn test_parse_quoted_local_part() {
    let addr = parse("\"john smith\"@example.com", true).unwrap();
    assert_eq!(addr.full_spec(), "\"john smith\"@example.com");
}

#[test]
fn test_parse_domain_literal() {
    let addr = parse("user@[127.0.0.1]", true).unwrap();
    let Address::Email(email) = addr else {
        panic!("expected an email address");
    };
    assert!(email.contains_domain_literal());
}

#[test]
fn test_parse_unicode_mailbox() {
    let addr = parse("Жека <ev@почта.рф>", false).unwrap();
    let Address::Email(email) = addr else {
        panic!("expected an email address");
    };
    assert_eq!(email.display_name(), "Жека");
    assert_eq!(email.domain(), "почта.рф");
}

#[test]
fn test_parse_garbage_returns_none() {
    assert!(parse("foo", false).is_none());
    assert!(parse("@missing-local.com", false).is_none());
    assert!(parse("missing-domain@", false).is_none());
    assert!(parse("a..b@host.com", true).is_none());
}

#[test]
fn test_parse_empty_returns_none() {
    assert!(parse("", false).is_none());
}

#[test]
fn test_parse_bare_colon_returns_none() {
    // a colon outside a URL has no grammar to land in
    assert!(parse("a:b", false).is_none());
    assert!(parse(":", false).is_none());
    assert!(parse("mailto:", false).is_none());
}

#[test]
fn test_parse_colon_in_display_name_returns_none() {
    assert!(parse("Meeting at 12:30 <a@b.com>", false).is_none());
}

#[test]
fn test_parse_length_ceiling() {
    let at_limit = format!("{}@b.co", "a".repeat(MAX_ADDRESS_LENGTH - 5));
    assert_eq!(at_limit.len(), MAX_ADDRESS_LENGTH);
    assert!(parse(&at_limit, true).is_some());

    let over_limit = format!("{}@b.co", "a".repeat(MAX_ADDRESS_LENGTH - 4));
    assert_eq!(over_limit.len(), MAX_ADDRESS_LENGTH + 1);
    assert!(parse(&over_limit, true).is_none());
}

// --- try_parse ---

#[test]
fn test_try_parse_reports_reason() {
    assert!(matches!(try_parse("", false), Err(ParseError::Empty)));
    assert!(matches!(
        try_parse(&"a".repeat(1025), false),
        Err(ParseError::TooLong { length: 1025, .. })
    ));
    assert!(matches!(try_parse("foo", false), Err(ParseError::Syntax(_))));
    assert!(matches!(
        try_parse("\"unterminated@host.com", false),
        Err(ParseError::Lexical(_))
    ));
    assert!(matches!(
        try_parse("a:b", false),
        Err(ParseError::Lexical(_))
    ));
}

// --- round trips ---

#[test]
fn test_full_spec_round_trip_normalizes_domain_case() {
    let addr = parse("john@SMITH.com", true).unwrap();
    assert_eq!(addr.full_spec(), "john@smith.com");
}

#[test]
fn test_reparsing_full_spec_is_idempotent() {
    for raw in [
        "John Smith <john@Smith.COM>",
        "\"Smith, John\" <john@smith.com>",
        "bob@host.com",
    ] {
        let first = parse(raw, false).unwrap();
        let second = parse(&first.full_spec(), false).unwrap();
        assert_eq!(first, second, "round trip changed {raw}");
    }
}

// --- parse_discrete_list ---

#[test]
fn test_discrete_list_all_valid() {
    let list = parse_discrete_list("A <a@b>, C <d@e>").unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.full_spec(), "A <a@b>, C <d@e>");
}

#[test]
fn test_discrete_list_is_all_or_nothing() {
    assert!(parse_discrete_list("A <a@b>, C, D <d@e>").is_none());
}

#[test]
fn test_discrete_list_mixed_with_urls() {
    let list = parse_discrete_list("A <a@b>, D <d@e>, http://localhost").unwrap();
    assert_eq!(list.len(), 3);
    assert!(list.addr_types().contains(&AddrType::Url));
}

#[test]
fn test_discrete_list_semicolon_delimiter() {
    let list = parse_discrete_list("a@b; d@e").unwrap();
    assert_eq!(list.len(), 2);
}

// --- parse_list ---

#[test]
fn test_parse_list_sequence_partitions_items() {
    let (parsed, unparsed) = parse_list(vec!["A <a@b>", "C", "D <d@e>"]);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].full_spec(), "A <a@b>");
    assert_eq!(parsed[1].full_spec(), "D <d@e>");
    assert_eq!(unparsed, vec!["C"]);
}

#[test]
fn test_parse_list_partition_completeness() {
    let items = vec!["a@b.com", "nope", "c@d.org", "also bad", "http://x.io"];
    let total = items.len();
    let (parsed, unparsed) = parse_list(items);
    assert_eq!(parsed.len() + unparsed.len(), total);
}

#[test]
fn test_parse_list_accepts_pretyped_addresses() {
    let typed = parse("a@b.com", false).unwrap();
    let items = vec![ListItem::from(typed), ListItem::from("broken")];
    let (parsed, unparsed) = parse_list(items);
    assert_eq!(parsed.len(), 1);
    assert_eq!(unparsed, vec!["broken"]);
}

#[test]
fn test_parse_list_string_input_success() {
    let (parsed, unparsed) = parse_list("A <a@b>, D <d@e>");
    assert_eq!(parsed.len(), 2);
    assert!(unparsed.is_empty());
}

#[test]
fn test_parse_list_string_input_is_all_or_nothing() {
    let (parsed, unparsed) = parse_list("A <a@b>, C, D <d@e>");
    assert!(parsed.is_empty());
    assert_eq!(unparsed, vec!["A <a@b>, C, D <d@e>"]);
}

#[test]
fn test_parse_list_empty_string() {
    let (parsed, unparsed) = parse_list("");
    assert!(parsed.is_empty());
    assert!(unparsed.is_empty());
}

#[test]
fn test_parse_list_string_length_ceiling() {
    let oversized = "a".repeat(MAX_ADDRESS_LIST_LENGTH + 1);
    let (parsed, unparsed) = parse_list(oversized.as_str());
    assert!(parsed.is_empty());
    assert_eq!(unparsed, vec![oversized]);
}

#[test]
fn test_parse_list_item_count_ceiling() {
    let items: Vec<String> = (0..=MAX_ADDRESS_NUMBER)
        .map(|i| format!("user{i}@host.com"))
        .collect();
    let (parsed, unparsed) = parse_list(items);
    assert!(parsed.is_empty());
    assert_eq!(unparsed.len(), MAX_ADDRESS_NUMBER + 1);
}

// --- metrics ---

#[test]
fn test_parse_metrics_only_time_parsing() {
    let (addr, metrics) = parse_with_metrics("john@smith.com", true);
    assert!(addr.is_some());
    assert_eq!(metrics.mx_lookup, std::time::Duration::ZERO);
    assert_eq!(metrics.custom_grammar, std::time::Duration::ZERO);
}

#[test]
fn test_parse_list_metrics_returned_on_failure() {
    let (parsed, _unparsed, metrics) = parse_list_with_metrics("A <a@b>, C");
    assert!(parsed.is_empty());
    assert_eq!(metrics.mx_lookup, std::time::Duration::ZERO);
}

// --- is_email ---

#[test]
fn test_is_email() {
    assert!(is_email("john@smith.com"));
    assert!(!is_email("John <john@smith.com>"));
    assert!(!is_email("foo"));
    assert!(!is_email(""));
}
