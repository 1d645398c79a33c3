//! Integration tests for tagq
//!
//! These tests drive the public API end to end: configuration and alias
//! files in temporary directories, resolvers built from them, and queries
//! compiled through the parser.

use std::fs;
use std::path::Path;
use std::time::Duration;
use tagq::query::{GroupEntry, QueryError, RangeValue, Value};
use tagq::resolve::{AliasTable, CachedLookup, NoAliases, NoRecords, ReferenceIndex};
use tagq::scan::{self, ScanItem, ScanOptions};
use tagq::{QueryConfig, QueryParser, TagqConfig};
use tempfile::TempDir;

const REFERENCE: &str = r#"
[actor]
id = 10

[users]
alice = { id = 10 }
bob = { id = 11, private_favorites = true }

[pools]
beach_trip = 4

[sets]
hidden = { id = 2, owner = 11, public = false }

[tags]
cat = 500
cat_ears = 80
dog = 300
"#;

/// Helper function to write the reference file into a temp dir
fn write_reference(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("reference.toml");
    fs::write(&path, REFERENCE).unwrap();
    path
}

fn parse_plain(query: &str) -> Result<tagq::Query, QueryError> {
    let resolver = (NoAliases, NoRecords);
    QueryParser::new(QueryConfig::default(), &resolver)?.parse(query)
}

#[test]
fn test_scan_scenarios() {
    assert_eq!(scan::scan("aaa bbb"), vec!["aaa", "bbb"]);
    assert_eq!(scan::scan("~AAa -BBB* -bbb*"), vec!["~AAa", "-BBB*", "-bbb*"]);
}

#[test]
fn test_scan_search_unwraps_only_unprefixed_groups() {
    assert_eq!(scan::scan_search("( aaa bbb )").unwrap(), vec!["aaa", "bbb"]);
    assert_eq!(scan::scan_search("-( aaa bbb )").unwrap(), vec!["-( aaa bbb )"]);
}

#[test]
fn test_scan_search_idempotent() {
    let queries = [
        "a ( b order:score ( c randseed:5 ) ) limit:3",
        "( ( x -order:id ) )",
        "-( a ~( b limit:2 ) ) d",
        "plain tags only",
    ];
    for query in queries {
        let once = scan::scan_search(query).unwrap().join(" ");
        let twice = scan::scan_search(&once).unwrap().join(" ");
        assert_eq!(once, twice, "hoisting '{query}' is not idempotent");
    }
}

#[test]
fn test_recursive_scan_dedup() {
    let options = ScanOptions {
        strip_duplicates_at_level: true,
        strip_prefixes: false,
        ..ScanOptions::default()
    };
    let items = scan::scan_recursive("aaa aaa aaa -bbb", &options).unwrap();
    assert_eq!(items, vec![ScanItem::from("aaa"), ScanItem::from("-bbb")]);
}

#[test]
fn test_delimited_scan_round_trips() {
    let query = "a -( b ~( c d ) ) e";
    let items = scan::scan_recursive(query, &ScanOptions::default()).unwrap();
    let rejoined = ScanItem::flatten_all(&items).join(" ");
    let again = scan::scan_recursive(&rejoined, &ScanOptions::default()).unwrap();
    assert_eq!(items, again);
}

#[test]
fn test_id_ranges() {
    let query = parse_plain("id:1..2").unwrap();
    assert_eq!(
        query.get("post_id").unwrap().values(),
        &[Value::IntRange(RangeValue::Between(1, 2))]
    );

    let query = parse_plain("id:>2").unwrap();
    assert_eq!(query.get("post_id").unwrap().values(), &[Value::IntRange(RangeValue::Gt(2))]);
}

#[test]
fn test_count_limit() {
    let forty: Vec<String> = (0..40).map(|i| format!("tag{i}")).collect();
    assert!(parse_plain(&forty.join(" ")).is_ok());

    let forty_one: Vec<String> = (0..41).map(|i| format!("tag{i}")).collect();
    let err = parse_plain(&forty_one.join(" ")).unwrap_err();
    assert!(matches!(err, QueryError::CountExceeded { max: 40 }));
}

#[test]
fn test_depth_limit() {
    let nest = |n: usize| {
        let mut query = "inner".to_string();
        for _ in 0..n {
            query = format!("( {query} )");
        }
        format!("outer {query}")
    };
    assert!(parse_plain(&nest(10)).is_ok());
    assert!(parse_plain(&nest(11)).unwrap_err().is_depth_exceeded());
}

#[test]
fn test_config_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    let mut config = TagqConfig::default();
    config.query.max_tags = 8;
    config.query.process_groups = true;
    config.aliases_file = Some(temp_dir.path().join("aliases.toml"));
    config.save_to(&path).unwrap();

    let loaded = TagqConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.aliases_path().unwrap(), temp_dir.path().join("aliases.toml"));
}

#[test]
fn test_alias_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("aliases.toml");

    let mut aliases = AliasTable::load(&path).unwrap();
    aliases.add_alias("Kitty", "cat").unwrap();
    aliases.add_alias("feline", "kitty").unwrap();
    aliases.save().unwrap();

    let reloaded = AliasTable::load(&path).unwrap();
    assert_eq!(reloaded.canonicalize("feline"), "cat");
    assert!(reloaded.clone().add_alias("cat", "feline").is_err());

    let resolver = (reloaded, NoRecords);
    let parser = QueryParser::new(QueryConfig::default(), &resolver).unwrap();
    let query = parser.parse("feline -kitty cat").unwrap();
    assert_eq!(query.tags.must, vec!["cat"]);
    assert_eq!(query.tags.must_not, vec!["cat"]);
}

#[test]
fn test_reference_file_lookups() {
    let temp_dir = TempDir::new().unwrap();
    let records = ReferenceIndex::load(&write_reference(temp_dir.path())).unwrap();
    let resolver = (
        NoAliases,
        CachedLookup::with_cache_config(records, Duration::from_secs(60), 100),
    );
    let parser = QueryParser::new(QueryConfig::default(), &resolver).unwrap();

    let query = parser.parse("user:alice pool:beach_trip cat* upvote:bob").unwrap();
    assert_eq!(query.get("uploader_ids").unwrap().values(), &[Value::Int(10)]);
    assert_eq!(query.get("pool_ids").unwrap().values(), &[Value::Int(4)]);
    assert_eq!(query.tags.should, vec!["cat", "cat_ears"]);
    assert_eq!(query.get("upvote").unwrap().values(), &[Value::Int(10)]);

    assert!(matches!(parser.parse("set:hidden"), Err(QueryError::PrivilegeDenied { .. })));
    assert!(matches!(parser.parse("fav:bob"), Err(QueryError::PrivilegeDenied { .. })));
}

#[test]
fn test_process_groups_end_to_end() {
    let config = QueryConfig {
        process_groups: true,
        ..QueryConfig::default()
    };
    let resolver = (NoAliases, NoRecords);
    let parser = QueryParser::new(config, &resolver).unwrap();
    let query = parser.parse("a -( b ~( c status:deleted ) ) order:score").unwrap();

    assert_eq!(query.get("order").unwrap().as_text(), Some("score"));
    assert!(!query.hides_deleted(false));

    let GroupEntry::Parsed(negated) = &query.groups.must_not[0] else {
        panic!("expected a parsed group");
    };
    assert_eq!(negated.tags.must, vec!["b"]);
    let optional = negated.groups.should[0].query().unwrap();
    assert_eq!(optional.tags.must, vec!["c"]);
}

#[test]
fn test_hide_deleted_agrees_with_string_predicate() {
    for query in ["cat", "cat status:deleted", "( a -status:active )", "delreason:spam", "status:bogus"] {
        let built = parse_plain(query).unwrap();
        assert_eq!(
            built.hides_deleted(false),
            scan::should_hide_deleted_posts(query, false),
            "disagreement on '{query}'"
        );
    }
}

#[test]
fn test_deterministic_json() {
    let query = "b a ( c order:id ) -x width:>5 date:2024-01-01";
    let resolver = (NoAliases, NoRecords);
    let now = chrono::DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let parser = QueryParser::new(QueryConfig::default(), &resolver)
        .unwrap()
        .with_clock(now);
    let first = serde_json::to_string(&parser.parse(query).unwrap()).unwrap();
    let second = serde_json::to_string(&parser.parse(query).unwrap()).unwrap();
    assert_eq!(first, second);
}
