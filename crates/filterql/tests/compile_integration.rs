//! Integration tests for filter compilation through the public API.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, TimeZone, Timelike, Utc};
use filterql_rs::filter::{FilterCompiler, FilterErrorKind, MAX_NESTING_DEPTH};
use filterql_rs::resolver::{from_fn, FieldResolverExt, PatternResolver, StaticResolver};
use filterql_rs::{
    compile, BoundValue, FieldResolver, Replacements, ResolvedField, SimpleResolver,
    UnknownFieldError, Value,
};

fn replacement_scenario() -> Replacements {
    let date = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();

    let mut replacements = Replacements::new();
    replacements.insert("test1".to_string(), Value::from(true));
    replacements.insert("test2".to_string(), Value::from(false));
    replacements.insert("test3".to_string(), Value::from(123.456));
    replacements.insert("test4".to_string(), Value::Null);
    replacements.insert("test5".to_string(), Value::from(""));
    replacements.insert("test6".to_string(), Value::from("simple"));
    replacements.insert("test7".to_string(), Value::from("'single_quotes'"));
    replacements.insert("test8".to_string(), Value::from("\"double_quotes\""));
    replacements.insert("test9".to_string(), Value::from(r#"escape\"quote"#));
    replacements.insert("test10".to_string(), Value::from(date));
    replacements.insert("test11".to_string(), Value::from(vec!["a", "b", "\"quote"]));
    replacements.insert(
        "test12".to_string(),
        Value::object([("a", Value::from(123)), ("b", Value::from("quote\""))]),
    );
    replacements
}

const REPLACEMENT_FILTER: &str = "
    test1 = {:test1} ||
    test2 = {:test2} ||
    test3a = {:test3} ||
    test3b = {:test3} ||
    test4 = {:test4} ||
    test5 = {:test5} ||
    test6 = {:test6} ||
    test7 = {:test7} ||
    test8 = {:test8} ||
    test9 = {:test9} ||
    test10 = {:test10} ||
    test11 = {:test11} ||
    test12 = {:test12}
";

#[test]
fn test_named_replacements_produce_one_statement() {
    let resolver = PatternResolver::new([r"^test\w+$"]).unwrap();
    let replacements = replacement_scenario();

    let compiled = compile(REPLACEMENT_FILTER, &replacements, &resolver).unwrap();

    assert_eq!(
        compiled.sql,
        "([[test1]] = 1 OR [[test2]] = 0 OR [[test3a]] = {:test3} OR [[test3b]] = {:test3} \
         OR ([[test4]] = '' OR [[test4]] IS NULL) OR [[test5]] = {:test5} OR [[test6]] = {:test6} \
         OR [[test7]] = {:test7} OR [[test8]] = {:test8} OR [[test9]] = {:test9} \
         OR [[test10]] = {:test10} OR [[test11]] = {:test11} OR [[test12]] = {:test12})"
    );

    let params = &compiled.params;
    assert_eq!(params.len(), 9);
    assert_eq!(params["test3"], BoundValue::Real(123.456));
    assert_eq!(params["test5"], BoundValue::Text(String::new()));
    assert_eq!(params["test7"], BoundValue::Text("'single_quotes'".to_string()));
    assert_eq!(
        params["test10"],
        BoundValue::Text("2023-01-01 00:00:00 +0000 UTC".to_string())
    );
    assert_eq!(
        params["test11"],
        BoundValue::Text(r#"["a","b","\"quote"]"#.to_string())
    );
    assert_eq!(
        params["test12"],
        BoundValue::Text(r#"{"a":123,"b":"quote\""}"#.to_string())
    );
}

#[test]
fn test_named_replacements_render_inline() {
    let resolver = PatternResolver::new([r"^test\w+$"]).unwrap();
    let compiled = compile(REPLACEMENT_FILTER, &replacement_scenario(), &resolver).unwrap();

    assert_eq!(
        compiled.render_inline(),
        r#"([[test1]] = 1 OR [[test2]] = 0 OR [[test3a]] = 123.456 OR [[test3b]] = 123.456 OR ([[test4]] = '' OR [[test4]] IS NULL) OR [[test5]] = '' OR [[test6]] = 'simple' OR [[test7]] = '''single_quotes''' OR [[test8]] = '"double_quotes"' OR [[test9]] = 'escape\"quote' OR [[test10]] = '2023-01-01 00:00:00 +0000 UTC' OR [[test11]] = '["a","b","\"quote"]' OR [[test12]] = '{"a":123,"b":"quote\""}')"#
    );
}

#[test]
fn test_idempotent_compilation() {
    let resolver = SimpleResolver::new(["title", r"^meta\.\w+$"]).unwrap();
    let replacements = replacement_scenario();
    let filter = "title ~ 'rust' && (meta.views > 10 || meta.flag = {:test1})";

    let first = compile(filter, &replacements, &resolver).unwrap();
    let second = compile(filter, &replacements, &resolver).unwrap();

    assert_eq!(first.sql, second.sql);
    assert_eq!(first.params, second.params);
}

#[test]
fn test_concurrent_compilation_with_shared_resolver() {
    let resolver: Arc<dyn FieldResolver> = Arc::new(StaticResolver::new(["votes", "title"]));
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let resolver = Arc::clone(&resolver);
            thread::spawn(move || {
                let filter = format!("votes > {i} && title != ''");
                FilterCompiler::new(resolver.as_ref())
                    .now(now)
                    .compile(&filter)
                    .map(|compiled| (i, compiled))
            })
        })
        .collect();

    for handle in handles {
        let (i, compiled) = handle.join().unwrap().unwrap();
        assert_eq!(
            compiled.sql,
            "([[votes]] > {:p0} AND ([[title]] != '' AND [[title]] IS NOT NULL))"
        );
        assert_eq!(compiled.params["p0"], BoundValue::Integer(i));
    }
}

#[test]
fn test_error_kinds() {
    let resolver = StaticResolver::new(["test1"]);
    let empty = Replacements::new();

    let cases = [
        ("", FilterErrorKind::Syntax),
        ("   ", FilterErrorKind::Syntax),
        ("(test1 > 1", FilterErrorKind::Syntax),
        ("test1 + 123", FilterErrorKind::UnsupportedOperator),
        ("test1 = 'example' && unknown > 1", FilterErrorKind::UnknownField),
        ("test1 = {:nope}", FilterErrorKind::Syntax),
    ];

    for (filter, kind) in cases {
        let err = compile(filter, &empty, &resolver).unwrap_err();
        assert_eq!(err.kind(), kind, "filter: {filter:?}, error: {err}");
    }
}

#[test]
fn test_composed_resolvers() {
    let columns = StaticResolver::new(["title"]);
    let aliases = from_fn(|path: &str| match path {
        "author" => Ok(ResolvedField::new("users.name")),
        "tags" => Ok(ResolvedField::multi_valued("post_tags.tag")),
        _ => Err(UnknownFieldError::new(path)),
    });
    let resolver = columns.or(aliases);

    let compiled = compile(
        "title ~ 'x' && author = 'ann' && tags = 'rust'",
        &Replacements::new(),
        &resolver,
    )
    .unwrap();

    assert_eq!(
        compiled.sql,
        r"([[title]] LIKE {:p0} ESCAPE '\' AND [[users.name]] = {:p1} AND [[post_tags.tag]] = {:p2})"
    );
    assert!(compiled.has_multi_valued_fields());

    let err = compile("titl = 'x'", &Replacements::new(), &resolver).unwrap_err();
    assert_eq!(err.to_string(), "unknown field 'titl'. Did you mean 'title'?");
}

#[test]
fn test_bound_params_read_back_to_caller_values() {
    let now = Utc
        .with_ymd_and_hms(2024, 7, 4, 8, 15, 0)
        .unwrap()
        .with_nanosecond(500_000_000)
        .unwrap();
    let tags = Value::from(vec!["rust", "sql"]);
    let meta = Value::object([("lang", Value::from("en")), ("draft", Value::from(false))]);

    let mut replacements = Replacements::new();
    replacements.insert("tags".to_string(), tags.clone());
    replacements.insert("meta".to_string(), meta.clone());

    let resolver = StaticResolver::new(["tags", "meta", "due", "votes", "ratio", "title"]);
    let compiled = FilterCompiler::new(&resolver)
        .replacements(&replacements)
        .now(now)
        .compile(
            "tags = {:tags} && meta != {:meta} && due < @todayEnd \
             && votes > 7 && ratio >= 2.5 && title = 'x'",
        )
        .unwrap();

    let json_param = |name: &str| match &compiled.params[name] {
        BoundValue::Text(text) => Value::from(serde_json::from_str::<serde_json::Value>(text).unwrap()),
        other => panic!("expected JSON text for {name}, got {other:?}"),
    };
    assert_eq!(json_param("tags"), tags);
    assert_eq!(json_param("meta"), meta);

    let due = match &compiled.params["p0"] {
        BoundValue::Text(text) => DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f %z UTC")
            .unwrap()
            .with_timezone(&Utc),
        other => panic!("expected timestamp text, got {other:?}"),
    };
    let today_end = Utc
        .with_ymd_and_hms(2024, 7, 4, 23, 59, 59)
        .unwrap()
        .with_nanosecond(999_999_999)
        .unwrap();
    assert_eq!(due, today_end);

    assert_eq!(compiled.params["p1"], BoundValue::Integer(7));
    assert_eq!(compiled.params["p2"], BoundValue::Real(2.5));
    assert_eq!(compiled.params["p3"], BoundValue::Text("x".to_string()));
}

#[test]
fn test_oversized_inputs_return_results() {
    let resolver = StaticResolver::new(["a"]);

    let nested = format!("{}a = 1{}", "(".repeat(10_000), ")".repeat(10_000));
    let err = compile(&nested, &Replacements::new(), &resolver).unwrap_err();
    assert_eq!(err.kind(), FilterErrorKind::Syntax);

    let at_limit = format!(
        "{}a = 1{}",
        "(".repeat(MAX_NESTING_DEPTH),
        ")".repeat(MAX_NESTING_DEPTH)
    );
    let compiled = compile(&at_limit, &Replacements::new(), &resolver).unwrap();
    assert_eq!(compiled.sql, "[[a]] = {:p0}");

    let chain = vec!["a = 1"; 100_000].join(" && ");
    let compiled = compile(&chain, &Replacements::new(), &resolver).unwrap();
    assert_eq!(compiled.params.len(), 100_000);
}
