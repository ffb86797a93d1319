//! Comment preservation across edits of a full config file
use redux_document::{parse, serialize, Document, KeyPath, Value};

const CONFIG: &str = include_str!("fixtures/config.json5");

fn path(s: &str) -> KeyPath {
    KeyPath::from(s)
}

#[test]
fn fixture_round_trips() {
    let doc = parse(CONFIG).expect("fixture parses");
    assert_eq!(serialize(&doc), CONFIG);
}

#[test]
fn crlf_documents_round_trip_and_keep_crlf_on_append() {
    let text = CONFIG.replace('\n', "\r\n");
    let mut doc = Document::parse(&text).expect("crlf parses");
    assert_eq!(doc.to_text(), text);

    doc.set(&path("craftingChanges.newFlag"), &Value::from(true)).expect("set");
    let out = doc.to_text();
    assert!(out.contains("\"additionalCraftingRecipes\": true,\r\n    \"newFlag\": true\r\n  },"));
    assert!(!out.replace("\r\n", "").contains('\n'));
}

#[test]
fn every_leaf_edit_changes_exactly_one_line() {
    let mut doc = parse(CONFIG).expect("parse");
    doc.set(&path("hideoutOptions.fasterBitcoinFarming.gpuEfficiency"), &Value::from(3_i64))
        .expect("set");
    let out = doc.to_text();
    let changed: Vec<_> = CONFIG
        .lines()
        .zip(out.lines())
        .filter(|(a, b)| a != b)
        .collect();
    assert_eq!(
        changed,
        vec![(
            "      \"gpuEfficiency\": 1.5 // GPU efficiency for bitcoin farm",
            "      \"gpuEfficiency\": 3 // GPU efficiency for bitcoin farm"
        )]
    );
    assert_eq!(out.lines().count(), CONFIG.lines().count());
}

#[test]
fn null_replaces_number_in_place() {
    let mut doc = parse(CONFIG).expect("parse");
    let price = path("hideoutOptions.fasterBitcoinFarming.bitcoinPrice");
    doc.set(&price, &Value::Null).expect("set");
    assert_eq!(doc.get(&price), Some(Value::Null));
    assert!(doc.to_text().contains("Set to null to not change price.\n      \"bitcoinPrice\": null,"));
}

#[test]
fn subtree_reset_restores_original_text() {
    let original = parse(CONFIG).expect("parse");
    let mut working = original.clone();
    let section = path("hideoutOptions");

    working
        .set(&path("hideoutOptions.fasterBitcoinFarming.enabled"), &Value::from(false))
        .expect("set");
    working
        .set(&path("hideoutOptions.hideoutContainers.siccCaseBuff"), &Value::from(false))
        .expect("set");
    assert_ne!(working.to_text(), CONFIG);

    let snapshot = original.get(&section).expect("section present");
    working.set(&section, &snapshot).expect("reset section");
    assert_eq!(working.to_text(), CONFIG);
}

#[test]
fn subtree_assign_drops_members_and_keeps_neighbour_comments() {
    let mut doc = parse(CONFIG).expect("parse");
    let containers = path("hideoutOptions.hideoutContainers");
    let replacement = Value::Object(vec![
        ("enabled".to_string(), Value::from(false)),
        ("biggerHideoutContainers".to_string(), Value::from(true)),
    ]);
    doc.set(&containers, &replacement).expect("set");

    let out = doc.to_text();
    assert!(out.contains(
        "\"enabled\": false,\n      /* Medicine case 7x7 -> 10x10, Holodilnick 8x8 -> 10x10 */\n      \"biggerHideoutContainers\": true\n    },"
    ));
    assert!(!out.contains("siccCaseBuff"));
    assert_eq!(doc.get(&containers), Some(replacement));
    parse(&out).expect("result still parses");
}

#[test]
fn arrays_reconcile_element_wise() {
    let mut doc = parse("{\n  \"xs\": [\n    1, // one\n    2,\n    3\n  ]\n}\n").expect("parse");
    doc.set(&path("xs"), &Value::Array(vec![Value::from(1_i64), Value::from(5_i64)]))
        .expect("shrink");
    assert_eq!(doc.to_text(), "{\n  \"xs\": [\n    1, // one\n    5\n  ]\n}\n");

    doc.set(
        &path("xs"),
        &Value::Array(vec![Value::from(1_i64), Value::from(5_i64), Value::from("x")]),
    )
    .expect("grow");
    assert_eq!(doc.to_text(), "{\n  \"xs\": [\n    1, // one\n    5,\n    \"x\"\n  ]\n}\n");
}

#[test]
fn same_line_comment_stays_with_previous_member_on_append() {
    let mut doc = parse("{\n  \"a\": 1 // about a\n}").expect("parse");
    doc.set(&path("b"), &Value::from(2_i64)).expect("set");
    assert_eq!(doc.to_text(), "{\n  \"a\": 1, // about a\n  \"b\": 2\n}");
}

#[test]
fn appending_to_empty_object_opens_it_up() {
    let mut doc = parse("{\n  \"section\": {}\n}").expect("parse");
    doc.set(&path("section.enabled"), &Value::from(true)).expect("set");
    assert_eq!(doc.to_text(), "{\n  \"section\": {\n    \"enabled\": true\n  }\n}");
}

#[test]
fn setting_equal_value_keeps_number_spelling() {
    let mut doc = parse(CONFIG).expect("parse");
    doc.set(
        &path("economyOptions.pacifistFleaMarket.whitelist.priceMultiplier"),
        &Value::from(1_i64),
    )
    .expect("set");
    assert_eq!(doc.to_text(), CONFIG);
}

#[test]
fn trailing_commas_are_accepted_and_kept() {
    let text = "{\n  \"a\": [1, 2,],\n  \"b\": true,\n}\n";
    let mut doc = parse(text).expect("parse");
    assert_eq!(doc.to_text(), text);
    doc.set(&path("b"), &Value::from(false)).expect("set");
    assert_eq!(doc.to_text(), "{\n  \"a\": [1, 2,],\n  \"b\": false,\n}\n");
}

#[test]
fn section_reset_after_added_key_restores_original_text() {
    let original = parse(CONFIG).expect("parse");
    let mut working = original.clone();
    let section = path("hideoutOptions");

    working
        .set(&path("hideoutOptions.fasterBitcoinFarming.extra"), &Value::from(1_i64))
        .expect("append");
    assert!(working
        .to_text()
        .contains("\"gpuEfficiency\": 1.5, // GPU efficiency for bitcoin farm\n      \"extra\": 1\n    },"));

    let snapshot = original.get(&section).expect("section present");
    working.set(&section, &snapshot).expect("reset section");
    assert_eq!(working.to_text(), CONFIG);
}

#[test]
fn dropping_a_member_keeps_the_previous_members_comment() {
    let mut doc = parse(CONFIG).expect("parse");
    let stash = path("stashOptions");
    let mut members = match doc.get(&stash) {
        Some(Value::Object(members)) => members,
        other => panic!("stashOptions is not an object: {:?}", other),
    };
    members.retain(|(name, _)| name != "progressiveStash");
    doc.set(&stash, &Value::Object(members)).expect("set");

    let out = doc.to_text();
    assert!(out.contains(
        "\"biggerStash\": true, // 28/38/48/68 -> 50/100/150/200 lines\n    \"lessCurrencyForConstruction\": true,"
    ));
    assert!(!out.contains("progressiveStash"));
}
