use redux_document::{parse, Value};
use redux_ui::fields::{self, WidgetKind};

const CONFIG: &str = include_str!("../../redux-document/tests/fixtures/config.json5");

#[test]
fn every_field_resolves_in_the_shipped_config() {
    let document = parse(CONFIG).expect("fixture parses");
    for section in fields::sections() {
        assert!(document.contains(&section.path()), "missing section {}", section.key);
        for field in section.fields {
            let path = section.field_path(field);
            let value = document
                .get(&path)
                .unwrap_or_else(|| panic!("missing field {}", path));
            match field.widget {
                WidgetKind::Toggle => assert!(value.as_bool().is_some(), "{} is not a toggle", path),
                WidgetKind::Number => assert!(
                    value.as_f64().is_some() || (field.nullable && value == Value::Null),
                    "{} is not a number",
                    path
                ),
            }
        }
    }
}

#[test]
fn bounds_are_consistent() {
    for section in fields::sections() {
        for field in section.fields {
            match (field.widget, field.bounds) {
                (WidgetKind::Number, Some(bounds)) => {
                    assert!(bounds.min >= 0.0 && bounds.min < bounds.max, "{}", field.key);
                    assert!(bounds.step > 0.0, "{}", field.key);
                }
                (WidgetKind::Toggle, None) => {}
                other => panic!("{} has mismatched bounds {:?}", field.key, other),
            }
        }
    }
}
