//! Factory and override tests

use sample_factory_core::{Factory, FactoryError, Overrides, Spec};
use serde_json::{Value, json};

fn user_spec() -> Spec {
    Spec::from_value(&json!({
        "metadata": {"samplesAnalyzed": 50, "dataPoints": 400, "unclassifiable": 0},
        "root": {"shape": "object", "fields": {
            "display_name": {"shape": "value", "hint": {"type": "TEXT", "minLen": 4, "maxLen": 12}},
            "role": {"shape": "value", "hint": {
                "type": "CHOICE",
                "choices": ["user", "guest", "owner"],
                "weights": [0.6, 0.3, 0.1]
            }},
            "nickname": {"shape": "value", "missing": 1.0, "hint": {"type": "CONST", "value": "x"}},
            "items": {
                "shape": "variable",
                "length": {"min": 3, "max": 3, "integer": true},
                "element": {"shape": "object", "fields": {
                    "name": {"shape": "value", "hint": {"type": "TEXT", "minLen": 3, "maxLen": 6}},
                    "qty": {"shape": "value", "hint": {"type": "NUMBER", "min": 1, "max": 5, "integer": true}}
                }}
            }
        }}
    }))
    .unwrap()
}

fn factory(overrides: Overrides) -> Factory {
    Factory::with_seed(user_spec(), 2024, overrides).unwrap()
}

mod precedence_tests {
    use super::*;

    #[test]
    fn test_call_level_beats_constructor_level() {
        let mut factory = factory(Overrides::new().set("role", "user"));
        let record = factory.build(&Overrides::new().set("role", "admin")).unwrap();
        assert_eq!(record["role"], "admin");

        let record = factory.next_record().unwrap();
        assert_eq!(record["role"], "user");
    }

    #[test]
    fn test_literal_replaces_subtree() {
        let mut factory = factory(Overrides::new());
        let record = factory.build(&Overrides::new().set("items", json!([]))).unwrap();
        assert_eq!(record["items"], json!([]));
    }
}

mod array_override_tests {
    use super::*;

    #[test]
    fn test_wildcard_reaches_every_element() {
        let mut factory = factory(Overrides::new());
        let record = factory.build(&Overrides::new().set("items__name", "X")).unwrap();
        let items = record["items"].as_array().unwrap();

        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item["name"] == "X"));
    }

    #[test]
    fn test_index_reaches_one_element() {
        let mut factory = factory(Overrides::new());
        let record = factory.build(&Overrides::new().set("items__1__name", "X")).unwrap();
        let items = record["items"].as_array().unwrap();

        assert_eq!(items[1]["name"], "X");
        assert_ne!(items[0]["name"], "X");
        assert_ne!(items[2]["name"], "X");
    }

    #[test]
    fn test_call_override_reaches_into_constructor_literal() {
        let mut factory = factory(
            Overrides::new().set("items", json!([{"name": "a", "qty": 1}, {"name": "b", "qty": 2}])),
        );
        let record = factory.build(&Overrides::new().set("items__name", "X")).unwrap();
        assert_eq!(
            record["items"],
            json!([{"name": "X", "qty": 1}, {"name": "X", "qty": 2}])
        );

        let record = factory.build(&Overrides::new().set("items__1__name", "Y")).unwrap();
        assert_eq!(
            record["items"],
            json!([{"name": "a", "qty": 1}, {"name": "Y", "qty": 2}])
        );
    }

    #[test]
    fn test_constructor_override_leaves_call_literal_alone() {
        let mut factory = factory(Overrides::new().set("items__name", "X"));
        let record = factory.build(&Overrides::new().set("items", json!([{"name": "a"}]))).unwrap();
        assert_eq!(record["items"], json!([{"name": "a"}]));
    }

    #[test]
    fn test_callables_apply_inside_literal() {
        let mut factory = factory(Overrides::new());
        let overrides = Overrides::new()
            .set("items", json!([{"name": "a", "qty": 3}]))
            .transform("items__qty", |value: Value| value.as_i64().unwrap_or(0) * 10)
            .with_context("items__name", |_, record: &Value| record["role"].clone());
        let record = factory.build(&overrides).unwrap();

        assert_eq!(record["items"][0]["qty"], 30);
        assert_eq!(record["items"][0]["name"], record["role"]);
    }

    #[test]
    fn test_indexed_beats_wildcard() {
        let mut factory = factory(Overrides::new());
        let overrides = Overrides::new()
            .set("items__1__qty", 99)
            .set("items__qty", 0);
        let record = factory.build(&overrides).unwrap();

        assert_eq!(record["items"][0]["qty"], 0);
        assert_eq!(record["items"][1]["qty"], 99);
        assert_eq!(record["items"][2]["qty"], 0);
    }
}

mod context_tests {
    use super::*;

    #[test]
    fn test_context_sees_overridden_sibling() {
        let mut factory = factory(Overrides::new());
        let overrides = Overrides::new().set("role", "admin").with_context(
            "display_name",
            |value: Value, record: &Value| {
                format!("{} ({})", value.as_str().unwrap_or(""), record["role"].as_str().unwrap_or("?"))
            },
        );
        let record = factory.build(&overrides).unwrap();
        assert!(record["display_name"].as_str().unwrap().ends_with(" (admin)"));
    }

    #[test]
    fn test_context_sees_generated_sibling() {
        let mut factory = factory(Overrides::new());
        let overrides = Overrides::new().with_context("display_name", |_, record: &Value| {
            record["role"].clone()
        });
        for record in factory.build_batch(20, &overrides).unwrap() {
            assert!(record["role"].is_string());
            assert_eq!(record["display_name"], record["role"]);
        }
    }

    #[test]
    fn test_context_errors_propagate() {
        let mut factory = factory(Overrides::new());
        let overrides = Overrides::new().try_with_context("role", |_, _| {
            Err::<Value, _>(std::io::Error::other("lookup failed"))
        });
        match factory.build(&overrides) {
            Err(FactoryError::Override { path, .. }) => assert_eq!(path, "role"),
            other => panic!("Expected override error, got {:?}", other),
        }
    }
}

mod override_path_tests {
    use super::*;

    #[test]
    fn test_unknown_path_rejected() {
        let mut factory = factory(Overrides::new());
        let result = factory.build(&Overrides::new().set("nonexistent_field__x", "y"));
        match result {
            Err(FactoryError::OverridePath { key, .. }) => assert_eq!(key, "nonexistent_field__x"),
            other => panic!("Expected override path error, got {:?}", other),
        }
    }

    #[test]
    fn test_override_on_omitted_field_is_not_an_error() {
        let mut factory = factory(Overrides::new());
        let record = factory.build(&Overrides::new().set("nickname", "n")).unwrap();
        assert!(record.get("nickname").is_none());
    }
}

mod determinism_tests {
    use super::*;

    #[test]
    fn test_same_seed_same_records() {
        let mut a = factory(Overrides::new());
        let mut b = factory(Overrides::new());
        assert_eq!(
            a.build_batch(10, &Overrides::new()).unwrap(),
            b.build_batch(10, &Overrides::new()).unwrap()
        );
    }

    #[test]
    fn test_records_vary_across_calls() {
        let mut factory = factory(Overrides::new());
        let records = factory.build_batch(10, &Overrides::new()).unwrap();
        assert!(records.iter().any(|r| *r != records[0]));
    }
}
