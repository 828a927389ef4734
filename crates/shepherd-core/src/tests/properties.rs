use crate::{
    adapter::EntityAdapter,
    blob::ChangeBlob,
    changes::{apply_changes, extract_changes, reverse_changes},
    state::{apply_state, extract_state},
    test_support::fixtures,
    value::Value,
};
use proptest::prelude::*;

// Change-shaped values: scalars, pairs, and nested groups, with the
// lifecycle markers sprinkled in as ordinary keys.
fn change_value() -> impl Strategy<Value = Value> {
    let scalar = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-z]{0,8}".prop_map(Value::text),
    ];

    scalar.prop_recursive(3, 48, 4, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(before, after)| Value::pair(before, after)),
            proptest::collection::btree_map(change_key(), inner, 0..4).prop_map(Value::Map),
        ]
    })
}

fn change_key() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z_]{1,6}",
        1 => Just("_create".to_string()),
        1 => Just("_destroy".to_string()),
        1 => "[0-9]{1,2}",
    ]
}

proptest! {
    #[test]
    fn reversal_is_involutive(
        map in proptest::collection::btree_map(change_key(), change_value(), 0..5)
    ) {
        let changes = ChangeBlob::from_map(map);
        prop_assert_eq!(reverse_changes(&reverse_changes(&changes)), changes);
    }

    #[test]
    fn state_round_trips_across_fresh_graphs(
        name in "[A-Za-z ]{1,12}",
        lists in proptest::collection::vec(
            proptest::collection::vec("[a-z ]{1,12}", 0..4),
            0..4,
        )
    ) {
        let adapter = fixtures::project_adapter();

        let mut project = adapter.build("project");
        project.set("name", Value::text(name));
        for texts in &lists {
            let list = adapter.build_child(&mut project, "todo_lists");
            for text in texts {
                let todo = adapter.build_child(list, "todos");
                todo.set("text", Value::text(text.clone()));
            }
        }

        let state = extract_state(&adapter, &project).expect("extract");

        let mut fresh = adapter.build("project");
        apply_state(&adapter, &mut fresh, &state).expect("apply");
        prop_assert_eq!(extract_state(&adapter, &fresh).expect("extract"), state);
    }

    #[test]
    fn extracted_diffs_apply_and_revert(
        new_name in "[A-Za-z ]{1,12}",
        new_text in "[a-z ]{1,12}",
    ) {
        let adapter = fixtures::project_adapter();

        let mut edited = fixtures::persisted_project(&adapter);
        edited.set("name", Value::text(new_name));
        edited
            .child_at_mut("todo_lists", 0)
            .child_at_mut("todos", 0)
            .set("text", Value::text(new_text));
        let changes = extract_changes(&adapter, &edited).expect("diff");

        let mut stale = fixtures::persisted_project(&adapter);
        apply_changes(&adapter, &mut stale, &changes).expect("apply");
        prop_assert_eq!(
            extract_changes(&adapter, &stale).expect("diff"),
            changes.clone()
        );

        apply_changes(&adapter, &mut stale, &reverse_changes(&changes)).expect("revert");
        prop_assert!(extract_changes(&adapter, &stale).expect("diff").is_empty());
    }
}
