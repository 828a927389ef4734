//! The project/todo-list/todo aggregate used across the engine tests:
//! a readonly reference to its owner, an indirect todos edge, a readonly
//! pointer into its own lists, a to-one detail, and comments plus
//! assignments hanging off each todo.

use crate::{
    adapter::{EntityAdapter, ValueCodec},
    model::{AssociationDescriptor, Cardinality},
    test_support::{TestAdapter, TestClass, TestEntity, TestSchema},
    value::Value,
};

///
/// PrefixCodec
///
/// Reversible text transform used to exercise the codec seam.
///

pub(crate) struct PrefixCodec;

impl ValueCodec for PrefixCodec {
    fn serialize(&self, value: &Value) -> Value {
        match value {
            Value::Text(s) => Value::Text(format!("enc:{s}")),
            other => other.clone(),
        }
    }

    fn deserialize(&self, value: &Value) -> Value {
        match value {
            Value::Text(s) => Value::text(s.strip_prefix("enc:").unwrap_or(s)),
            other => other.clone(),
        }
    }
}

///
/// LossyCodec
///
/// A codec whose default does not survive the round trip; used to exercise
/// the unsupported-default guard.
///

pub(crate) struct LossyCodec;

impl ValueCodec for LossyCodec {
    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, value: &Value) -> Value {
        match value {
            Value::Null => Value::text("broken"),
            other => other.clone(),
        }
    }
}

fn to_one(name: &str, foreign_key: &str, target: &str, table: &str) -> AssociationDescriptor {
    AssociationDescriptor::new(name, Cardinality::ToOne, foreign_key, target, table)
}

fn to_many(name: &str, foreign_key: &str, target: &str, table: &str) -> AssociationDescriptor {
    AssociationDescriptor::new(name, Cardinality::ToMany, foreign_key, target, table)
}

pub(crate) fn project_adapter() -> TestAdapter {
    let schema = TestSchema::new()
        .class("user", TestClass::new().audited().attribute("name"))
        .class(
            "project",
            TestClass::new()
                .audited()
                .attribute("name")
                .attribute("owner_id")
                .association(to_one("owner", "owner_id", "user", "users").reference().readonly())
                .association(to_one("detail", "project_id", "project::detail", "project_details"))
                .association(to_many(
                    "todo_lists",
                    "project_id",
                    "project::todo_list",
                    "project_todo_lists",
                ))
                .association(
                    to_many("todos", "todo_list_id", "project::todo", "project_todos").indirect(),
                )
                .association(
                    to_one(
                        "recent_todo_list",
                        "project_id",
                        "project::todo_list",
                        "project_todo_lists",
                    )
                    .readonly(),
                ),
        )
        .class(
            "project::detail",
            TestClass::new()
                .audited()
                .attribute("project_id")
                .attribute("description")
                .attribute_with_codec("settings", Value::Null, PrefixCodec),
        )
        .class(
            "project::todo_list",
            TestClass::new()
                .audited()
                .attribute("project_id")
                .association(to_many("todos", "todo_list_id", "project::todo", "project_todos")),
        )
        .class(
            "project::todo",
            TestClass::new()
                .audited()
                .attribute("todo_list_id")
                .attribute("text")
                .association(to_many(
                    "todo_assignments",
                    "todo_id",
                    "project::todo_assignment",
                    "project_todo_assignments",
                ))
                .association(to_many("assignees", "assignee_id", "user", "users").indirect())
                .association(to_many(
                    "comments",
                    "commentable_id",
                    "project::comment",
                    "comments",
                ))
                .valid_when(|todo| todo.value("text") != Value::text("")),
        )
        .class(
            "project::todo_assignment",
            TestClass::new()
                .audited()
                .attribute("todo_id")
                .attribute("assignee_id")
                .association(to_one("assignee", "assignee_id", "user", "users").reference().readonly()),
        )
        .class(
            "project::comment",
            TestClass::new()
                .audited()
                .attribute("commentable_id")
                .attribute("author_id")
                .attribute("text"),
        );

    TestAdapter::new(schema)
}

/// A saved project with one list holding two todos, the common background
/// for the change-tracking scenarios.
pub(crate) fn persisted_project(adapter: &TestAdapter) -> TestEntity {
    let mut project = adapter.build("project");
    project.set("name", Value::text("Clean House"));

    {
        let list = adapter.build_child(&mut project, "todo_lists");
        let todo = adapter.build_child(list, "todos");
        todo.set("text", Value::text("Take out the trash"));
        let todo = adapter.build_child(list, "todos");
        todo.set("text", Value::text("Make your bed"));
    }

    project.save();
    project
}

/// A deep self-nesting schema for the depth-budget tests.
pub(crate) fn nested_adapter() -> TestAdapter {
    let schema = TestSchema::new().class(
        "tree::node",
        TestClass::new()
            .audited()
            .attribute("label")
            .association(to_one("child", "parent_id", "tree::node", "tree_nodes")),
    );

    TestAdapter::new(schema)
}

/// A class whose attribute default cannot survive its own codec.
pub(crate) fn gadget_adapter() -> TestAdapter {
    let schema = TestSchema::new().class(
        "gadget",
        TestClass::new()
            .audited()
            .attribute("label")
            .attribute_with_codec("flags", Value::Null, LossyCodec),
    );

    TestAdapter::new(schema)
}
