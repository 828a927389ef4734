use crate::{
    adapter::{AttributeChange, AttributeState, EntityAdapter, ValueCodec},
    model::AssociationDescriptor,
    value::Value,
};
use std::collections::BTreeMap;

///
/// TestSchema
///
/// In-memory class registry backing the test adapter. Class paths use the
/// same `::` hierarchy the boundary resolver reasons about.
///

#[derive(Default)]
pub(crate) struct TestSchema {
    classes: BTreeMap<String, TestClass>,
}

impl TestSchema {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn class(mut self, path: &str, class: TestClass) -> Self {
        self.classes.insert(path.to_string(), class);
        self
    }

    fn find(&self, path: &str) -> Option<&TestClass> {
        self.classes.get(path)
    }
}

///
/// TestClass
///

#[derive(Default)]
pub(crate) struct TestClass {
    attributes: Vec<TestAttribute>,
    associations: Vec<AssociationDescriptor>,
    valid_when: Option<fn(&TestEntity) -> bool>,
}

struct TestAttribute {
    name: String,
    default: Value,
    codec: Option<Box<dyn ValueCodec>>,
}

impl TestClass {
    pub fn new() -> Self {
        Self::default()
    }

    /// The persistence columns every fixture class carries: identity and
    /// audit timestamps.
    #[must_use]
    pub fn audited(self) -> Self {
        self.attribute("id")
            .attribute("created_at")
            .attribute("updated_at")
    }

    #[must_use]
    pub fn attribute(self, name: &str) -> Self {
        self.attribute_with_default(name, Value::Null)
    }

    #[must_use]
    pub fn attribute_with_default(mut self, name: &str, default: Value) -> Self {
        self.attributes.push(TestAttribute {
            name: name.to_string(),
            default,
            codec: None,
        });
        self
    }

    #[must_use]
    pub fn attribute_with_codec(
        mut self,
        name: &str,
        default: Value,
        codec: impl ValueCodec + 'static,
    ) -> Self {
        self.attributes.push(TestAttribute {
            name: name.to_string(),
            default,
            codec: Some(Box::new(codec)),
        });
        self
    }

    #[must_use]
    pub fn association(mut self, association: AssociationDescriptor) -> Self {
        self.associations.push(association);
        self
    }

    #[must_use]
    pub fn valid_when(mut self, predicate: fn(&TestEntity) -> bool) -> Self {
        self.valid_when = Some(predicate);
        self
    }

    fn attribute_model(&self, name: &str) -> Option<&TestAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn defaults(&self) -> BTreeMap<String, Value> {
        self.attributes
            .iter()
            .map(|a| (a.name.clone(), a.default.clone()))
            .collect()
    }
}

///
/// TestEntity
///
/// A dynamic entity instance: class path, attribute values, children per
/// association, plus the persisted baseline that drives dirty tracking.
///

#[derive(Clone, Debug)]
pub(crate) struct TestEntity {
    class: String,
    values: BTreeMap<String, Value>,
    children: BTreeMap<String, Vec<TestEntity>>,
    baseline: BTreeMap<String, Value>,
    new_record: bool,
    destroyed: bool,
}

impl TestEntity {
    fn build(schema: &TestSchema, class: &str) -> Self {
        let defaults = schema.find(class).map(TestClass::defaults).unwrap_or_default();

        Self {
            class: class.to_string(),
            values: defaults.clone(),
            children: BTreeMap::new(),
            baseline: defaults,
            new_record: true,
            destroyed: false,
        }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Current value of an attribute; `Null` when unset.
    pub fn value(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn children_of(&self, association: &str) -> &[Self] {
        self.children
            .get(association)
            .map_or(&[], Vec::as_slice)
    }

    /// Child at a position; panics when absent (test convenience).
    pub fn child_at(&self, association: &str, index: usize) -> &Self {
        self.children_of(association)
            .get(index)
            .expect("child at index")
    }

    /// Mutable child at a position; panics when absent (test convenience).
    pub fn child_at_mut(&mut self, association: &str, index: usize) -> &mut Self {
        self.children
            .get_mut(association)
            .and_then(|c| c.get_mut(index))
            .expect("child at index")
    }

    pub fn to_one_child(&self, association: &str) -> Option<&Self> {
        self.children_of(association).first()
    }

    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Persist the in-memory graph: prune children marked for destruction,
    /// reset dirty tracking, clear the new-record flag. Mirrors an autosave
    /// that also destroys marked children.
    pub fn save(&mut self) {
        for children in self.children.values_mut() {
            children.retain(|child| !child.destroyed);
            for child in children.iter_mut() {
                child.save();
            }
        }

        self.baseline = self.values.clone();
        self.new_record = false;
    }
}

///
/// TestAdapter
///
/// The host capability over `TestEntity`, registered explicitly as a value.
///

pub(crate) struct TestAdapter {
    schema: TestSchema,
}

impl TestAdapter {
    pub const fn new(schema: TestSchema) -> Self {
        Self { schema }
    }

    /// Build a detached entity with class defaults.
    pub fn build(&self, class: &str) -> TestEntity {
        TestEntity::build(&self.schema, class)
    }

    fn class(&self, entity: &TestEntity) -> &TestClass {
        self.schema.find(&entity.class).expect("registered class")
    }

    fn graph_is_valid(&self, entity: &TestEntity) -> bool {
        let own = self
            .class(entity)
            .valid_when
            .is_none_or(|predicate| predicate(entity));

        own && entity
            .children
            .values()
            .flatten()
            .all(|child| self.graph_is_valid(child))
    }
}

impl EntityAdapter for TestAdapter {
    type Entity = TestEntity;

    fn class_of<'e>(&self, entity: &'e TestEntity) -> &'e str {
        &entity.class
    }

    fn associations(&self, class: &str) -> Vec<AssociationDescriptor> {
        self.schema
            .find(class)
            .map(|c| c.associations.clone())
            .unwrap_or_default()
    }

    fn default_value(&self, class: &str, attribute: &str) -> Option<Value> {
        self.schema
            .find(class)?
            .attribute_model(attribute)
            .map(|a| a.default.clone())
    }

    fn codec(&self, class: &str, attribute: &str) -> Option<&dyn ValueCodec> {
        self.schema
            .find(class)?
            .attribute_model(attribute)?
            .codec
            .as_deref()
    }

    fn attributes(&self, entity: &TestEntity) -> Vec<AttributeState> {
        entity
            .values
            .iter()
            .map(|(name, value)| AttributeState {
                name: name.clone(),
                value: value.clone(),
                raw: value.clone(),
            })
            .collect()
    }

    fn dirty_attributes(&self, entity: &TestEntity) -> Vec<AttributeChange> {
        entity
            .values
            .iter()
            .filter_map(|(name, value)| {
                let before = entity.baseline.get(name).cloned().unwrap_or(Value::Null);
                (before != *value).then(|| AttributeChange {
                    name: name.clone(),
                    before,
                    after: value.clone(),
                })
            })
            .collect()
    }

    fn set_attribute(&self, entity: &mut TestEntity, attribute: &str, value: Value) -> bool {
        if self.class(entity).attribute_model(attribute).is_none() {
            return false;
        }

        entity.values.insert(attribute.to_string(), value);
        true
    }

    fn to_one<'e>(&self, entity: &'e TestEntity, association: &str) -> Option<&'e TestEntity> {
        entity.children.get(association).and_then(|c| c.first())
    }

    fn to_one_mut<'e>(
        &self,
        entity: &'e mut TestEntity,
        association: &str,
    ) -> Option<&'e mut TestEntity> {
        entity
            .children
            .get_mut(association)
            .and_then(|c| c.first_mut())
    }

    fn children<'e>(&self, entity: &'e TestEntity, association: &str) -> Vec<&'e TestEntity> {
        entity.children_of(association).iter().collect()
    }

    fn children_len(&self, entity: &TestEntity, association: &str) -> usize {
        entity.children_of(association).len()
    }

    fn child_mut<'e>(
        &self,
        entity: &'e mut TestEntity,
        association: &str,
        index: usize,
    ) -> Option<&'e mut TestEntity> {
        entity
            .children
            .get_mut(association)
            .and_then(|c| c.get_mut(index))
    }

    fn build_child<'e>(
        &self,
        entity: &'e mut TestEntity,
        association: &str,
    ) -> &'e mut TestEntity {
        let descriptor = self
            .class(entity)
            .associations
            .iter()
            .find(|a| a.name == association)
            .expect("declared association");

        let child = TestEntity::build(&self.schema, &descriptor.target_class);
        let slot = entity.children.entry(association.to_string()).or_default();
        if descriptor.cardinality.is_to_many() {
            slot.push(child);
        } else {
            *slot = vec![child];
        }

        slot.last_mut().expect("freshly built child")
    }

    fn mark_for_destruction(&self, entity: &mut TestEntity) {
        entity.destroyed = true;
    }

    fn is_new(&self, entity: &TestEntity) -> bool {
        entity.new_record
    }

    fn is_marked_for_destruction(&self, entity: &TestEntity) -> bool {
        entity.destroyed
    }

    fn is_valid(&self, entity: &TestEntity) -> bool {
        self.graph_is_valid(entity)
    }
}
