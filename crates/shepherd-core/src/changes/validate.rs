use crate::{
    adapter::EntityAdapter,
    aggregate::Aggregate,
    blob::{self, ChangeBlob},
    boundary::BoundaryResolver,
    changes::{apply_changes, extract_changes, reverse_changes},
    error::ValidationError,
    model::association::{AssociationDescriptor, Cardinality},
    obs::metrics,
    value::ValueMap,
};

/// Validate a change blob against the aggregate rooted at `entity` without
/// touching it. Runs four ordered checks, each appending findings: schema-
/// aware shape, involution under double reversal, simulated application on a
/// cloned graph (conflicts, schema mismatches, and the host validity
/// predicate), and round-trip neutrality (apply + apply-reverse restores the
/// original change snapshot; skipped when the simulated apply already
/// failed, since it consumes that output). An empty result means the blob is
/// safe to apply.
pub fn validate_changes<A>(
    adapter: &A,
    entity: &A::Entity,
    changes: &ChangeBlob,
) -> Vec<ValidationError>
where
    A: EntityAdapter,
    A::Entity: Clone,
{
    metrics::count(|m| m.ops.validate_calls += 1);

    let mut errors = Vec::new();

    // 1. structural well-formedness against the resolved schema
    let mut resolver = BoundaryResolver::new(adapter.class_of(entity));
    let aggregate = Aggregate::root(adapter, entity, &mut resolver);
    check_shape(&aggregate, changes.as_map(), "", &mut resolver, &mut errors);

    // 2. reversal must be an involution over this blob
    if reverse_changes(&reverse_changes(changes)) != *changes {
        errors.push(ValidationError::NotInvolutive);
    }

    // 3. simulated application on a disposable copy of the graph
    let mut copy = entity.clone();
    match apply_changes(adapter, &mut copy, changes) {
        Err(err) => errors.push(ValidationError::Apply {
            source: Box::new(err),
        }),
        Ok(()) => {
            if !adapter.is_valid(&copy) {
                errors.push(ValidationError::InvalidResult);
            }

            // 4. applying the reversal on top must restore the original
            // change snapshot
            let baseline = extract_changes(adapter, entity);
            let restored = apply_changes(adapter, &mut copy, &reverse_changes(changes))
                .and_then(|()| extract_changes(adapter, &copy));
            match (baseline, restored) {
                (Ok(expected), Ok(actual)) if expected == actual => {}
                _ => errors.push(ValidationError::NotNeutral),
            }
        }
    }

    errors
}

fn check_shape<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    map: &ValueMap,
    path: &str,
    resolver: &mut BoundaryResolver,
    errors: &mut Vec<ValidationError>,
) {
    if map.contains_key(blob::CREATE_KEY) && map.contains_key(blob::DESTROY_KEY) {
        errors.push(shape(path, "at most one of _create/_destroy"));
    }

    for (key, value) in map {
        let key_path = join(path, key);

        if blob::is_meta_key(key) {
            if !value.is_scalar() {
                errors.push(shape(&key_path, "a scalar lifecycle marker"));
            }
            continue;
        }

        if let Some(association) = aggregate.boundary().find_traversable(key) {
            match association.cardinality {
                Cardinality::ToOne => {
                    let Some(nested) = value.as_map() else {
                        errors.push(shape(&key_path, "a nested change map"));
                        continue;
                    };
                    descend_shape(aggregate, association, nested, &key_path, resolver, errors);
                }
                Cardinality::ToMany => {
                    let Some(group) = value.as_map() else {
                        errors.push(shape(&key_path, "an index-keyed change map"));
                        continue;
                    };
                    for (index_key, nested) in group {
                        let Some(index) = blob::parse_index(index_key) else {
                            errors.push(shape(&key_path, "decimal index keys"));
                            continue;
                        };
                        let index_path = format!("{key_path}[{index}]");
                        let Some(nested) = nested.as_map() else {
                            errors.push(shape(&index_path, "a change map per index"));
                            continue;
                        };
                        descend_shape(
                            aggregate,
                            association,
                            nested,
                            &index_path,
                            resolver,
                            errors,
                        );
                    }
                }
            }
            continue;
        }

        if aggregate.boundary().is_excluded_association(key)
            || aggregate.is_excluded_attribute(key)
        {
            // skipped silently on application; any shape is tolerated
            continue;
        }

        if aggregate
            .adapter()
            .default_value(aggregate.class(), key)
            .is_some()
        {
            if value.as_pair().is_none() {
                errors.push(shape(&key_path, "a [before, after] pair"));
            }
            continue;
        }

        // unknown keys are the simulated apply's finding, not a shape one
    }
}

fn descend_shape<A: EntityAdapter>(
    aggregate: &Aggregate<'_, A>,
    association: &AssociationDescriptor,
    nested: &ValueMap,
    path: &str,
    resolver: &mut BoundaryResolver,
    errors: &mut Vec<ValidationError>,
) {
    match aggregate.descend(association, association.target_class.clone(), resolver) {
        Ok(child_aggregate) => check_shape(&child_aggregate, nested, path, resolver, errors),
        Err(_) => errors.push(shape(path, "nesting within the depth budget")),
    }
}

fn shape(path: &str, expected: &'static str) -> ValidationError {
    ValidationError::Shape {
        path: path.to_string(),
        expected,
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
