//! Schema-driven plan computation.
//!
//! Given prior state (absent on create), the proposed state, and the resource
//! schema, compute the planned state plus the attribute changes the host
//! shows to the practitioner. An attribute marked `force_new` that changes
//! between prior and proposed state flags the plan as requiring replacement.

use crate::schema::Schema;
use crate::types::{AttributeChange, PlanResult};
use serde_json::Value;

/// Compute a plan for a single resource.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    match prior {
        None => plan_create(schema, proposed),
        Some(prior) if proposed.is_null() => plan_destroy(prior),
        Some(prior) => plan_update(schema, prior, proposed),
    }
}

fn plan_create(schema: &Schema, proposed: &Value) -> PlanResult {
    let mut planned = proposed.clone();
    apply_defaults(schema, &mut planned);

    let mut changes = Vec::new();
    if let Value::Object(map) = &planned {
        for (name, value) in map {
            if !value.is_null() {
                changes.push(AttributeChange::added(name.clone(), value.clone()));
            }
        }
    }

    PlanResult::with_changes(planned, changes, false)
}

fn plan_destroy(prior: &Value) -> PlanResult {
    let mut changes = Vec::new();
    if let Value::Object(map) = prior {
        for (name, value) in map {
            if !value.is_null() {
                changes.push(AttributeChange::removed(name.clone(), value.clone()));
            }
        }
    }

    PlanResult::with_changes(Value::Null, changes, false)
}

fn plan_update(schema: &Schema, prior: &Value, proposed: &Value) -> PlanResult {
    let mut planned = proposed.clone();
    apply_defaults(schema, &mut planned);

    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.block.attributes {
        let before = non_null(prior.get(name));

        if attr.usage.is_computed() && non_null(planned.get(name)).is_none() {
            // The provider owns this value; carry it instead of planning a
            // removal the practitioner never asked for.
            if let (Some(before), Value::Object(map)) = (before, &mut planned) {
                map.insert(name.clone(), before.clone());
            }
            continue;
        }

        if !attr.usage.accepts_input() {
            continue;
        }

        let after = non_null(planned.get(name));
        if before != after {
            changes.push(AttributeChange::new(
                name.clone(),
                before.cloned(),
                after.cloned(),
            ));
            if attr.force_new {
                requires_replace = true;
            }
        }
    }

    // Nested blocks are compared wholesale; a changed block is a single
    // change entry at the block path.
    for (name, nested) in &schema.block.blocks {
        let before = non_null(prior.get(name));
        let after = non_null(planned.get(name));
        if before != after {
            changes.push(AttributeChange::new(
                name.clone(),
                before.cloned(),
                after.cloned(),
            ));
            if nested.force_new {
                requires_replace = true;
            }
        }
    }

    PlanResult::with_changes(planned, changes, requires_replace)
}

fn apply_defaults(schema: &Schema, value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };
    for (name, attr) in &schema.block.attributes {
        if let Some(default) = &attr.default {
            let missing = map.get(name).map(Value::is_null).unwrap_or(true);
            if missing {
                map.insert(name.clone(), default.clone());
            }
        }
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Block, Kind, NestedBlock, Schema};
    use serde_json::json;

    fn lan_schema() -> Schema {
        Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .attr(
                "datacenter_id",
                Attribute::required(Kind::String).force_new(),
            )
            .attr("name", Attribute::optional(Kind::String))
            .attr(
                "public",
                Attribute::optional(Kind::Bool).with_default(json!(false)),
            )
    }

    #[test]
    fn test_plan_create_reports_added_attributes() {
        let result = plan(
            &lan_schema(),
            None,
            &json!({"datacenter_id": "dc-1", "name": "backbone"}),
        );

        assert!(!result.requires_replace);
        assert!(result.changes.iter().any(|c| c.path == "name"));
        // default applied during planning
        assert_eq!(result.planned_state["public"], json!(false));
    }

    #[test]
    fn test_plan_update_no_changes() {
        let state = json!({
            "id": "lan-1",
            "datacenter_id": "dc-1",
            "name": "backbone",
            "public": false
        });
        let result = plan(&lan_schema(), Some(&state), &state);

        assert!(result.changes.is_empty());
        assert!(!result.requires_replace);
    }

    #[test]
    fn test_plan_update_in_place_change() {
        let prior = json!({"id": "lan-1", "datacenter_id": "dc-1", "name": "old", "public": false});
        let proposed =
            json!({"id": "lan-1", "datacenter_id": "dc-1", "name": "new", "public": false});
        let result = plan(&lan_schema(), Some(&prior), &proposed);

        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "name");
        assert!(!result.requires_replace);
    }

    #[test]
    fn test_plan_update_force_new_requires_replace() {
        let prior = json!({"id": "lan-1", "datacenter_id": "dc-1", "name": "backbone", "public": false});
        let proposed =
            json!({"id": "lan-1", "datacenter_id": "dc-2", "name": "backbone", "public": false});
        let result = plan(&lan_schema(), Some(&prior), &proposed);

        assert!(result.requires_replace);
        assert!(result.changes.iter().any(|c| c.path == "datacenter_id"));
    }

    #[test]
    fn test_plan_update_carries_computed_attributes() {
        let prior = json!({"id": "lan-1", "datacenter_id": "dc-1", "name": "backbone", "public": false});
        let proposed = json!({"datacenter_id": "dc-1", "name": "backbone", "public": false});
        let result = plan(&lan_schema(), Some(&prior), &proposed);

        assert_eq!(result.planned_state["id"], "lan-1");
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_plan_destroy() {
        let prior = json!({"id": "lan-1", "datacenter_id": "dc-1"});
        let result = plan(&lan_schema(), Some(&prior), &Value::Null);

        assert!(result.planned_state.is_null());
        assert_eq!(result.changes.len(), 2);
        assert!(result.changes.iter().all(|c| c.after.is_none()));
    }

    #[test]
    fn test_plan_nested_block_change() {
        let schema = Schema::v0()
            .attr("id", Attribute::computed(Kind::String))
            .nested(
                "nic",
                NestedBlock::list(Block::new().attr("lan", Attribute::required(Kind::Int64))),
            );

        let prior = json!({"id": "srv-1", "nic": [{"lan": 1}]});
        let proposed = json!({"id": "srv-1", "nic": [{"lan": 2}]});
        let result = plan(&schema, Some(&prior), &proposed);

        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "nic");
        assert!(!result.requires_replace);
    }
}
