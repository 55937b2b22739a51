use crate::ast::Position;
use crate::catalog::Catalog;
use crate::diagnostics::{DiagCode, Diagnostic};
use crate::expand::Instance;

use std::collections::HashMap;

/// Checks spatial occupancy, support, and attachment for every instance.
/// Findings come out ordered by instance id, so runs are reproducible.
pub fn check_placement(instances: &[Instance], catalog: &Catalog) -> Vec<Diagnostic> {
    let mut diags = vec![];

    let mut occupancy: HashMap<Position, Vec<usize>> = HashMap::new();
    for inst in instances {
        occupancy.entry(inst.position).or_default().push(inst.id);
    }

    // a solid occupant makes a cell a valid footing or attachment face
    let solid_at = |pos: &Position| -> bool {
        occupancy
            .get(pos)
            .map(|ids| ids.iter().any(|&id| catalog.rules(instances[id].element).solid))
            .unwrap_or(false)
    };

    // collisions: report once per cell, keyed to the second arrival
    for inst in instances {
        let ids = &occupancy[&inst.position];
        if ids.len() < 2 || ids[1] != inst.id {
            continue;
        }
        let all_stackable = ids
            .iter()
            .all(|&id| catalog.rules(instances[id].element).stackable);
        if all_stackable {
            continue;
        }
        let first = &instances[ids[0]];
        let names: Vec<String> = ids.iter().map(|&id| instances[id].scoped_name()).collect();
        let mut diag = Diagnostic::error(
            DiagCode::Collision,
            inst.file.clone(),
            inst.span.clone(),
            format!(
                "{} occupy the same cell {}",
                names.join(" and "),
                inst.position
            ),
        )
        .with_position(inst.position);
        for &id in ids {
            diag = diag.with_instance(id);
        }
        if first.file == inst.file {
            diag = diag.with_label(first.span.clone(), format!("'{}' was placed here first", first.name));
        }
        diags.push(diag);
    }

    for inst in instances {
        let rules = catalog.rules(inst.element);

        // a facing on a wall-mountable element replaces the floor rule
        let wall_mounted = rules.attaches_to_face && inst.facing.is_some();

        if rules.requires_support_below && !wall_mounted {
            let below = inst.position.below();
            if !solid_at(&below) {
                diags.push(
                    Diagnostic::error(
                        DiagCode::MissingSupport,
                        inst.file.clone(),
                        inst.span.clone(),
                        format!(
                            "{} '{}' at {} needs a solid block at {}",
                            inst.element,
                            inst.scoped_name(),
                            inst.position,
                            below
                        ),
                    )
                    .with_position(inst.position)
                    .with_position(below)
                    .with_instance(inst.id),
                );
            }
        }

        if rules.attaches_to_face {
            match inst.facing {
                Some(facing) => {
                    let (dx, dy, dz) = facing.delta();
                    let anchor = inst.position.offset(dx, dy, dz);
                    if !solid_at(&anchor) {
                        diags.push(
                            Diagnostic::error(
                                DiagCode::InvalidAttachment,
                                inst.file.clone(),
                                inst.span.clone(),
                                format!(
                                    "{} '{}' faces {} but there is nothing solid at {}",
                                    inst.element,
                                    inst.scoped_name(),
                                    facing,
                                    anchor
                                ),
                            )
                            .with_position(inst.position)
                            .with_position(anchor)
                            .with_instance(inst.id),
                        );
                    }
                }
                // without a facing the element sits on whatever is below it
                None => {
                    let below = inst.position.below();
                    if !rules.requires_support_below && !solid_at(&below) {
                        diags.push(
                            Diagnostic::error(
                                DiagCode::InvalidAttachment,
                                inst.file.clone(),
                                inst.span.clone(),
                                format!(
                                    "{} '{}' at {} has no facing and nothing solid below",
                                    inst.element,
                                    inst.scoped_name(),
                                    inst.position
                                ),
                            )
                            .with_position(inst.position)
                            .with_position(below)
                            .with_instance(inst.id),
                        );
                    }
                }
            }
        }
    }

    diags
}
