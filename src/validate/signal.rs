use crate::ast::Position;
use crate::catalog::Catalog;
use crate::diagnostics::{DiagCode, Diagnostic};
use crate::expand::Instance;

use log::debug;

use std::collections::{HashMap, VecDeque};

pub const MAX_POWER: i64 = 15;

/// Material name that turns a generic block into a power source.
const REDSTONE_BLOCK: &str = "minecraft:redstone_block";

/// Steady-state power for every instance, plus mismatches against any
/// power level the program declared.
pub fn check_signal(
    instances: &[Instance],
    catalog: &Catalog,
) -> (HashMap<usize, i64>, Vec<Diagnostic>) {
    let powers = compute_power(instances, catalog);

    // any instance may declare a power level; sources compute 15,
    // conductors their propagated value, everything else 0
    let mut diags = vec![];
    for inst in instances {
        let computed = powers.get(&inst.id).copied().unwrap_or(0);
        if let Some(declared) = inst.power {
            if declared != computed {
                diags.push(
                    Diagnostic::error(
                        DiagCode::PowerMismatch,
                        inst.file.clone(),
                        inst.span.clone(),
                        format!(
                            "'{}' declares power {} but the circuit carries {}",
                            inst.scoped_name(),
                            declared,
                            computed
                        ),
                    )
                    .with_position(inst.position)
                    .with_instance(inst.id),
                );
            }
        }
    }
    (powers, diags)
}

/// Multi-source breadth-first fixed point over the conductive subgraph.
/// Sources emit 15; each hop through a conductor loses one level, floored
/// at zero. Only the six orthogonal neighbours connect.
pub fn compute_power(instances: &[Instance], catalog: &Catalog) -> HashMap<usize, i64> {
    let mut conductors: HashMap<Position, usize> = HashMap::new();
    let mut sources: Vec<Position> = vec![];
    for inst in instances {
        let rules = catalog.rules(inst.element);
        if rules.conductive {
            conductors.insert(inst.position, inst.id);
        }
        if is_source(inst, catalog) {
            sources.push(inst.position);
        }
    }

    let mut powers: HashMap<usize, i64> = HashMap::new();
    let mut queue: VecDeque<(Position, i64)> = VecDeque::new();

    // conductors next to a source start at full strength
    for source in &sources {
        for neighbor in source.neighbors() {
            if let Some(&id) = conductors.get(&neighbor) {
                if powers.get(&id).copied().unwrap_or(-1) < MAX_POWER {
                    powers.insert(id, MAX_POWER);
                    queue.push_back((neighbor, MAX_POWER));
                }
            }
        }
    }

    while let Some((pos, level)) = queue.pop_front() {
        let next = level - 1;
        if next <= 0 {
            continue;
        }
        for neighbor in pos.neighbors() {
            if let Some(&id) = conductors.get(&neighbor) {
                if powers.get(&id).copied().unwrap_or(0) < next {
                    powers.insert(id, next);
                    queue.push_back((neighbor, next));
                }
            }
        }
    }

    // sources themselves report full power
    for inst in instances {
        if is_source(inst, catalog) {
            powers.insert(inst.id, MAX_POWER);
        }
    }

    debug!(
        "signal fixed point: {} sources, {} conductors",
        sources.len(),
        conductors.len()
    );
    powers
}

fn is_source(inst: &Instance, catalog: &Catalog) -> bool {
    catalog.rules(inst.element).power_source
        || inst.material.as_deref() == Some(REDSTONE_BLOCK)
}
