use std::collections::HashMap;
use std::fmt;

#[cfg(test)]
pub mod test;

/// The closed set of element types the engine knows how to place.
/// Physical behaviour lives in the rule table, not here; adding a type
/// means adding a variant and one table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Stone,
    Glass,
    GlazedTerracotta,
    Block,
    Piston,
    StickyPiston,
    SlimeBlock,
    HoneyBlock,
    Repeater,
    Comparator,
    Lever,
    Button,
    PressurePlate,
    Observer,
    Lamp,
    RedstoneTorch,
    RedstoneWire,
    Hopper,
    Dropper,
    Target,
}

impl ElementType {
    /// Accepts both the CamelCase spelling and the snake_case alias.
    pub fn from_name(name: &str) -> Option<ElementType> {
        match name {
            "Stone" | "stone" => Some(ElementType::Stone),
            "Glass" | "glass" => Some(ElementType::Glass),
            "GlazedTerracotta" | "glazed_terracotta" => Some(ElementType::GlazedTerracotta),
            "Block" | "block" => Some(ElementType::Block),
            "Piston" | "piston" => Some(ElementType::Piston),
            "StickyPiston" | "sticky_piston" => Some(ElementType::StickyPiston),
            "SlimeBlock" | "slime_block" => Some(ElementType::SlimeBlock),
            "HoneyBlock" | "honey_block" => Some(ElementType::HoneyBlock),
            "Repeater" | "repeater" => Some(ElementType::Repeater),
            "Comparator" | "comparator" => Some(ElementType::Comparator),
            "Lever" | "lever" => Some(ElementType::Lever),
            "Button" | "button" => Some(ElementType::Button),
            "PressurePlate" | "pressure_plate" => Some(ElementType::PressurePlate),
            "Observer" | "observer" => Some(ElementType::Observer),
            "Lamp" | "lamp" => Some(ElementType::Lamp),
            "RedstoneTorch" | "redstone_torch" | "Torch" | "torch" => {
                Some(ElementType::RedstoneTorch)
            }
            "RedstoneWire" | "redstone_wire" | "Wire" | "wire" => Some(ElementType::RedstoneWire),
            "Hopper" | "hopper" => Some(ElementType::Hopper),
            "Dropper" | "dropper" => Some(ElementType::Dropper),
            "Target" | "target" => Some(ElementType::Target),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Stone => "stone",
            ElementType::Glass => "glass",
            ElementType::GlazedTerracotta => "glazed_terracotta",
            ElementType::Block => "block",
            ElementType::Piston => "piston",
            ElementType::StickyPiston => "sticky_piston",
            ElementType::SlimeBlock => "slime_block",
            ElementType::HoneyBlock => "honey_block",
            ElementType::Repeater => "repeater",
            ElementType::Comparator => "comparator",
            ElementType::Lever => "lever",
            ElementType::Button => "button",
            ElementType::PressurePlate => "pressure_plate",
            ElementType::Observer => "observer",
            ElementType::Lamp => "lamp",
            ElementType::RedstoneTorch => "redstone_torch",
            ElementType::RedstoneWire => "redstone_wire",
            ElementType::Hopper => "hopper",
            ElementType::Dropper => "dropper",
            ElementType::Target => "target",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical rule flags for one element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementRules {
    /// Can other elements rest on or attach to this one.
    pub solid: bool,
    /// Needs a solid instance directly beneath it.
    pub requires_support_below: bool,
    /// Wall-mounted; its facing must point at a solid instance.
    pub attaches_to_face: bool,
    /// Carries redstone signal with 1-per-hop decay.
    pub conductive: bool,
    /// Emits power 15 into adjacent conductors.
    pub power_source: bool,
    /// May share a cell with another stackable instance.
    pub stackable: bool,
}

/// Read-only rule table, threaded through the validators. Callers may
/// override individual rows before a run; the engine never mutates it.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: HashMap<ElementType, ElementRules>,
}

impl Catalog {
    /// The stock vanilla-behaviour table.
    pub fn standard() -> Self {
        let solid = ElementRules {
            solid: true,
            ..Default::default()
        };
        let mut rules = HashMap::new();
        rules.insert(ElementType::Stone, solid);
        rules.insert(ElementType::Glass, solid);
        rules.insert(ElementType::GlazedTerracotta, solid);
        rules.insert(ElementType::Block, solid);
        rules.insert(ElementType::SlimeBlock, solid);
        rules.insert(ElementType::HoneyBlock, solid);
        rules.insert(ElementType::Piston, solid);
        rules.insert(ElementType::StickyPiston, solid);
        rules.insert(ElementType::Lamp, solid);
        rules.insert(ElementType::Hopper, solid);
        rules.insert(ElementType::Dropper, solid);
        rules.insert(ElementType::Target, solid);
        rules.insert(
            ElementType::Observer,
            ElementRules {
                solid: true,
                power_source: true,
                ..Default::default()
            },
        );
        rules.insert(
            ElementType::RedstoneWire,
            ElementRules {
                requires_support_below: true,
                conductive: true,
                ..Default::default()
            },
        );
        rules.insert(
            ElementType::RedstoneTorch,
            ElementRules {
                requires_support_below: true,
                attaches_to_face: true,
                power_source: true,
                ..Default::default()
            },
        );
        rules.insert(
            ElementType::Lever,
            ElementRules {
                attaches_to_face: true,
                power_source: true,
                ..Default::default()
            },
        );
        rules.insert(
            ElementType::Button,
            ElementRules {
                attaches_to_face: true,
                power_source: true,
                ..Default::default()
            },
        );
        rules.insert(
            ElementType::PressurePlate,
            ElementRules {
                requires_support_below: true,
                power_source: true,
                ..Default::default()
            },
        );
        rules.insert(
            ElementType::Repeater,
            ElementRules {
                requires_support_below: true,
                ..Default::default()
            },
        );
        rules.insert(
            ElementType::Comparator,
            ElementRules {
                requires_support_below: true,
                ..Default::default()
            },
        );
        Catalog { rules }
    }

    pub fn rules(&self, ty: ElementType) -> ElementRules {
        self.rules.get(&ty).copied().unwrap_or_default()
    }

    /// Override one row, e.g. to mark a pair of types stackable.
    pub fn set(&mut self, ty: ElementType, rules: ElementRules) {
        self.rules.insert(ty, rules);
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::standard()
    }
}
