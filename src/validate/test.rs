use super::assertion::check_assertions;
use super::placement::check_placement;
use super::signal::{check_signal, compute_power};
use crate::catalog::{Catalog, ElementRules, ElementType};
use crate::diagnostics::DiagCode;
use crate::expand::{Expander, Expansion, Instance};
use crate::lexer::Token;
use crate::parser::Parser;
use crate::table::{MapResolver, TableBuilder};

use logos::Logos;

fn expand(source: &str) -> Expansion {
    let lexer = Token::lexer(source).spanned().peekable();
    let mut parser = Parser::new(lexer, "test.rl".to_string());
    let items = parser.parse_program();
    assert!(parser.errors.is_empty(), "parse failed: {:?}", parser.errors);
    let resolver = MapResolver::new();
    let (table, body, errors, _sources) = TableBuilder::new(&resolver).build("test.rl", items);
    assert!(errors.is_empty(), "table build failed: {:?}", errors);
    let out = Expander::new(&table, None).expand(&body, "test.rl");
    assert!(out.errors.is_empty(), "expansion failed: {:?}", out.errors);
    out
}

fn layout(source: &str) -> Vec<Instance> {
    expand(source).instances
}

#[test]
fn test_supported_wire_is_clean() {
    let instances = layout(
        "def base stone(pos=(0, 0, 0))
         def w wire(pos=(0, 1, 0))",
    );
    let diags = check_placement(&instances, &Catalog::standard());
    assert!(diags.is_empty(), "unexpected: {:?}", diags);
}

#[test]
fn test_floating_wire_reports_both_cells() {
    let instances = layout("def w wire(pos=(0, 5, 0))");
    let diags = check_placement(&instances, &Catalog::standard());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagCode::MissingSupport);
    // the wire's own cell and the empty cell below it
    assert_eq!(diags[0].positions.len(), 2);
    assert_eq!(diags[0].positions[1].y, 4);
}

#[test]
fn test_wire_over_button_is_not_supported() {
    // a button is not solid, so it cannot carry a wire
    let instances = layout(
        "def wall stone(pos=(0, 0, 1))
         def b button(pos=(0, 0, 0), facing=south)
         def w wire(pos=(0, 1, 0))",
    );
    let diags = check_placement(&instances, &Catalog::standard());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagCode::MissingSupport);
}

#[test]
fn test_collision_names_both_instances() {
    let instances = layout(
        "def a stone(pos=(1, 2, 3))
         def b glass(pos=(1, 2, 3))",
    );
    let diags = check_placement(&instances, &Catalog::standard());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagCode::Collision);
    assert_eq!(diags[0].instances, vec![0, 1]);
}

#[test]
fn test_stackable_override_allows_sharing() {
    let instances = layout(
        "def a slime_block(pos=(0, 0, 0))
         def b slime_block(pos=(0, 0, 0))",
    );
    let mut catalog = Catalog::standard();
    catalog.set(
        ElementType::SlimeBlock,
        ElementRules {
            solid: true,
            stackable: true,
            ..Default::default()
        },
    );
    assert!(check_placement(&instances, &catalog).is_empty());
    // without the override the same layout collides
    assert!(!check_placement(&instances, &Catalog::standard()).is_empty());
}

#[test]
fn test_wall_torch_needs_its_anchor() {
    // east-facing torch attaches to the block at x+1
    let good = layout(
        "def wall stone(pos=(1, 0, 0))
         def t torch(pos=(0, 0, 0), facing=east)",
    );
    assert!(check_placement(&good, &Catalog::standard()).is_empty());

    let bad = layout("def t torch(pos=(0, 0, 0), facing=east)");
    let diags = check_placement(&bad, &Catalog::standard());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagCode::InvalidAttachment);
}

#[test]
fn test_power_decays_one_per_hop() {
    // lever on a wall, wire run heading away from it
    let instances = layout(
        "def wall stone(pos=(-1, 1, 0))
         def src lever(pos=(0, 1, 0), facing=west)
         for i in range(0, 4) {
             def base stone(pos=(1 + i, 0, 0))
             def w wire(pos=(1 + i, 1, 0))
         }",
    );
    let catalog = Catalog::standard();
    let powers = compute_power(&instances, &catalog);
    // wires are at odd indices: base, wire, base, wire, ...
    let wire_ids: Vec<usize> = instances
        .iter()
        .filter(|i| i.element == ElementType::RedstoneWire)
        .map(|i| i.id)
        .collect();
    assert_eq!(powers[&wire_ids[0]], 15);
    assert_eq!(powers[&wire_ids[1]], 14);
    assert_eq!(powers[&wire_ids[2]], 13);
    assert_eq!(powers[&wire_ids[3]], 12);
}

#[test]
fn test_redstone_block_material_is_a_source() {
    let instances = layout(
        r#"def rb block(pos=(0, 0, 0), material="minecraft:redstone_block")
           def base stone(pos=(1, -1, 0))
           def w wire(pos=(1, 0, 0))"#,
    );
    let powers = compute_power(&instances, &Catalog::standard());
    let wire = instances
        .iter()
        .find(|i| i.element == ElementType::RedstoneWire)
        .unwrap();
    assert_eq!(powers[&wire.id], 15);
}

#[test]
fn test_unreachable_wire_carries_nothing() {
    let instances = layout(
        "def base stone(pos=(0, 0, 0))
         def w wire(pos=(0, 1, 0))",
    );
    let powers = compute_power(&instances, &Catalog::standard());
    let wire = instances.last().unwrap();
    assert_eq!(powers.get(&wire.id).copied().unwrap_or(0), 0);
}

#[test]
fn test_declared_power_mismatch() {
    let instances = layout(
        "def wall stone(pos=(-1, 0, 0))
         def src lever(pos=(0, 0, 0), facing=west)
         def base stone(pos=(1, -1, 0))
         def w wire(pos=(1, 0, 0), power=7)",
    );
    let (_, diags) = check_signal(&instances, &Catalog::standard());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagCode::PowerMismatch);
    assert!(diags[0].message.contains("7"));
    assert!(diags[0].message.contains("15"));
}

#[test]
fn test_declared_power_checked_on_sources_too() {
    // a source is never conductive, but its declared power still has to
    // match the 15 it emits
    let instances = layout(
        "def base stone(pos=(0, 0, 0))
         def t torch(pos=(0, 1, 0), power=7)",
    );
    let (_, diags) = check_signal(&instances, &Catalog::standard());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagCode::PowerMismatch);
    assert!(diags[0].message.contains("7"));
    assert!(diags[0].message.contains("15"));
}

#[test]
fn test_declared_power_checked_on_plain_blocks() {
    let instances = layout("def s stone(pos=(0, 0, 0), power=3)");
    let (_, diags) = check_signal(&instances, &Catalog::standard());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagCode::PowerMismatch);
}

#[test]
fn test_declared_power_match_is_clean() {
    let instances = layout(
        "def wall stone(pos=(-1, 0, 0))
         def src lever(pos=(0, 0, 0), facing=west)
         def base stone(pos=(1, -1, 0))
         def w wire(pos=(1, 0, 0), power=15)",
    );
    let (_, diags) = check_signal(&instances, &Catalog::standard());
    assert!(diags.is_empty());
}

#[test]
fn test_assertion_on_facing() {
    let out = expand(
        "def base stone(pos=(0, -1, 0))
         def p piston(pos=(0, 0, 0), facing=up)
         assert(p.facing == up)",
    );
    let diags = check_assertions(&out.obligations, &out.instances, &Default::default());
    assert!(diags.is_empty());
}

#[test]
fn test_failed_assertion_names_both_sides() {
    let out = expand(
        "def p piston(pos=(0, 0, 0), facing=up)
         assert(p.facing == south)",
    );
    let diags = check_assertions(&out.obligations, &out.instances, &Default::default());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, DiagCode::AssertionFailed);
    let note = diags[0].note.as_deref().unwrap();
    assert!(note.contains("south"));
    assert!(note.contains("up"));
}

#[test]
fn test_assertion_reads_computed_power() {
    let out = expand(
        "def wall stone(pos=(-1, 0, 0))
         def src lever(pos=(0, 0, 0), facing=west)
         def base stone(pos=(1, -1, 0))
         def w wire(pos=(1, 0, 0))
         assert(w.power == 15)",
    );
    let catalog = Catalog::standard();
    let powers = compute_power(&out.instances, &catalog);
    let diags = check_assertions(&out.obligations, &out.instances, &powers);
    assert!(diags.is_empty(), "unexpected: {:?}", diags);
}

#[test]
fn test_assertion_on_type_and_position() {
    let out = expand(
        "def base stone(pos=(0, -1, 0))
         def p sticky_piston(pos=(0, 0, 0), facing=up)
         assert(p.type == sticky_piston)
         assert(p.pos == (0, 0, 0))",
    );
    let diags = check_assertions(&out.obligations, &out.instances, &Default::default());
    assert!(diags.is_empty(), "unexpected: {:?}", diags);
}
