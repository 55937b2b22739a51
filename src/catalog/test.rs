use super::*;

#[test]
fn test_camel_and_snake_aliases_agree() {
    assert_eq!(
        ElementType::from_name("StickyPiston"),
        ElementType::from_name("sticky_piston")
    );
    assert_eq!(
        ElementType::from_name("RedstoneWire"),
        ElementType::from_name("redstone_wire")
    );
    assert_eq!(ElementType::from_name("glass"), Some(ElementType::Glass));
    assert_eq!(ElementType::from_name("NoSuchBlock"), None);
}

#[test]
fn test_standard_rules() {
    let catalog = Catalog::standard();

    let wire = catalog.rules(ElementType::RedstoneWire);
    assert!(!wire.solid);
    assert!(wire.requires_support_below);
    assert!(wire.conductive);
    assert!(!wire.power_source);

    let button = catalog.rules(ElementType::Button);
    assert!(!button.solid);
    assert!(button.attaches_to_face);
    assert!(button.power_source);

    let stone = catalog.rules(ElementType::Stone);
    assert!(stone.solid);
    assert!(!stone.requires_support_below);

    let observer = catalog.rules(ElementType::Observer);
    assert!(observer.solid);
    assert!(observer.power_source);
}

#[test]
fn test_override_marks_pair_stackable() {
    let mut catalog = Catalog::standard();
    let mut wire = catalog.rules(ElementType::RedstoneWire);
    wire.stackable = true;
    catalog.set(ElementType::RedstoneWire, wire);
    assert!(catalog.rules(ElementType::RedstoneWire).stackable);
    // other rows untouched
    assert!(!catalog.rules(ElementType::Observer).stackable);
}
