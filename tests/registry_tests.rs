mod common;

use common::*;
use natural_automation::pages::default_registry;
use natural_automation::prelude::*;
use natural_automation::SlotKind;

#[test]
fn test_names_in_registration_order() {
    let registry = registry();
    assert_eq!(registry.names(), vec!["Login", "Home", "Editor"]);
    assert_eq!(registry.len(), 3);
    assert!(registry.contains("Home"));
    assert!(!registry.contains("home"));
}

#[test]
fn test_get_page_builds_fresh_instances() {
    let (_memory, browser) = memory_browser();
    let registry = registry();

    let page = registry.get_page("Login", &browser).unwrap();
    assert_eq!(page.name(), "Login");
    assert_eq!(page.state(), PageState::Unvisited);
}

#[test]
fn test_get_page_not_mapped() {
    let (_memory, browser) = memory_browser();
    let registry = registry();

    let err = registry.get_page("Checkout", &browser).err().unwrap();
    assert!(matches!(err, PageError::PageNotMapped(ref name) if name == "Checkout"));
    assert_eq!(err.to_string(), "Page not mapped: Checkout");
}

#[test]
fn test_register_twice_replaces() {
    let (_memory, browser) = memory_browser();
    let mut registry = PageRegistry::new();
    registry.register("Start", LoginPage::new).unwrap();
    registry.register("Start", HomePage::new).unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get_page("Start", &browser).unwrap().name(), "Home");
}

#[test]
fn test_describe() {
    let registry = registry();
    let login = registry.describe()[0];

    assert_eq!(login.name, "Login");
    assert_eq!(login.fields[0], ("user".to_string(), SlotKind::Input));
    assert_eq!(login.fields[2], ("submit".to_string(), SlotKind::Element));
    assert_eq!(login.fields[4], ("errors".to_string(), SlotKind::Collection));
    assert!(login.actions.contains(&("login".to_string(), 2)));
}

#[test]
fn test_default_registry_pages() {
    let (_memory, browser) = memory_browser();
    let registry = default_registry().unwrap();

    let search = registry.get_page("Google search", &browser).unwrap();
    assert_eq!(search.field_names(), vec!["q", "search"]);
    assert_eq!(search.action_signatures(), vec![("search".to_string(), 0)]);

    let results = registry.get_page("Google results", &browser).unwrap();
    assert_eq!(results.field_names(), vec!["results"]);
}
