//! Tests for `#[derive(Properties)]`.

use std::sync::Arc;

use rowsieve::{
    Dir, Filter, InMemoryModel, LocalTable, Mode, PropertyPath, PropertyResolver, PropertyType,
    RequestCache, Table, ValueKind,
};
use rowsieve_macros::Properties as DeriveProperties;

#[derive(Debug, Clone, DeriveProperties)]
struct Office {
    room: String,
    #[prop(nested)]
    building: Building,
}

#[derive(Debug, Clone, DeriveProperties)]
struct Building {
    name: String,
}

#[derive(Debug, Clone, DeriveProperties)]
struct Wizard {
    name: String,
    #[prop(rename = "years")]
    age: u32,
    #[prop(flag)]
    tenured: bool,
    #[prop(version)]
    revision: u64,
    #[prop(readonly)]
    id: u64,
    nickname: Option<String>,
    #[prop(nested)]
    office: Option<Office>,
    #[prop(skip)]
    #[allow(dead_code)]
    scratch: Vec<u8>,
}

fn wizard(id: u64, name: &str, age: u32, room: Option<&str>) -> Wizard {
    Wizard {
        name: name.into(),
        age,
        tenured: age > 50,
        revision: 1,
        id,
        nickname: None,
        office: room.map(|room| Office {
            room: room.into(),
            building: Building {
                name: "Unseen University".into(),
            },
        }),
        scratch: Vec::new(),
    }
}

fn resolver() -> PropertyResolver {
    PropertyResolver::new().with_type::<Wizard>()
}

#[test]
fn generates_name_constants() {
    assert_eq!(Wizard::NAME, "name");
    assert_eq!(Wizard::YEARS, "years");
    assert_eq!(Wizard::OFFICE, "office");
    assert_eq!(Office::ROOM, "room");
}

#[test]
fn registers_nested_types() {
    let resolver = resolver();
    assert!(resolver.is_registered::<Wizard>());
    assert!(resolver.is_registered::<Office>());
    assert!(resolver.is_registered::<Building>());

    let w = wizard(1, "Ridcully", 70, Some("Great Hall"));
    let building = resolver
        .resolve(&w, &PropertyPath::from("office.building.name"))
        .unwrap();
    assert_eq!(building.as_str(), Some("Unseen University"));

    let homeless = wizard(2, "Rincewind", 45, None);
    assert!(resolver
        .resolve(&homeless, &PropertyPath::from("office.building.name"))
        .unwrap()
        .is_null());
}

#[test]
fn field_attributes_shape_accessors() {
    let resolver = resolver();
    let mut w = wizard(1, "Ridcully", 70, Some("Great Hall"));

    assert!(resolver
        .resolve(&w, &PropertyPath::from("age"))
        .unwrap_err()
        .is_property_not_found());
    assert_eq!(
        resolver
            .resolve(&w, &PropertyPath::from("tenured"))
            .unwrap()
            .as_bool(),
        Some(true)
    );
    assert!(resolver
        .resolve(&w, &PropertyPath::from("scratch"))
        .is_err());

    resolver
        .assign(&mut w, &PropertyPath::from("revision"), 99u64)
        .unwrap();
    assert_eq!(w.revision, 1);

    assert!(resolver
        .assign(&mut w, &PropertyPath::from("id"), 5u64)
        .unwrap_err()
        .is_property_not_found());

    resolver
        .assign(&mut w, &PropertyPath::from("office.room"), "Library")
        .unwrap();
    assert_eq!(w.office.as_ref().map(|o| o.room.as_str()), Some("Library"));

    resolver
        .assign(&mut w, &PropertyPath::from("tenured"), false)
        .unwrap();
    assert!(!w.tenured);
}

#[test]
fn optional_fields_accept_null() {
    let resolver = resolver();
    let mut w = wizard(1, "Ridcully", 70, None);
    resolver
        .assign(&mut w, &PropertyPath::from("nickname"), Some("Mustrum"))
        .unwrap();
    assert_eq!(w.nickname.as_deref(), Some("Mustrum"));

    resolver
        .assign(&mut w, &PropertyPath::from("nickname"), None::<String>)
        .unwrap();
    assert_eq!(w.nickname, None);

    let err = resolver
        .assign(&mut w, &PropertyPath::from("name"), None::<String>)
        .unwrap_err();
    assert!(err.is_type_mismatch());
}

#[test]
fn property_names_follow_attributes() {
    let names = resolver().property_names::<Wizard>();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    assert_eq!(names, ["name", "nickname", "revision", "tenured", "years"]);

    let accessor = resolver()
        .lookup(std::any::TypeId::of::<Wizard>(), "nickname")
        .map(|a| a.read_type());
    assert_eq!(
        accessor,
        Some(Some(PropertyType::optional(ValueKind::String)))
    );
}

#[test]
fn derived_rows_drive_a_table() {
    let model = InMemoryModel::new(vec![
        wizard(1, "Ridcully", 70, Some("Great Hall")),
        wizard(2, "Rincewind", 45, None),
        wizard(3, "Stibbons", 30, Some("High Energy Magic")),
    ]);
    let mut table = LocalTable::new(model, Arc::new(resolver()));
    table.set_filter(
        "building",
        Filter::search(Mode::Any, ["office.building.name"], "unseen").unwrap(),
    );
    table.set_sort_by(Wizard::YEARS, Some(Dir::Asc));

    let mut cache = RequestCache::new();
    let names: Vec<&str> = table
        .rows(&mut cache)
        .unwrap()
        .iter()
        .map(|w| w.name.as_str())
        .collect();
    assert_eq!(names, ["Stibbons", "Ridcully"]);
}
