use anyhow::Result;
use dto_marshal::{
    CollectionKey, Criteria, KeyCase, MarshalError, Order, SchemaBuilder, TransferObject,
    TransferObjectCollection,
};
use serde_json::json;

#[derive(Debug, Default, Clone, PartialEq)]
struct MemberDto {
    display_name: String,
    age: u32,
}

impl TransferObject for MemberDto {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .field("displayName", |m: &Self| &m.display_name, |m, v| m.display_name = v)
            .field("age", |m: &Self| &m.age, |m, v| m.age = v)
    }
}

#[derive(Debug, Default)]
struct TeamDto {
    title: String,
    members: TransferObjectCollection<MemberDto>,
}

impl TransferObject for TeamDto {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .field("title", |t: &Self| &t.title, |t, v| t.title = v)
            .collection("members", |t: &Self| &t.members, |t, v| t.members = v)
    }
}

fn member(name: &str, age: u32) -> MemberDto {
    MemberDto {
        display_name: name.to_string(),
        age,
    }
}

fn two_members() -> TransferObjectCollection<MemberDto> {
    TransferObjectCollection::from_elements(vec![member("John", 30), member("Jane", 25)])
}

#[test]
fn test_basic_access() {
    let members = two_members();

    assert_eq!(members.len(), 2);
    assert!(!members.is_empty());
    assert_eq!(members.first(), Some(&member("John", 30)));
    assert_eq!(members.last(), Some(&member("Jane", 25)));
    assert_eq!(members.get(1), Some(&member("Jane", 25)));
    assert_eq!(members.keys(), vec![CollectionKey::Index(0), CollectionKey::Index(1)]);
    assert!(TransferObjectCollection::<MemberDto>::new().first().is_none());
}

#[test]
fn test_add_contains_remove() -> Result<()> {
    let mut members = two_members();

    let key = members.add(member("Max", 41))?;
    assert_eq!(key, CollectionKey::Index(2));
    assert!(members.contains(&member("Max", 41)));
    assert_eq!(members.index_of(&member("Max", 41)), Some(&CollectionKey::Index(2)));

    assert!(members.remove_element(&member("John", 30)));
    assert!(!members.remove_element(&member("John", 30)));
    assert_eq!(members.len(), 2);

    members.set("captain", member("Lea", 35));
    assert_eq!(members.get("captain").map(|m| m.age), Some(35));
    assert_eq!(members.remove("captain"), Some(member("Lea", 35)));
    Ok(())
}

#[test]
fn test_derived_operations_do_not_mutate_source() {
    let members = two_members();

    let older = members.filter(|_, m| m.age > 28);
    assert_eq!(older.len(), 1);
    assert_eq!(older.first(), Some(&member("John", 30)));

    let names = members.map(|m| m.display_name.clone());
    assert_eq!(names.values(), vec![&"John".to_string(), &"Jane".to_string()]);

    let (over, under) = members.partition(|_, m| m.age >= 30);
    assert_eq!((over.len(), under.len()), (1, 1));

    assert_eq!(members.len(), 2);
    assert_eq!(members, two_members());
}

#[test]
fn test_predicates_and_fold() {
    let members = two_members();

    assert!(members.exists(|_, m| m.display_name == "Jane"));
    assert!(members.for_all(|_, m| m.age > 18));
    assert_eq!(members.find_first(|_, m| m.age < 30), Some(&member("Jane", 25)));
    assert_eq!(members.fold(0, |total, m| total + m.age), 55);
    assert_eq!(members.slice(1, None).values(), vec![&member("Jane", 25)]);
}

#[test]
fn test_matching_orders_and_limits() -> Result<()> {
    let mut members = two_members();
    members.add(member("Max", 41))?;
    members.add(member("Tom", 19))?;

    let criteria = Criteria::new()
        .where_fn(|m: &MemberDto| m.age > 20)
        .order_by("age", Order::Descending)
        .max_results(2);
    let matched = members.matching(&criteria)?;

    let names: Vec<&str> = matched.iter().map(|(_, m)| m.display_name.as_str()).collect();
    assert_eq!(names, vec!["Max", "John"]);

    let criteria = Criteria::new()
        .order_by("display_name", Order::Ascending)
        .first_result(1);
    let matched = members.matching(&criteria)?;
    let names: Vec<&str> = matched.iter().map(|(_, m)| m.display_name.as_str()).collect();
    assert_eq!(names, vec!["John", "Max", "Tom"]);
    Ok(())
}

#[test]
fn test_list_and_keyed_marshalling() -> Result<()> {
    let members = two_members();
    assert_eq!(
        members.to_array()?,
        json!([{"displayName": "John", "age": 30}, {"displayName": "Jane", "age": 25}])
    );
    assert_eq!(
        members.to_cased_array(KeyCase::Snake)?,
        json!([{"display_name": "John", "age": 30}, {"display_name": "Jane", "age": 25}])
    );

    let keyed = TransferObjectCollection::<MemberDto>::from_array(json!({
        "lead": {"display_name": "Ann", "age": 50},
        "7": {"display_name": "Bob", "age": 20}
    }))?;
    assert_eq!(keyed.keys(), vec![CollectionKey::from("lead"), CollectionKey::Index(7)]);
    assert_eq!(
        keyed.to_array()?,
        json!({"lead": {"displayName": "Ann", "age": 50}, "7": {"displayName": "Bob", "age": 20}})
    );
    Ok(())
}

#[test]
fn test_collection_display_matches_to_json() -> Result<()> {
    let members = two_members();
    assert_eq!(members.to_string(), members.to_json()?);
    assert_eq!(
        members.to_string(),
        r#"[{"displayName":"John","age":30},{"displayName":"Jane","age":25}]"#
    );
    Ok(())
}

#[test]
fn test_collection_field_on_transfer_object() -> Result<()> {
    let team = TeamDto::from_json(
        r#"{"title":"Core","members":[{"display_name":"John","age":30},{"display_name":"Jane","age":25}]}"#,
    )?;
    assert_eq!(team.members, two_members());

    assert_eq!(
        team.to_snake_case_json()?,
        r#"{"title":"Core","members":[{"display_name":"John","age":30},{"display_name":"Jane","age":25}]}"#
    );
    Ok(())
}

#[test]
fn test_wire_keys_share_integer_slots() -> Result<()> {
    let mut keyed = TransferObjectCollection::<MemberDto>::from_array(json!({
        "3": {"display_name": "Ann", "age": 50}
    }))?;
    keyed.set("3", member("Bob", 20));
    assert_eq!(keyed.len(), 1);

    let round_trip = TransferObjectCollection::<MemberDto>::from_array(keyed.to_array()?)?;
    assert_eq!(round_trip, keyed);
    Ok(())
}

#[test]
fn test_add_after_largest_wire_key_is_rejected() -> Result<()> {
    let mut keyed = TransferObjectCollection::<MemberDto>::from_array(json!({
        "18446744073709551615": {"display_name": "Ann", "age": 50}
    }))?;

    let err = keyed.add(member("Bob", 20)).unwrap_err();
    assert!(matches!(err, MarshalError::CollectionKeyExhausted { .. }));
    assert_eq!(keyed.len(), 1);
    Ok(())
}

#[test]
fn test_collection_from_json_rejects_scalars() {
    assert!(TransferObjectCollection::<MemberDto>::from_json("42").is_err());
}
