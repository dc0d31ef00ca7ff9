use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use dto_marshal::{
    Entity, EntityRegistry, EntitySchemaBuilder, MarshalError, SchemaBuilder, TransferObject,
};

#[derive(Debug, Default, Clone)]
struct AddressDto {
    city: Option<String>,
    zip_code: Option<String>,
}

impl TransferObject for AddressDto {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .field("city", |a: &Self| &a.city, |a, v| a.city = v)
            .field("zipCode", |a: &Self| &a.zip_code, |a, v| a.zip_code = v)
    }
}

#[derive(Debug, Default, Clone)]
struct CustomerDto {
    name: Option<String>,
    email: Option<String>,
    address: Option<AddressDto>,
    joined_at: Option<DateTime<FixedOffset>>,
    credit: Option<i64>,
}

impl TransferObject for CustomerDto {
    fn describe(schema: SchemaBuilder<Self>) -> SchemaBuilder<Self> {
        schema
            .field("name", |c: &Self| &c.name, |c, v| c.name = v)
            .field("email", |c: &Self| &c.email, |c, v| c.email = v)
            .nested("address", |c: &Self| c.address.as_ref(), |c, v| c.address = Some(v))
            .date("joinedAt", |c: &Self| c.joined_at.as_ref(), |c, v| c.joined_at = Some(v))
            .field("credit", |c: &Self| &c.credit, |c, v| c.credit = v)
    }
}

#[derive(Debug, PartialEq)]
struct Address {
    city: String,
    zip_code: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            city: "unknown".to_string(),
            zip_code: String::new(),
        }
    }
}

impl Entity for Address {
    fn describe(schema: EntitySchemaBuilder<Self>) -> EntitySchemaBuilder<Self> {
        schema
            .field("city", |a, v| a.city = v)
            .field("zipCode", |a, v| a.zip_code = v)
    }
}

#[derive(Debug, PartialEq)]
struct Customer {
    name: String,
    email: String,
    address: Option<Address>,
    joined_at: Option<DateTime<Utc>>,
    credit: i64,
}

impl Default for Customer {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: "nobody@example.com".to_string(),
            address: None,
            joined_at: None,
            credit: 100,
        }
    }
}

impl Entity for Customer {
    fn describe(schema: EntitySchemaBuilder<Self>) -> EntitySchemaBuilder<Self> {
        schema
            .field("name", |c, v| c.name = v)
            .field("email", |c, v| c.email = v)
            .nested("address", |c, v: Address| c.address = Some(v))
            .date("joinedAt", |c, v| c.joined_at = Some(v))
            .readonly("credit")
    }
}

/// Stores the address as plain text; a nested transfer object cannot land here.
#[derive(Debug, Default)]
struct FlatCustomer {
    address: String,
}

impl Entity for FlatCustomer {
    fn describe(schema: EntitySchemaBuilder<Self>) -> EntitySchemaBuilder<Self> {
        schema.field("address", |c, v| c.address = v)
    }
}

fn customer_dto() -> CustomerDto {
    CustomerDto {
        name: Some("Ann".to_string()),
        email: None,
        address: Some(AddressDto {
            city: Some("Taipei".to_string()),
            zip_code: None,
        }),
        joined_at: Some(DateTime::parse_from_rfc3339("2023-10-27T10:00:00+08:00").unwrap()),
        credit: Some(5),
    }
}

#[test]
fn test_projection_skips_nulls() -> Result<()> {
    let dto = CustomerDto {
        name: Some("Ann".to_string()),
        ..Default::default()
    };
    let customer: Customer = dto.to_entity()?;

    assert_eq!(customer.name, "Ann");
    assert_eq!(customer.email, "nobody@example.com");
    assert!(customer.address.is_none());
    Ok(())
}

#[test]
fn test_nested_entity_recursion() -> Result<()> {
    let customer: Customer = customer_dto().to_entity()?;

    assert_eq!(
        customer.address,
        Some(Address {
            city: "Taipei".to_string(),
            zip_code: String::new(),
        })
    );
    assert_eq!(
        customer.joined_at.map(|d| d.to_rfc3339()),
        Some("2023-10-27T02:00:00+00:00".to_string())
    );
    Ok(())
}

#[test]
fn test_readonly_entity_field_is_skipped() -> Result<()> {
    let customer: Customer = customer_dto().to_entity()?;
    assert_eq!(customer.credit, 100);
    Ok(())
}

#[test]
fn test_projection_into_live_instance() -> Result<()> {
    let mut customer = Customer {
        email: "ann@example.com".to_string(),
        ..Default::default()
    };
    customer_dto().to_entity_into(&mut customer)?;

    assert_eq!(customer.name, "Ann");
    assert_eq!(customer.email, "ann@example.com");
    Ok(())
}

#[test]
fn test_registry_lookup() -> Result<()> {
    let mut registry = EntityRegistry::new();
    registry.register::<Customer>("Customer");

    let boxed = customer_dto().to_entity_named(&registry, "Customer")?;
    let customer = boxed.downcast::<Customer>().map_err(|_| anyhow::anyhow!("wrong entity type"))?;
    assert_eq!(customer.name, "Ann");

    let err = customer_dto().to_entity_named(&registry, "Invoice").unwrap_err();
    assert!(matches!(err, MarshalError::EntityNotFound { ref name } if name == "Invoice"));
    Ok(())
}

#[test]
fn test_unresolvable_nested_target() {
    let err = customer_dto().to_entity::<FlatCustomer>().unwrap_err();
    assert!(matches!(err, MarshalError::FieldResolution { ref field, .. } if field == "address"));
}
