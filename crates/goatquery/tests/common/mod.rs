//! Shared dataset for integration tests.
//!
//! Seven users with managers (up to three levels deep), companies,
//! addresses and tags. Each test builds a fresh copy with [`users`].

#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use goatquery_rs::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

pub const STATUSES: &[&str] = &["Active", "Inactive", "Suspended"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
            Status::Suspended => "Suspended",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub id: Uuid,
    pub city: City,
    pub address_line1: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub department: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub age: i32,
    pub firstname: String,
    pub balance_decimal: Option<Decimal>,
    pub balance_double: Option<f64>,
    pub balance_float: Option<f32>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub is_email_verified: bool,
    pub status: Status,
    pub company: Option<Company>,
    pub manager: Option<Box<User>>,
    pub addresses: Vec<Address>,
    pub tags: Vec<String>,
}

/// A record whose field is queried under a different external name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomJsonPropertyUser {
    pub lastname: String,
}

// ==================== Schema ====================

impl Fields for City {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "Id" => Some(Value::from(self.id)),
            "Name" => Some(Value::from(&self.name)),
            "Country" => Some(Value::from(&self.country)),
            _ => None,
        }
    }
}

impl Entity for City {
    fn entity_type() -> EntityType {
        EntityType::new("City")
            .field("Id", ScalarKind::Guid)
            .field("Name", ScalarKind::String)
            .field("Country", ScalarKind::String)
    }
}

impl Fields for Address {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "Id" => Some(Value::from(self.id)),
            "City" => Some(Value::entity(&self.city)),
            "AddressLine1" => Some(Value::from(&self.address_line1)),
            _ => None,
        }
    }
}

impl Entity for Address {
    fn entity_type() -> EntityType {
        EntityType::new("Address")
            .field("Id", ScalarKind::Guid)
            .field("City", FieldKind::entity::<City>())
            .field("AddressLine1", ScalarKind::String)
    }
}

impl Fields for Company {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "Id" => Some(Value::from(self.id)),
            "Name" => Some(Value::from(&self.name)),
            "Department" => Some(Value::from(&self.department)),
            _ => None,
        }
    }
}

impl Entity for Company {
    fn entity_type() -> EntityType {
        EntityType::new("Company")
            .field("Id", ScalarKind::Guid)
            .field("Name", ScalarKind::String)
            .field("Department", ScalarKind::String)
    }
}

impl Fields for User {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "Id" => Some(Value::from(self.id)),
            "Age" => Some(Value::from(self.age)),
            "Firstname" => Some(Value::from(&self.firstname)),
            "BalanceDecimal" => Some(Value::from(self.balance_decimal)),
            "BalanceDouble" => Some(Value::from(self.balance_double)),
            "BalanceFloat" => Some(Value::from(self.balance_float)),
            "DateOfBirth" => Some(Value::from(self.date_of_birth)),
            "IsEmailVerified" => Some(Value::from(self.is_email_verified)),
            "Status" => Some(Value::Enum(self.status.as_str())),
            "Company" => Some(Value::optional_entity(self.company.as_ref())),
            "Manager" => Some(Value::optional_entity(self.manager.as_deref())),
            "Addresses" => Some(Value::entities(self.addresses.iter())),
            "Tags" => Some(Value::list(self.tags.iter())),
            _ => None,
        }
    }
}

impl Entity for User {
    fn entity_type() -> EntityType {
        EntityType::new("User")
            .renamed_field("Id", "UserId", ScalarKind::Guid)
            .field("Age", ScalarKind::I32)
            .field("Firstname", ScalarKind::String)
            .field("BalanceDecimal", FieldKind::optional(ScalarKind::Decimal))
            .field("BalanceDouble", FieldKind::optional(ScalarKind::F64))
            .field("BalanceFloat", FieldKind::optional(ScalarKind::F32))
            .field("DateOfBirth", FieldKind::optional(ScalarKind::DateTime))
            .field("IsEmailVerified", ScalarKind::Bool)
            .field("Status", ScalarKind::Enum(STATUSES))
            .field("Company", FieldKind::optional(FieldKind::entity::<Company>()))
            .field("Manager", FieldKind::optional(FieldKind::entity::<User>()))
            .field("Addresses", FieldKind::collection(FieldKind::entity::<Address>()))
            .field("Tags", FieldKind::collection(ScalarKind::String))
    }
}

impl Fields for CustomJsonPropertyUser {
    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "Lastname" => Some(Value::from(&self.lastname)),
            _ => None,
        }
    }
}

impl Entity for CustomJsonPropertyUser {
    fn entity_type() -> EntityType {
        EntityType::new("CustomJsonPropertyUser").renamed_field(
            "Lastname",
            "last_name",
            ScalarKind::String,
        )
    }
}

// ==================== Dataset ====================

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single()
}

fn guid(text: &str) -> Uuid {
    Uuid::parse_str(text).unwrap()
}

fn decimal(text: &str) -> Option<Decimal> {
    Some(Decimal::from_str(text).unwrap())
}

fn address(line: &str, city: &str) -> Address {
    Address {
        address_line1: line.to_string(),
        city: City {
            name: city.to_string(),
            country: "USA".to_string(),
            ..City::default()
        },
        ..Address::default()
    }
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|t| t.to_string()).collect()
}

fn manager_01() -> User {
    User {
        id: guid("671e6bac-b6de-4cc7-b3e9-1a6ac4546b43"),
        age: 16,
        firstname: "Manager 01".to_string(),
        date_of_birth: utc(2000, 1, 1, 0, 0, 0),
        balance_decimal: decimal("2.00"),
        is_email_verified: false,
        ..User::default()
    }
}

fn manager_02() -> User {
    User {
        age: 18,
        firstname: "Manager 02".to_string(),
        date_of_birth: utc(1999, 4, 21, 0, 0, 0),
        balance_decimal: decimal("19.00"),
        is_email_verified: true,
        manager: Some(Box::new(User {
            age: 30,
            firstname: "Manager 03".to_string(),
            date_of_birth: utc(1993, 4, 21, 0, 0, 0),
            balance_decimal: decimal("29.00"),
            is_email_verified: true,
            manager: Some(Box::new(User {
                age: 40,
                firstname: "Manager 04".to_string(),
                date_of_birth: utc(1983, 4, 21, 0, 0, 0),
                balance_decimal: decimal("39.00"),
                is_email_verified: true,
                ..User::default()
            })),
            company: Some(Company {
                name: "My Test Company".to_string(),
                department: "Development".to_string(),
                ..Company::default()
            }),
            ..User::default()
        })),
        ..User::default()
    }
}

/// The dataset in insertion order: John, Jane, Apple, Harry, Doe, Egg, NullUser.
pub fn users() -> Vec<User> {
    vec![
        User {
            age: 2,
            firstname: "John".to_string(),
            date_of_birth: utc(2004, 1, 31, 23, 59, 59),
            balance_decimal: decimal("1.50"),
            is_email_verified: true,
            addresses: vec![
                address("123 Main St", "New York"),
                address("456 Oak Ave", "Boston"),
            ],
            manager: Some(Box::new(manager_01())),
            ..User::default()
        },
        User {
            id: guid("01998fda-e310-793c-bd8d-f6a92f87b31b"),
            age: 9,
            firstname: "Jane".to_string(),
            date_of_birth: utc(2020, 5, 9, 15, 30, 0),
            balance_decimal: decimal("0"),
            is_email_verified: false,
            status: Status::Inactive,
            addresses: vec![address("789 Pine Rd", "Seattle")],
            company: Some(Company {
                name: "Acme Corp".to_string(),
                department: "Sales".to_string(),
                ..Company::default()
            }),
            ..User::default()
        },
        User {
            age: 1,
            firstname: "Apple".to_string(),
            date_of_birth: utc(1980, 12, 31, 0, 0, 1),
            balance_float: Some(1204050.98),
            is_email_verified: true,
            addresses: vec![
                address("321 Elm St", "Chicago"),
                address("654 Maple Dr", "New York"),
            ],
            manager: Some(Box::new(manager_01())),
            tags: tags(&["vip", "premium"]),
            ..User::default()
        },
        User {
            id: guid("e4c7772b-8947-4e46-98ed-644b417d2a08"),
            age: 1,
            firstname: "Harry".to_string(),
            date_of_birth: utc(2002, 8, 1, 0, 0, 0),
            balance_decimal: decimal("0.5372958205929493"),
            is_email_verified: false,
            status: Status::Suspended,
            ..User::default()
        },
        User {
            age: 1,
            firstname: "Doe".to_string(),
            date_of_birth: utc(2023, 7, 26, 12, 0, 30),
            is_email_verified: true,
            addresses: vec![address("999 Broadway", "Los Angeles")],
            ..User::default()
        },
        User {
            age: 33,
            firstname: "Egg".to_string(),
            date_of_birth: utc(2000, 1, 1, 0, 0, 0),
            balance_double: Some(1334534453453433.33435443343231235652),
            is_email_verified: false,
            addresses: vec![
                address("777 First Ave", "Miami"),
                address("888 Second St", "Orlando"),
            ],
            manager: Some(Box::new(manager_02())),
            tags: tags(&["premium"]),
            ..User::default()
        },
        User {
            age: 4,
            firstname: "NullUser".to_string(),
            is_email_verified: true,
            status: Status::Inactive,
            ..User::default()
        },
    ]
}

/// Returns the first names of `users`, in order.
pub fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|user| user.firstname.as_str()).collect()
}
