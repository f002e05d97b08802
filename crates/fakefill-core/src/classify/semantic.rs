use serde::{Deserialize, Serialize};
use std::fmt;

/// Real-world meaning inferred from a column name.
///
/// A matched category overrides the column's declared type when choosing a
/// generator, so `idade VARCHAR` still receives an age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Name,
    FirstName,
    LastName,
    City,
    Email,
    Phone,
    Address,
    State,
    Country,
    Company,
    Job,
    Product,
    Category,
    Age,
    Value,
}

impl FieldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Name => "name",
            FieldCategory::FirstName => "first_name",
            FieldCategory::LastName => "last_name",
            FieldCategory::City => "city",
            FieldCategory::Email => "email",
            FieldCategory::Phone => "phone",
            FieldCategory::Address => "address",
            FieldCategory::State => "state",
            FieldCategory::Country => "country",
            FieldCategory::Company => "company",
            FieldCategory::Job => "job",
            FieldCategory::Product => "product",
            FieldCategory::Category => "category",
            FieldCategory::Age => "age",
            FieldCategory::Value => "value",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
