use crate::classify::semantic::FieldCategory;

/// Synonyms recognized for each category, English and Portuguese.
///
/// Matching is exact against the normalized column name; the first category
/// listing the name wins.
static CATEGORY_SYNONYMS: &[(FieldCategory, &[&str])] = &[
    (FieldCategory::Name, &["name", "nome", "full_name"]),
    (FieldCategory::FirstName, &["primeiro_nome", "first_name"]),
    (FieldCategory::LastName, &["sobrenome", "last_name"]),
    (FieldCategory::City, &["city", "cidade"]),
    (FieldCategory::Email, &["email", "e-mail"]),
    (
        FieldCategory::Phone,
        &["phone", "telefone", "celular", "mobile"],
    ),
    (
        FieldCategory::Address,
        &["address", "endereco", "rua", "logradouro"],
    ),
    (FieldCategory::State, &["state", "estado", "province"]),
    (FieldCategory::Country, &["country", "pais"]),
    (FieldCategory::Company, &["company", "empresa"]),
    (FieldCategory::Job, &["job", "profissao", "cargo"]),
    (FieldCategory::Product, &["product", "produto"]),
    (FieldCategory::Category, &["category", "categoria"]),
    (FieldCategory::Age, &["age", "idade"]),
    (
        FieldCategory::Value,
        &["value", "valor", "price", "preço"],
    ),
];

/// Detect the semantic category of a column from its name.
pub fn detect_category(column_name: &str) -> Option<FieldCategory> {
    let normalized = normalize_column_name(column_name);
    CATEGORY_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.contains(&normalized.as_str()))
        .map(|(category, _)| *category)
}

/// Lowercase (Unicode-aware) and trim surrounding whitespace.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Every synonym with its category, in table order.
pub fn known_synonyms() -> impl Iterator<Item = (&'static str, FieldCategory)> {
    CATEGORY_SYNONYMS
        .iter()
        .flat_map(|(category, synonyms)| synonyms.iter().map(move |s| (*s, *category)))
}
