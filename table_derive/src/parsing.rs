//! Parsing utilities for entity attributes
//!
//! This module handles `#[table]`, `#[relation]` and the field markers
//! (`#[primary_key]`, `#[soft_delete]`, `#[unique]`), and validates every
//! identifier at expansion time.

use syn::{Attribute, Data, Error, Fields, Ident, LitStr, Result, Type};

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .and_then(|()| {
            if is_reserved_keyword(name) {
                Err(format!("Name '{}' is a reserved SQL keyword", name))
            } else {
                Ok(())
            }
        })
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Validate column name and return syn::Error for better proc macro error handling
pub fn validate_column_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid column name '{}': {}", name, e)))
}

/// Same rules the runtime identifier validator applies, minus the keyword list
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    // PostgreSQL limit
    if name.len() > 63 {
        return Err(format!(
            "Name '{}' is too long: {} characters (max 63)",
            name,
            name.len()
        ));
    }

    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(format!(
            "Name '{}' must start with a letter or underscore",
            name
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Name '{}' contains invalid characters: only alphanumeric characters and underscores are allowed", name));
    }

    Ok(())
}

fn is_reserved_keyword(name: &str) -> bool {
    const RESERVED_KEYWORDS: &[&str] = &[
        "SELECT", "INSERT", "UPDATE", "DELETE", "FROM", "WHERE", "JOIN", "INNER", "LEFT",
        "RIGHT", "FULL", "OUTER", "ON", "AS", "AND", "OR", "NOT", "NULL", "TRUE", "FALSE",
        "CASE", "WHEN", "THEN", "ELSE", "END", "EXISTS", "IN", "LIKE", "ILIKE", "BETWEEN",
        "ORDER", "BY", "GROUP", "HAVING", "LIMIT", "OFFSET", "UNION", "ALL", "DISTINCT",
        "CREATE", "DROP", "ALTER", "TABLE", "INDEX", "VIEW", "PRIMARY", "FOREIGN", "REFERENCES",
        "UNIQUE", "CHECK", "DEFAULT", "CONSTRAINT", "COLUMN", "USER", "RETURNING",
    ];

    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}

#[derive(Debug)]
pub struct RelationInfo {
    pub name: String,
    pub table: String,
    pub local_key: String,
    pub foreign_key: String,
}

#[derive(Debug)]
pub struct TableInfo {
    pub name: String,
    /// Entity name used in message keys; defaults to the snake-cased struct name
    pub entity: Option<String>,
    pub relations: Vec<RelationInfo>,
}

#[derive(Debug)]
pub struct ColumnInfo {
    pub ident: Ident,
    pub name: String,
    pub ty: Type,
}

#[derive(Debug)]
pub struct FieldInfo {
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Ident,
    pub soft_delete_field: Option<String>,
    pub unique_fields: Vec<String>,
}

pub fn parse_table_attributes(attrs: &[Attribute]) -> Result<TableInfo> {
    let mut table_name: Option<LitStr> = None;
    let mut entity = None;
    let mut relations = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    table_name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("entity") {
                    let lit: LitStr = meta.value()?.parse()?;
                    validate_column_name_syn(&lit.value(), lit.span())?;
                    entity = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute, expected `name` or `entity`"))
                }
            })?;
        } else if attr.path().is_ident("relation") {
            relations.push(parse_relation(attr)?);
        }
    }

    let table_name = table_name.ok_or_else(|| {
        Error::new(
            proc_macro2::Span::call_site(),
            "table attribute is required: add #[table(name = \"table_name\")] to your struct",
        )
    })?;
    validate_table_name_syn(&table_name.value(), table_name.span())?;

    Ok(TableInfo {
        name: table_name.value(),
        entity,
        relations,
    })
}

/// `#[relation(name = "category", table = "categories", local_key = "category_id")]`
///
/// `foreign_key` defaults to `id`.
fn parse_relation(attr: &Attribute) -> Result<RelationInfo> {
    let mut name = None;
    let mut table = None;
    let mut local_key = None;
    let mut foreign_key = None;

    attr.parse_nested_meta(|meta| {
        let slot = if meta.path.is_ident("name") {
            &mut name
        } else if meta.path.is_ident("table") {
            &mut table
        } else if meta.path.is_ident("local_key") {
            &mut local_key
        } else if meta.path.is_ident("foreign_key") {
            &mut foreign_key
        } else {
            return Err(meta.error(
                "unsupported relation attribute, expected `name`, `table`, `local_key` or `foreign_key`",
            ));
        };
        let lit: LitStr = meta.value()?.parse()?;
        *slot = Some(lit);
        Ok(())
    })?;

    let required = |value: Option<LitStr>, key: &str| {
        value.ok_or_else(|| Error::new_spanned(attr, format!("relation requires `{}`", key)))
    };
    let name = required(name, "name")?;
    let table = required(table, "table")?;
    let local_key = required(local_key, "local_key")?;

    validate_column_name_syn(&name.value(), name.span())?;
    validate_table_name_syn(&table.value(), table.span())?;
    validate_column_name_syn(&local_key.value(), local_key.span())?;
    if let Some(foreign_key) = &foreign_key {
        validate_column_name_syn(&foreign_key.value(), foreign_key.span())?;
    }

    Ok(RelationInfo {
        name: name.value(),
        table: table.value(),
        local_key: local_key.value(),
        foreign_key: foreign_key.map(|f| f.value()).unwrap_or_else(|| "id".to_string()),
    })
}

pub fn parse_field_attributes(data: &Data) -> Result<FieldInfo> {
    if let Data::Struct(data_struct) = data {
        if let Fields::Named(fields_named) = &data_struct.fields {
            let mut columns = Vec::new();
            let mut primary_key = None;
            let mut soft_delete_field = None;
            let mut unique_fields = Vec::new();

            for field in &fields_named.named {
                let field_name = field
                    .ident
                    .as_ref()
                    .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;
                let field_name_str = field_name.to_string();
                let field_name_str = field_name_str
                    .strip_prefix("r#")
                    .unwrap_or(&field_name_str)
                    .to_string();

                validate_column_name_syn(&field_name_str, field_name.span())?;

                if has_attribute(&field.attrs, "primary_key") {
                    if primary_key.is_some() {
                        return Err(Error::new_spanned(
                            field,
                            "only one #[primary_key] field is supported",
                        ));
                    }
                    primary_key = Some(field_name.clone());
                }

                if has_attribute(&field.attrs, "soft_delete") {
                    if soft_delete_field.is_some() {
                        return Err(Error::new_spanned(
                            field,
                            "only one #[soft_delete] field is supported",
                        ));
                    }
                    soft_delete_field = Some(field_name_str.clone());
                }

                if has_attribute(&field.attrs, "unique") {
                    unique_fields.push(field_name_str.clone());
                }

                columns.push(ColumnInfo {
                    ident: field_name.clone(),
                    name: field_name_str,
                    ty: field.ty.clone(),
                });
            }

            // Fall back to a field literally named `id`
            let primary_key = match primary_key {
                Some(pk) => pk,
                None => columns
                    .iter()
                    .find(|c| c.name == "id")
                    .map(|c| c.ident.clone())
                    .ok_or_else(|| {
                        Error::new(
                            proc_macro2::Span::call_site(),
                            "Entity requires a #[primary_key] field or a field named `id`",
                        )
                    })?,
            };

            return Ok(FieldInfo {
                columns,
                primary_key,
                soft_delete_field,
                unique_fields,
            });
        }
    }

    Err(Error::new(
        proc_macro2::Span::call_site(),
        "Entity can only be derived for structs with named fields",
    ))
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

/// `ProductVariant` -> `product_variant`
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `category_id` -> `CategoryId`
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
