// src/draft/fields.rs
//
// Nazwy pól formularza, np. `Variants[0].Colors[1].ColorName`, są jednocześnie
// nazwami inputów w HTML i kluczami błędów walidacji.

use std::fmt;
use std::str::FromStr;

use strum_macros::{Display, EnumString};

use super::{DraftError, ProductDraft};
use crate::models::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum ProductField {
    ProductName,
    Type,
    Material,
    Description,
    #[strum(serialize = "CategoryID")]
    CategoryId,
    IsRecommended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum VariantField {
    #[strum(serialize = "VariantID")]
    VariantId,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum ColorField {
    ColorName,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum SizeField {
    Length,
    Width,
    Thickness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    Product(ProductField),
    Variant {
        variant: usize,
        field: VariantField,
    },
    Color {
        variant: usize,
        color: usize,
        field: ColorField,
    },
    Size {
        variant: usize,
        size: usize,
        field: SizeField,
    },
}

fn indexed(segment: &str, name: &str) -> Option<usize> {
    segment
        .strip_prefix(name)?
        .strip_prefix('[')?
        .strip_suffix(']')?
        .parse()
        .ok()
}

impl FieldPath {
    pub fn parse(name: &str) -> Option<Self> {
        let segments: Vec<&str> = name.split('.').collect();
        match segments.as_slice() {
            [field] => ProductField::from_str(field).ok().map(FieldPath::Product),
            [variant, field] => Some(FieldPath::Variant {
                variant: indexed(variant, "Variants")?,
                field: VariantField::from_str(field).ok()?,
            }),
            [variant, nested, field] => {
                let variant = indexed(variant, "Variants")?;
                if let Some(color) = indexed(nested, "Colors") {
                    Some(FieldPath::Color {
                        variant,
                        color,
                        field: ColorField::from_str(field).ok()?,
                    })
                } else {
                    Some(FieldPath::Size {
                        variant,
                        size: indexed(nested, "Sizes")?,
                        field: SizeField::from_str(field).ok()?,
                    })
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Product(field) => write!(f, "{}", field),
            FieldPath::Variant { variant, field } => write!(f, "Variants[{}].{}", variant, field),
            FieldPath::Color {
                variant,
                color,
                field,
            } => write!(f, "Variants[{}].Colors[{}].{}", variant, color, field),
            FieldPath::Size {
                variant,
                size,
                field,
            } => write!(f, "Variants[{}].Sizes[{}].{}", variant, size, field),
        }
    }
}

fn is_checked(value: &str) -> bool {
    matches!(value, "on" | "true" | "1")
}

impl ProductDraft {
    /// Przepisuje wartości wysłane z formularza do szkicu.
    ///
    /// Checkbox `IsRecommended` nie jest wysyłany, gdy jest odznaczony, więc jego brak oznacza `false`.
    /// Nieznane pola i indeksy spoza zakresu (np. z nieaktualnego formularza) są pomijane.
    pub fn apply_fields(&mut self, fields: &[(String, String)]) {
        if fields.is_empty() {
            return;
        }
        self.is_recommended = false;
        for (name, value) in fields {
            let Some(path) = FieldPath::parse(name) else {
                continue;
            };
            if let Err(err) = self.set_field(path, value) {
                tracing::debug!("Pomijam nieaktualne pole '{}': {}", name, err);
            }
        }
    }

    pub fn set_field(&mut self, path: FieldPath, value: &str) -> Result<(), DraftError> {
        match path {
            FieldPath::Product(field) => match field {
                ProductField::ProductName => self.product_name = value.to_string(),
                ProductField::Type => self.product_type = value.to_string(),
                ProductField::Material => self.material = value.to_string(),
                ProductField::Description => self.description = value.to_string(),
                ProductField::CategoryId => {
                    let value = value.trim();
                    // Ten sam wybór zostawia identyfikator w dotychczasowej postaci (liczba albo napis)
                    let unchanged = self.category_id.as_ref().is_some_and(|id| id.matches(value));
                    if !unchanged {
                        self.category_id = if value.is_empty() {
                            None
                        } else {
                            value.parse::<EntityId>().ok()
                        };
                    }
                }
                ProductField::IsRecommended => self.is_recommended = is_checked(value),
            },
            FieldPath::Variant { variant, field } => {
                let target = self.variant_mut(variant)?;
                match field {
                    VariantField::VariantId => target.variant_id = value.to_string(),
                    VariantField::Finish => target.finish = value.to_string(),
                }
            }
            FieldPath::Color {
                variant,
                color,
                field,
            } => {
                let target = self.color_mut(variant, color)?;
                match field {
                    ColorField::ColorName => target.color_name = value.to_string(),
                    ColorField::Edge => target.edge = value.to_string(),
                }
            }
            FieldPath::Size {
                variant,
                size,
                field,
            } => {
                let target = self.size_mut(variant, size)?;
                match field {
                    SizeField::Length => target.length = value.to_string(),
                    SizeField::Width => target.width = value.to_string(),
                    SizeField::Thickness => target.thickness = value.to_string(),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_and_formats_every_level() {
        for name in [
            "ProductName",
            "CategoryID",
            "IsRecommended",
            "Variants[0].VariantID",
            "Variants[3].Finish",
            "Variants[1].Colors[12].ColorName",
            "Variants[0].Colors[0].Edge",
            "Variants[2].Sizes[4].Thickness",
        ] {
            let path = FieldPath::parse(name).unwrap_or_else(|| panic!("{} not parsed", name));
            assert_eq!(path.to_string(), name);
        }
    }

    #[test]
    fn rejects_unknown_or_malformed_names() {
        for name in [
            "",
            "Price",
            "Variants.VariantID",
            "Variants[x].VariantID",
            "Variants[0].Colors[0].Length",
            "Variants[0].Sizes[0].ColorName",
            "Variants[0].Colors[0].Images[0]",
            "image",
        ] {
            assert_eq!(FieldPath::parse(name), None, "{}", name);
        }
    }

    #[test]
    fn applies_posted_values_into_existing_structure() {
        let mut draft = ProductDraft::default();
        let v = draft.add_variant();
        draft.add_color(v).unwrap();
        draft.add_size(v).unwrap();
        draft.is_recommended = true;

        draft.apply_fields(&pairs(&[
            ("ProductName", "Travertine"),
            ("CategoryID", "4"),
            ("Variants[0].VariantID", "T-1"),
            ("Variants[0].Colors[0].ColorName", "Beige"),
            ("Variants[0].Sizes[0].Width", "30"),
            ("Variants[5].VariantID", "ghost"),
            ("image", ""),
        ]));

        assert_eq!(draft.product_name, "Travertine");
        assert_eq!(draft.category_id, Some(EntityId::Number(4)));
        assert!(!draft.is_recommended);
        assert_eq!(draft.variants.len(), 1);
        assert_eq!(draft.variants[0].variant_id, "T-1");
        assert_eq!(draft.variants[0].colors[0].color_name, "Beige");
        assert_eq!(draft.variants[0].sizes[0].width, "30");
    }

    #[test]
    fn checkbox_and_empty_category_handling() {
        let mut draft = ProductDraft {
            category_id: Some(EntityId::Number(1)),
            ..Default::default()
        };
        draft.apply_fields(&pairs(&[("IsRecommended", "on"), ("CategoryID", "")]));
        assert!(draft.is_recommended);
        assert_eq!(draft.category_id, None);

        draft.category_id = Some(EntityId::Text("5".into()));
        draft.apply_fields(&pairs(&[("CategoryID", "5")]));
        assert_eq!(draft.category_id, Some(EntityId::Text("5".into())));
        draft.apply_fields(&pairs(&[("CategoryID", "6")]));
        assert_eq!(draft.category_id, Some(EntityId::Number(6)));

        // Puste żądanie niczego nie zmienia
        draft.apply_fields(&[]);
        assert!(draft.is_recommended);
    }
}
