// src/models.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identyfikator nadawany przez zewnętrzne API.
/// API bywa niekonsekwentne (liczby albo napisy), więc przyjmujemy oba warianty
/// i odsyłamy je w niezmienionej postaci.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => f.write_str(s),
        }
    }
}

impl EntityId {
    /// Porównuje z identyfikatorem w postaci tekstowej (z URL-a lub pola formularza).
    /// `Number(12)` i `Text("12")` odpowiadają temu samemu napisowi "12".
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            EntityId::Number(n) => raw.trim().parse::<i64>() == Ok(*n),
            EntityId::Text(s) => s.as_str() == raw.trim(),
        }
    }

    pub fn same_as(&self, other: &EntityId) -> bool {
        self.matches(&other.to_string())
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => EntityId::Number(n),
            Err(_) => EntityId::Text(s.to_string()),
        })
    }
}

// Wymiary i identyfikatory wariantów przychodzą z API raz jako napis, raz jako liczba.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "oczekiwano napisu lub liczby, otrzymano: {}",
            other
        ))),
    }
}

// `null` zapisany w API traktujemy jak brak pola.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(rename = "CategoryID")]
    pub id: EntityId,
    #[serde(rename = "CategoryName")]
    pub name: String,
    #[serde(rename = "CategoryImage", default, deserialize_with = "lenient_string")]
    pub image: String,
}

/// Treść żądania POST/PUT dla kategorii.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryPayload {
    #[serde(rename = "CategoryName")]
    pub name: String,
    #[serde(rename = "CategoryImage")]
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
    #[serde(rename = "Length", default, deserialize_with = "lenient_string")]
    pub length: String,
    #[serde(rename = "Width", default, deserialize_with = "lenient_string")]
    pub width: String,
    #[serde(rename = "Thickness", default, deserialize_with = "lenient_string")]
    pub thickness: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Color {
    #[serde(rename = "ColorName", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "Edge", default, deserialize_with = "lenient_string")]
    pub edge: String,
    #[serde(rename = "Images", default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    #[serde(rename = "VariantID", default, deserialize_with = "lenient_string")]
    pub variant_id: String,
    #[serde(rename = "Finish", default, deserialize_with = "lenient_string")]
    pub finish: String,
    #[serde(rename = "Colors", default, deserialize_with = "null_as_default")]
    pub colors: Vec<Color>,
    #[serde(rename = "Sizes", default, deserialize_with = "null_as_default")]
    pub sizes: Vec<Size>,
}

/// Produkt w kształcie używanym przez API, zarówno w odpowiedziach jak i w payloadzie.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(rename = "ProductId", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(rename = "ProductName", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "Type", default, deserialize_with = "lenient_string")]
    pub product_type: String,
    #[serde(rename = "Material", default, deserialize_with = "lenient_string")]
    pub material: String,
    #[serde(rename = "Description", default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(rename = "CategoryID", default)]
    pub category_id: Option<EntityId>,
    // Tylko do wyświetlania, nigdy nie odsyłamy
    #[serde(rename = "CategoryName", default, skip_serializing)]
    pub category_name: Option<String>,
    #[serde(rename = "IsRecommended", default, deserialize_with = "null_as_default")]
    pub is_recommended: bool,
    #[serde(rename = "Variants", default, deserialize_with = "null_as_default")]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Plik obrazu odebrany z formularza, przekazywany dalej do `/upload`.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_id_keeps_wire_representation() {
        let numeric: EntityId = serde_json::from_value(json!(7)).unwrap();
        let text: EntityId = serde_json::from_value(json!("abc-1")).unwrap();
        assert_eq!(numeric, EntityId::Number(7));
        assert_eq!(text, EntityId::Text("abc-1".into()));
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!(7));
        assert_eq!("12".parse::<EntityId>().unwrap(), EntityId::Number(12));
        assert_eq!(EntityId::Text("x".into()).to_string(), "x");
    }

    #[test]
    fn entity_id_matches_by_text_form() {
        let text = EntityId::Text("12".into());
        assert!(text.matches("12"));
        assert!(EntityId::Number(12).matches("12"));
        assert!(!text.matches("13"));
        assert!(!EntityId::Text("abc".into()).matches("12"));
        assert!(text.same_as(&EntityId::Number(12)));
        assert!(!text.same_as(&EntityId::Text("12a".into())));
    }

    #[test]
    fn product_accepts_numeric_dimensions_and_missing_fields() {
        let product: Product = serde_json::from_value(json!({
            "ProductId": 3,
            "ProductName": "Marble",
            "CategoryID": 1,
            "CategoryName": "Tiles",
            "Variants": [{
                "VariantID": 10,
                "Colors": [{ "ColorName": "White", "Images": ["http://x/a.png"] }],
                "Sizes": [{ "Length": 60, "Width": "30", "Thickness": 1.5 }]
            }]
        }))
        .unwrap();

        assert_eq!(product.id, Some(EntityId::Number(3)));
        assert!(!product.is_recommended);
        let variant = &product.variants[0];
        assert_eq!(variant.variant_id, "10");
        assert_eq!(variant.finish, "");
        assert_eq!(variant.sizes[0].length, "60");
        assert_eq!(variant.sizes[0].thickness, "1.5");
    }

    #[test]
    fn product_treats_null_collections_and_flags_as_empty() {
        let product: Product = serde_json::from_value(json!({
            "ProductId": 1,
            "ProductName": "Onyx",
            "IsRecommended": null,
            "Variants": null
        }))
        .unwrap();
        assert!(!product.is_recommended);
        assert!(product.variants.is_empty());

        let variant: Variant = serde_json::from_value(json!({
            "VariantID": "V1",
            "Colors": [{ "ColorName": "Black", "Images": null }],
            "Sizes": null
        }))
        .unwrap();
        assert!(variant.colors[0].images.is_empty());
        assert!(variant.sizes.is_empty());
    }

    #[test]
    fn product_payload_omits_display_only_fields() {
        let product = Product {
            name: "Marble".into(),
            category_id: Some(EntityId::Number(1)),
            category_name: Some("Tiles".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&product).unwrap();
        assert!(value.get("CategoryName").is_none());
        assert!(value.get("ProductId").is_none());
        assert_eq!(value["ProductName"], json!("Marble"));
        assert_eq!(value["Variants"], json!([]));
    }
}
