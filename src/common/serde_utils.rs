use serde::{Deserialize, Deserializer};

/// Distingue campo ausente (`None`) de `null` explícito (`Some(None)`) em updates parciais.
/// Usar junto com `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        email: Option<Option<String>>,
    }

    #[test]
    fn missing_null_and_value_are_distinct() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"email":null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"email":"a@b.es"}"#).unwrap();

        assert_eq!(missing.email, None);
        assert_eq!(null.email, Some(None));
        assert_eq!(value.email, Some(Some("a@b.es".to_string())));
    }
}
