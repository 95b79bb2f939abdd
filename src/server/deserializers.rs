use serde::{Deserialize, Deserializer};
use serde_aux::field_attributes::deserialize_number_from_string;

// the frontend builds ids from JSON object keys, so they may arrive as "2" as well as 2
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct NumericId(#[serde(deserialize_with = "deserialize_number_from_string")] pub i64);

pub fn into_ids(ids: Vec<NumericId>) -> Vec<i64> {
    ids.into_iter().map(|id| id.0).collect()
}

// search boxes may post a bare number, which still searches as text
pub fn deserialize_option_string_from_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|value| match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}
