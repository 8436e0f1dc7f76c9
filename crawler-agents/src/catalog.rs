use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};

/// One catalog record: a pattern matching a crawler's User-Agent
/// strings, plus its metadata.
#[derive(Deserialize, Serialize, PartialEq, Eq, Debug, Clone)]
pub struct Crawler {
    /// Regex matching the crawler's User-Agent strings. Never empty.
    #[serde(deserialize_with = "non_empty")]
    pub pattern: String,
    /// Date the crawler was added to the catalog (UTC), `YYYY/MM/DD`
    /// in the JSON form.
    #[serde(default, with = "slash_date", skip_serializing_if = "Option::is_none")]
    pub addition_date: Option<NaiveDate>,
    /// Official URL of the robot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Examples of full User-Agent strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<String>,
}

fn non_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        Err(de::Error::custom("empty pattern in crawler record"))
    } else {
        Ok(s)
    }
}

mod slash_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y/%m/%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)?.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, FORMAT)
                .map(Some)
                .map_err(de::Error::custom),
        }
    }
}
