use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// `null` decodes to the zero value, same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_records<'de, D, V>(deserializer: D) -> Result<HashMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Default + Deserialize<'de>,
{
    let records: Option<HashMap<String, Option<V>>> = Option::deserialize(deserializer)?;
    Ok(records
        .unwrap_or_default()
        .into_iter()
        .map(|(id, record)| (id, record.unwrap_or_default()))
        .collect())
}

/// Catalog entry from the `mapping` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemMapping {
    #[serde(deserialize_with = "null_as_default")]
    pub id: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub examine: String,
    #[serde(deserialize_with = "null_as_default")]
    pub members: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub icon: String,
    pub highalch: Option<i64>,
    pub lowalch: Option<i64>,
    pub limit: Option<i64>,
}

impl ItemMapping {
    pub fn members_label(&self) -> &'static str {
        if self.members {
            "true"
        } else {
            "false"
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AveragePrice {
    pub avg_high_price: Option<i64>,
    pub high_price_volume: Option<i64>,
    pub avg_low_price: Option<i64>,
    pub low_price_volume: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LatestPrice {
    pub high: Option<i64>,
    pub high_time: Option<i64>,
    pub low: Option<i64>,
    pub low_time: Option<i64>,
}

/// Response of the `5m` and `1h` endpoints, keyed by stringified item id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Averages {
    #[serde(deserialize_with = "nullable_records")]
    pub data: HashMap<String, AveragePrice>,
}

/// Response of the `latest` endpoint, keyed by stringified item id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Latest {
    #[serde(deserialize_with = "nullable_records")]
    pub data: HashMap<String, LatestPrice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_with_missing_optionals() {
        let items: Vec<ItemMapping> = serde_json::from_str(
            r#"[
                {"id":4151,"name":"Abyssal whip","value":120000,"examine":"A weapon from the abyss.",
                 "members":true,"icon":"Abyssal whip.png","highalch":72000,"lowalch":48000,"limit":70},
                {"id":2,"name":"Cannonball","value":5,"members":true,"icon":"Cannonball.png"}
            ]"#,
        )
        .unwrap();

        assert_eq!(items[0].highalch, Some(72000));
        assert_eq!(items[0].limit, Some(70));
        assert_eq!(items[0].members_label(), "true");
        assert_eq!(items[1].examine, "");
        assert_eq!(items[1].highalch, None);
        assert_eq!(items[1].lowalch, None);
        assert_eq!(items[1].limit, None);
    }

    #[test]
    fn null_and_absent_are_both_none() {
        let averages: Averages = serde_json::from_str(
            r#"{"data":{"4151":{"avgHighPrice":2500000,"highPriceVolume":null,"avgLowPrice":0}},
                "timestamp":1700000000}"#,
        )
        .unwrap();
        let whip = &averages.data["4151"];

        assert_eq!(whip.avg_high_price, Some(2500000));
        assert_eq!(whip.high_price_volume, None);
        // zero is a value, not an absence
        assert_eq!(whip.avg_low_price, Some(0));
        assert_eq!(whip.low_price_volume, None);
    }

    #[test]
    fn latest_records() {
        let latest: Latest = serde_json::from_str(
            r#"{"data":{"4151":{"high":2510000,"highTime":1700000100,"low":null,"lowTime":1699999000}}}"#,
        )
        .unwrap();

        assert_eq!(
            latest.data["4151"],
            LatestPrice {
                high: Some(2510000),
                high_time: Some(1700000100),
                low: None,
                low_time: Some(1699999000),
            }
        );
    }

    #[test]
    fn missing_data_is_empty() {
        let latest: Latest = serde_json::from_str("{}").unwrap();
        assert!(latest.data.is_empty());
    }

    #[test]
    fn null_mapping_fields_are_zero_values() {
        let items: Vec<ItemMapping> = serde_json::from_str(
            r#"[{"id":4151,"name":"Abyssal whip","value":null,"examine":null,
                 "members":null,"icon":null,"highalch":null}]"#,
        )
        .unwrap();

        assert_eq!(
            items[0],
            ItemMapping {
                id: 4151,
                name: "Abyssal whip".to_string(),
                ..ItemMapping::default()
            }
        );
    }

    #[test]
    fn null_data_and_records_are_empty() {
        let averages: Averages = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(averages.data.is_empty());

        let latest: Latest =
            serde_json::from_str(r#"{"data":{"4151":null,"2":{"high":182}}}"#).unwrap();
        assert_eq!(latest.data["4151"], LatestPrice::default());
        assert_eq!(latest.data["2"].high, Some(182));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(serde_json::from_str::<Vec<ItemMapping>>(r#"{"data":{}}"#).is_err());
        assert!(serde_json::from_str::<Averages>(r#"{"data":[1,2,3]}"#).is_err());
    }
}
