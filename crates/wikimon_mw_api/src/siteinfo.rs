use crate::error::MwApiError;
use serde_json::{Map, Value};
use wikimon_domain::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteInfoProp {
    General,
    Statistics,
}

impl SiteInfoProp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Statistics => "statistics",
        }
    }
}

/// Query parameters for `action=query&meta=siteinfo` with the given props.
pub fn siteinfo_params(props: &[SiteInfoProp]) -> Vec<(&'static str, String)> {
    let siprop = props
        .iter()
        .map(SiteInfoProp::as_str)
        .collect::<Vec<_>>()
        .join("|");
    vec![
        ("action", "query".to_string()),
        ("meta", "siteinfo".to_string()),
        ("siprop", siprop),
        ("format", "json".to_string()),
    ]
}

/// The `query.statistics` and `query.general` objects of a siteinfo response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteInfo {
    pub statistics: Map<String, Value>,
    pub general: Map<String, Value>,
}

impl SiteInfo {
    /// Absent sections decode as empty maps. Sections of the wrong JSON type
    /// make the whole response unusable.
    pub fn from_response(response: &Value) -> Result<Self, MwApiError> {
        let root = response
            .as_object()
            .ok_or_else(|| MwApiError::MalformedResponse("response is not a JSON object".into()))?;

        let query = match root.get("query") {
            None => return Ok(Self::default()),
            Some(Value::Object(query)) => query,
            Some(_) => {
                return Err(MwApiError::MalformedResponse("query is not an object".into()));
            }
        };

        Ok(Self {
            statistics: section(query, "statistics")?,
            general: section(query, "general")?,
        })
    }

    pub fn generator(&self) -> Option<&str> {
        self.general.get("generator").and_then(Value::as_str)
    }

    pub fn into_snapshot(self) -> Snapshot {
        Snapshot::new(self.statistics, self.general)
    }
}

fn section(query: &Map<String, Value>, key: &str) -> Result<Map<String, Value>, MwApiError> {
    match query.get(key) {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(MwApiError::MalformedResponse(format!("query.{} is not an object", key))),
    }
}

/// `"MediaWiki 1.40.0"` -> `"1.40.0"`.
pub fn parse_version(generator: &str) -> String {
    generator
        .strip_prefix("MediaWiki ")
        .unwrap_or(generator)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_siteinfo_params() {
        let params = siteinfo_params(&[SiteInfoProp::Statistics, SiteInfoProp::General]);
        assert_eq!(
            params,
            vec![
                ("action", "query".to_string()),
                ("meta", "siteinfo".to_string()),
                ("siprop", "statistics|general".to_string()),
                ("format", "json".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_response_full() {
        let response = json!({
            "query": {
                "statistics": {"pages": 100, "images": 20},
                "general": {"generator": "MediaWiki 1.40", "sitename": "TestWiki"}
            }
        });
        let info = SiteInfo::from_response(&response).unwrap();
        assert_eq!(info.statistics["pages"], json!(100));
        assert_eq!(info.statistics["images"], json!(20));
        assert_eq!(info.generator(), Some("MediaWiki 1.40"));
    }

    #[test]
    fn test_from_response_without_query_is_empty() {
        let info = SiteInfo::from_response(&json!({"batchcomplete": ""})).unwrap();
        assert!(info.statistics.is_empty());
        assert!(info.general.is_empty());
    }

    #[test]
    fn test_from_response_rejects_wrong_types() {
        assert!(matches!(
            SiteInfo::from_response(&json!([1, 2])),
            Err(MwApiError::MalformedResponse(_))
        ));
        assert!(matches!(
            SiteInfo::from_response(&json!({"query": "nope"})),
            Err(MwApiError::MalformedResponse(_))
        ));
        assert!(matches!(
            SiteInfo::from_response(&json!({"query": {"statistics": 5}})),
            Err(MwApiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_into_snapshot_keeps_values_verbatim() {
        let response = json!({"query": {"statistics": {"pages": 123456789012_i64, "images": 0}}});
        let snapshot = SiteInfo::from_response(&response).unwrap().into_snapshot();
        assert_eq!(snapshot.statistic("pages"), Some(&json!(123456789012_i64)));
        assert_eq!(snapshot.statistic("images"), Some(&json!(0)));
        assert!(snapshot.general.is_empty());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("MediaWiki 1.40.0"), "1.40.0");
        assert_eq!(parse_version("MediaWiki 1.43.0-wmf.12"), "1.43.0-wmf.12");
        assert_eq!(parse_version("1.39"), "1.39");
    }
}
