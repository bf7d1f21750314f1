use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

// advert
//  ├── title
//  ├── price_obj
//  │    ├── value
//  │    └── currency
//  ├── price            (older payloads)
//  ├── region_name / town_name
//  ├── url
//  ├── category_name
//  └── attrs            ({"Bedrooms": "3"} or [{"name": "Bedrooms", "value": "3"}])

#[derive(Debug, Deserialize)]
pub struct JijiAdvert {
    pub title: Option<String>,
    pub price_obj: Option<Value>,
    pub price: Option<Value>,
    pub region_name: Option<String>,
    pub town_name: Option<String>,
    pub url: Option<String>,
    pub category_name: Option<String>,
    pub attrs: Option<Value>,
}

impl JijiAdvert {
    /// `KSh {value}` from `price_obj`, else the bare `price` field.
    pub fn price_text(&self) -> String {
        let value = self
            .price_obj
            .as_ref()
            .and_then(|po| po.get("value"))
            .map(value_text)
            .filter(|v| !v.is_empty());
        match value {
            Some(v) => format!("KSh {v}"),
            None => self.price.as_ref().map(value_text).unwrap_or_default(),
        }
    }

    pub fn location(&self) -> String {
        self.region_name
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.town_name.clone())
            .unwrap_or_default()
    }

    /// Attributes flattened to name -> text, whichever shape the payload uses.
    pub fn attributes(&self) -> HashMap<String, String> {
        match &self.attrs {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), value_text(v)))
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|a| {
                    let name = a.get("name")?.as_str()?.to_string();
                    let value = a.get("value").map(value_text).unwrap_or_default();
                    Some((name, value))
                })
                .collect(),
            _ => HashMap::new(),
        }
    }

    /// First non-empty attribute among `names`, matched case-insensitively.
    pub fn attr(&self, names: &[&str]) -> String {
        let attrs = self.attributes();
        names
            .iter()
            .find_map(|n| {
                attrs
                    .iter()
                    .find(|(k, v)| k.eq_ignore_ascii_case(n) && !v.is_empty())
                    .map(|(_, v)| v.clone())
            })
            .unwrap_or_default()
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attrs_accept_object_and_list_shapes() {
        let a: JijiAdvert = serde_json::from_str(
            r#"{"title":"3 bed","attrs":{"Bedrooms":"3","Bathrooms":2,"Facilities":["Gym","Pool"]}}"#,
        )
        .unwrap();
        assert_eq!(a.attr(&["bedrooms"]), "3");
        assert_eq!(a.attr(&["Bathrooms"]), "2");
        assert_eq!(a.attr(&["Amenities", "Facilities"]), "Gym, Pool");

        let b: JijiAdvert = serde_json::from_str(
            r#"{"attrs":[{"name":"Bedrooms","value":"4"},{"name":"Size","value":"250 sqm"}]}"#,
        )
        .unwrap();
        assert_eq!(b.attr(&["Bedrooms"]), "4");
        assert_eq!(b.attr(&["Size"]), "250 sqm");
        assert_eq!(b.attr(&["Bathrooms"]), "");
    }

    #[test]
    fn price_prefers_price_obj() {
        let a: JijiAdvert =
            serde_json::from_str(r#"{"price_obj":{"value":8500000,"currency":"KES"},"price":"old"}"#)
                .unwrap();
        assert_eq!(a.price_text(), "KSh 8500000");

        let b: JijiAdvert = serde_json::from_str(r#"{"price":"KSh 45,000"}"#).unwrap();
        assert_eq!(b.price_text(), "KSh 45,000");
    }

    #[test]
    fn location_falls_back_to_town() {
        let a: JijiAdvert =
            serde_json::from_str(r#"{"region_name":"","town_name":"Syokimau"}"#).unwrap();
        assert_eq!(a.location(), "Syokimau");
    }
}
