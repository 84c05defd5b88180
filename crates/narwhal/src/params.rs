//! URL construction and parameter encoding

use narwhal_http_client::{HttpError, Method};
use serde_json::Value;
use url::Url;

/// Request parameters, encoded into the query or the JSON body
pub type Parameters = serde_json::Map<String, Value>;

/// Prefix `endpoint` with `base_url` unless it is already absolute
pub fn resolve_url(base_url: Option<&str>, endpoint: &str) -> String {
    match base_url {
        Some(base) if !is_absolute(endpoint) => format!("{}{}", base, endpoint),
        _ => endpoint.to_owned(),
    }
}

fn is_absolute(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

/// `true` when parameters for `method` go into the query string
pub fn encodes_in_query(method: &Method) -> bool {
    *method == Method::GET || *method == Method::DELETE || *method == Method::HEAD
}

/// Flatten parameters into query pairs
///
/// Keys are sorted. Arrays repeat the key, nested objects use `key[sub]`,
/// booleans become `1`/`0` and null becomes an empty value.
pub fn query_pairs(params: &Parameters) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();

    for key in keys {
        if let Some(value) = params.get(key) {
            push_component(key.clone(), value, &mut pairs);
        }
    }

    pairs
}

fn push_component(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            let mut nested: Vec<(&String, &Value)> = map.iter().collect();
            nested.sort_by(|a, b| a.0.cmp(b.0));
            for (sub, value) in nested {
                push_component(format!("{}[{}]", key, sub), value, pairs);
            }
        }
        Value::Array(items) => {
            for item in items {
                push_component(key.clone(), item, pairs);
            }
        }
        Value::Bool(flag) => pairs.push((key, if *flag { "1" } else { "0" }.to_owned())),
        Value::Null => pairs.push((key, String::new())),
        Value::Number(number) => pairs.push((key, number.to_string())),
        Value::String(text) => pairs.push((key, text.clone())),
    }
}

/// Final request URL with query parameters appended when `method` calls for it
pub fn build_url(
    base_url: Option<&str>,
    endpoint: &str,
    method: &Method,
    params: Option<&Parameters>,
) -> Result<Url, HttpError> {
    let mut url = Url::parse(&resolve_url(base_url, endpoint))?;

    if let Some(params) = params.filter(|params| !params.is_empty()) {
        if encodes_in_query(method) {
            url.query_pairs_mut().extend_pairs(query_pairs(params));
        }
    }

    Ok(url)
}
