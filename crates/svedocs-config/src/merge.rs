//! Deep merge of user configuration over defaults.

use serde_json::Value;

/// Merge `user` over `defaults`.
///
/// Objects merge key by key, recursively. Arrays and primitives from `user`
/// replace the default wholesale. A `null` user value keeps the default.
pub fn deep_merge(defaults: Value, user: Value) -> Value {
    match (defaults, user) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (defaults, Value::Null) => defaults,
        (_, user) => user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn user_scalars_replace_defaults() {
        let merged = deep_merge(
            json!({ "title": "svedocs", "lang": "en-us" }),
            json!({ "title": "My Docs" }),
        );

        assert_eq!(merged, json!({ "title": "My Docs", "lang": "en-us" }));
    }

    #[test]
    fn objects_merge_recursively() {
        let merged = deep_merge(
            json!({ "server": { "host": "127.0.0.1", "port": 5173 } }),
            json!({ "server": { "port": 8080 } }),
        );

        assert_eq!(
            merged,
            json!({ "server": { "host": "127.0.0.1", "port": 8080 } })
        );
    }

    #[test]
    fn arrays_are_replaced() {
        let merged = deep_merge(
            json!({ "routes_exclude": ["drafts/**"] }),
            json!({ "routes_exclude": ["private/**"] }),
        );

        assert_eq!(merged, json!({ "routes_exclude": ["private/**"] }));
    }

    #[test]
    fn null_keeps_default() {
        let merged = deep_merge(json!({ "base": "/docs" }), json!({ "base": null }));

        assert_eq!(merged, json!({ "base": "/docs" }));
    }

    #[test]
    fn unknown_keys_are_kept() {
        let merged = deep_merge(json!({}), json!({ "extra": { "a": 1 } }));

        assert_eq!(merged, json!({ "extra": { "a": 1 } }));
    }
}
