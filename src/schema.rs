//! Property-name canonicalization applied once at ingest.
//!
//! The source datasets carry inconsistent historical field names
//! (`pop6-11_change` vs `pop_6_11_change`, `ED_PS_change` vs
//! `ed_ps_change`). Instead of per-access fallback chains, a declared
//! mapping rewrites properties to canonical keys while a layer loads;
//! after ingest only canonical names exist.

use geoatlas_types::JsonObject;

/// One canonical property key and the legacy names it absorbs.
#[derive(Debug, Clone)]
pub struct AliasRule {
    pub canonical: String,
    pub aliases: Vec<String>,
}

impl AliasRule {
    pub fn new(canonical: &str, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// A per-layer set of alias rules.
#[derive(Debug, Clone, Default)]
pub struct SchemaMapping {
    rules: Vec<AliasRule>,
}

impl SchemaMapping {
    pub fn new(rules: Vec<AliasRule>) -> Self {
        Self { rules }
    }

    /// Mapping for the grid-cell layer.
    pub fn cells() -> Self {
        Self::new(vec![
            AliasRule::new("pop_6_11_change", &["pop6-11_change"]),
            AliasRule::new("pop_12_14_change", &["pop12-14_change"]),
            AliasRule::new("ed_ps_change", &["ED_PS_change"]),
            AliasRule::new("ed_js_change", &["ED_JS_change"]),
        ])
    }

    /// Mapping for the city layer: several vintages of the name column.
    pub fn cities() -> Self {
        Self::new(vec![AliasRule::new("name", &["city", "City_name_CN"])])
    }

    /// Rewrite `properties` in place: for each rule, if the canonical key
    /// is absent or null, the first non-null alias is moved over. All
    /// listed aliases are removed afterwards so only canonical keys
    /// survive ingest.
    pub fn canonicalize(&self, properties: &mut JsonObject) {
        for rule in &self.rules {
            let have_canonical = properties
                .get(&rule.canonical)
                .is_some_and(|v| !v.is_null());

            if !have_canonical {
                for alias in &rule.aliases {
                    if let Some(value) = properties.get(alias)
                        && !value.is_null()
                    {
                        let value = value.clone();
                        properties.insert(rule.canonical.clone(), value);
                        break;
                    }
                }
            }

            for alias in &rule.aliases {
                properties.remove(alias);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_alias_moved_to_canonical() {
        let mut p = props(json!({"pop6-11_change": 0.5, "ED_PS_change": -1.0}));
        SchemaMapping::cells().canonicalize(&mut p);
        assert_eq!(p["pop_6_11_change"], 0.5);
        assert_eq!(p["ed_ps_change"], -1.0);
        assert!(!p.contains_key("pop6-11_change"));
        assert!(!p.contains_key("ED_PS_change"));
    }

    #[test]
    fn test_canonical_wins_over_alias() {
        let mut p = props(json!({"pop_6_11_change": 1.0, "pop6-11_change": 2.0}));
        SchemaMapping::cells().canonicalize(&mut p);
        assert_eq!(p["pop_6_11_change"], 1.0);
        assert!(!p.contains_key("pop6-11_change"));
    }

    #[test]
    fn test_first_non_null_alias_wins() {
        let mut p = props(json!({"city": null, "City_name_CN": "北京"}));
        SchemaMapping::cities().canonicalize(&mut p);
        assert_eq!(p["name"], "北京");
        assert!(!p.contains_key("City_name_CN"));
    }

    #[test]
    fn test_untouched_without_aliases() {
        let mut p = props(json!({"wpop_change": 3.0}));
        SchemaMapping::cells().canonicalize(&mut p);
        assert_eq!(p["wpop_change"], 3.0);
        assert_eq!(p.len(), 1);
    }
}
