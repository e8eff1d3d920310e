use crate::models::NodeRecord;

/// Renders the node list as pretty-printed JSON with non-ASCII written literally
pub fn proxy_to_json(nodes: &[NodeRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scheme;

    #[test]
    fn test_proxy_to_json() {
        let nodes = vec![NodeRecord::new(Scheme::Trojan, "1.2.3.4", 443, "pw", "🇭🇰 香港")];
        let json = proxy_to_json(&nodes).unwrap();

        assert!(json.starts_with("[\n  {\n    \"type\": \"trojan\""));
        assert!(json.contains("\"name\": \"🇭🇰 香港\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["port"], 443);
    }

    #[test]
    fn test_proxy_to_json_empty() {
        assert_eq!(proxy_to_json(&[]).unwrap(), "[]");
    }
}
