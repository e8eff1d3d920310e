use crate::models::NodeRecord;
use crate::parser::explodes::ExplodeError;
use crate::settings::{FilterPolicy, FilterSettings};

/// Returns the first blacklist marker contained in `name`, if the policy drops nodes.
pub fn matched_marker<'a>(name: &str, settings: &'a FilterSettings) -> Option<&'a str> {
    if settings.policy == FilterPolicy::Keep {
        return None;
    }
    settings
        .markers
        .iter()
        .map(String::as_str)
        .find(|marker| !marker.is_empty() && name.contains(marker))
}

/// Passes the node through unless its name is blacklisted.
pub fn check_node(node: NodeRecord, settings: &FilterSettings) -> Result<NodeRecord, ExplodeError> {
    match matched_marker(&node.name, settings) {
        Some(marker) => Err(ExplodeError::Blacklisted(marker.to_string())),
        None => Ok(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scheme;

    #[test]
    fn test_default_markers() {
        let settings = FilterSettings::default();
        assert_eq!(matched_marker("🇨🇳 Shanghai", &settings), Some("🇨🇳"));
        assert_eq!(matched_marker("node_CN_01", &settings), Some("_CN_"));
        assert_eq!(matched_marker("中国 移动", &settings), Some("中国"));
        assert_eq!(matched_marker("China Telecom", &settings), Some("China"));
        assert_eq!(matched_marker("🇭🇰 Hong Kong", &settings), None);
        // Matching is case-sensitive
        assert_eq!(matched_marker("china", &settings), None);
    }

    #[test]
    fn test_keep_policy() {
        let settings = FilterSettings {
            policy: FilterPolicy::Keep,
            ..FilterSettings::default()
        };
        let node = NodeRecord::new(Scheme::Trojan, "1.2.3.4", 443, "pw", "China Node");
        assert!(check_node(node, &settings).is_ok());
    }

    #[test]
    fn test_check_node_drops() {
        let node = NodeRecord::new(Scheme::Trojan, "1.2.3.4", 443, "pw", "China Node");
        let err = check_node(node, &FilterSettings::default()).unwrap_err();
        assert!(err.is_filtered());
    }
}
