use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone};
use log::debug;

use crate::models::{NodeRecord, Scheme};
use crate::settings::{MatchTarget, RenameSettings};

/// Removes later nodes sharing (scheme, server, port) with an earlier one.
///
/// Returns the number of nodes removed.
pub fn dedup_nodes(nodes: &mut Vec<NodeRecord>) -> usize {
    let before = nodes.len();
    let mut seen: HashSet<(Scheme, String, u16)> = HashSet::with_capacity(nodes.len());
    nodes.retain(|node| seen.insert((node.scheme, node.server.clone(), node.port)));

    let removed = before - nodes.len();
    if removed > 0 {
        debug!("Removed {} duplicate nodes", removed);
    }
    removed
}

/// Renders `<separator><date>` for the rename pass and per-source suffixes.
pub fn date_suffix<Tz>(settings: &RenameSettings, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", settings.date_separator, now.format(&settings.date_format))
}

/// Appends `suffix` to every node name.
pub fn append_date_suffix(nodes: &mut [NodeRecord], suffix: &str) {
    for node in nodes.iter_mut() {
        node.name.push_str(suffix);
    }
}

/// Label of the first rule whose pattern occurs in the node's name or server.
pub fn region_label<'a>(node: &NodeRecord, settings: &'a RenameSettings) -> Option<&'a str> {
    let name = node.name.to_lowercase();
    let server = node.server.to_lowercase();

    settings
        .rules
        .iter()
        .find(|rule| {
            let pattern = rule.pattern.to_lowercase();
            match settings.match_on {
                MatchTarget::Name => name.contains(&pattern),
                MatchTarget::Server => server.contains(&pattern),
                MatchTarget::Both => name.contains(&pattern) || server.contains(&pattern),
            }
        })
        .map(|rule| rule.label.as_str())
}

/// Replaces node names with their region label.
///
/// Nodes no rule matches take the fallback label, or keep their name when no
/// fallback is configured. Relabelled nodes get `suffix` appended when the
/// date suffix is enabled. Does nothing unless the pass is enabled.
pub fn rename_nodes(nodes: &mut [NodeRecord], settings: &RenameSettings, suffix: &str) {
    if !settings.enabled {
        return;
    }

    for node in nodes.iter_mut() {
        let label = region_label(node, settings).or(settings.fallback.as_deref());
        if let Some(label) = label {
            let mut name = label.to_string();
            if settings.date_suffix {
                name.push_str(suffix);
            }
            node.name = name;
        }
    }
}

/// Appends `-2`, `-3`, ... to the second and later nodes sharing a name.
pub fn number_duplicates(nodes: &mut [NodeRecord]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for node in nodes.iter_mut() {
        let count = counts.entry(node.name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            node.name = format!("{}-{}", node.name, count);
        }
    }
}
