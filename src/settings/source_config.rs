use serde::{Deserialize, Serialize};

fn default_nodesdz_url() -> String {
    "https://nodesdz.com".to_string()
}

fn default_freeclashnode_url() -> String {
    "https://www.freeclashnode.com".to_string()
}

fn default_clashgithub_url() -> String {
    "https://clashgithub.com".to_string()
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    443
}

fn default_templates() -> Vec<TemplateNode> {
    vec![
        TemplateNode::new("awsall.freenodes01.cc", "🇯🇵 日本(@未来专属线路)"),
        TemplateNode::new("awshk.freenodes01.cc", "🇭🇰 香港"),
        TemplateNode::new("awsjp.freenodes01.cc", "🇯🇵 日本"),
    ]
}

/// A vless reality endpoint completed with the UUID scraped from nodesdz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateNode {
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub name: String,
}

impl TemplateNode {
    pub fn new(server: &str, name: &str) -> Self {
        TemplateNode {
            server: server.to_string(),
            port: default_port(),
            name: name.to_string(),
        }
    }
}

/// One aggregator site and how to scrape it.
///
/// `name_suffix_date` appends the date suffix to every node the source
/// yields, independently of the rename pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Article id computed from a base id and base date, Clash YAML download
    NodesdzDaily {
        #[serde(default = "default_nodesdz_url")]
        base_url: String,
        base_id: u32,
        /// `YYYY-MM-DD`
        base_date: String,
        #[serde(default)]
        name_suffix_date: bool,
    },
    /// Newest article, UUID extracted and applied to fixed templates
    NodesdzLatest {
        #[serde(default = "default_nodesdz_url")]
        base_url: String,
        #[serde(default = "default_templates")]
        templates: Vec<TemplateNode>,
        #[serde(default = "default_true")]
        name_suffix_date: bool,
    },
    /// Newest dated article, every linked `.txt` subscription
    #[serde(rename = "freeclashnode")]
    FreeClashNode {
        #[serde(default = "default_freeclashnode_url")]
        base_url: String,
        #[serde(default = "default_true")]
        name_suffix_date: bool,
    },
    /// Newest `clashnode` article, links embedded in the page
    #[serde(rename = "clashgithub")]
    ClashGithub {
        #[serde(default = "default_clashgithub_url")]
        base_url: String,
        #[serde(default = "default_true")]
        name_suffix_date: bool,
    },
    /// A direct subscription URL, either Clash YAML or a link list
    Subscription {
        url: String,
        #[serde(default)]
        name_suffix_date: bool,
    },
}

impl SourceConfig {
    /// Short label used in log lines.
    pub fn label(&self) -> &str {
        match self {
            SourceConfig::NodesdzDaily { .. } => "nodesdz-daily",
            SourceConfig::NodesdzLatest { .. } => "nodesdz",
            SourceConfig::FreeClashNode { .. } => "freeclashnode",
            SourceConfig::ClashGithub { .. } => "clashgithub",
            SourceConfig::Subscription { url, .. } => url,
        }
    }

    pub fn name_suffix_date(&self) -> bool {
        match self {
            SourceConfig::NodesdzDaily {
                name_suffix_date, ..
            }
            | SourceConfig::NodesdzLatest {
                name_suffix_date, ..
            }
            | SourceConfig::FreeClashNode {
                name_suffix_date, ..
            }
            | SourceConfig::ClashGithub {
                name_suffix_date, ..
            }
            | SourceConfig::Subscription {
                name_suffix_date, ..
            } => *name_suffix_date,
        }
    }
}

pub(crate) fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::NodesdzLatest {
            base_url: default_nodesdz_url(),
            templates: default_templates(),
            name_suffix_date: true,
        },
        SourceConfig::FreeClashNode {
            base_url: default_freeclashnode_url(),
            name_suffix_date: true,
        },
        SourceConfig::ClashGithub {
            base_url: default_clashgithub_url(),
            name_suffix_date: true,
        },
    ]
}
