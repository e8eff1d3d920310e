use std::path::Path;

use nodesub::settings::Settings;
use nodesub::utils::base64::base64_decode;
use nodesub::{harvest, HarvestError};

fn offline_settings(out_dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.output.dir = out_dir.to_string_lossy().into_owned();
    settings
}

#[cfg(test)]
mod harvest_tests {
    use super::*;

    const LINKS: &str = "\
trojan://pw@1.2.3.4:443#HK
trojan://pw@1.2.3.4:443#HK%20duplicate
ss://auth@5.6.7.8:8388#HK
vless://uuid@hk.example.com:443?security=reality#China%20relay
not a link at all
";

    #[tokio::test]
    async fn test_harvest_from_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("links.txt");
        std::fs::write(&input, LINKS).unwrap();
        let out_dir = dir.path().join("public");

        let report = harvest(&offline_settings(&out_dir), Some(&input))
            .await
            .unwrap();

        assert!(report.written);
        assert_eq!(report.stats.candidates, 4);
        assert_eq!(report.stats.parsed, 3);
        assert_eq!(report.stats.filtered, 1);
        assert_eq!(report.duplicates_removed, 1);
        let names: Vec<&str> = report.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["HK", "HK-2"]);

        let json_path = out_dir.join("data.json");
        let sub_path = out_dir.join("good.txt");
        assert_eq!(report.json_path.as_deref(), Some(json_path.as_path()));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["type"], "trojan");
        assert_eq!(json[1]["name"], "HK-2");

        let sub = std::fs::read_to_string(&sub_path).unwrap();
        assert_eq!(
            base64_decode(&sub).unwrap(),
            "trojan://pw@1.2.3.4:443#HK\nss://auth@5.6.7.8:8388#HK-2"
        );
    }

    #[tokio::test]
    async fn test_harvest_clash_input_with_rename() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clash.yaml");
        std::fs::write(
            &input,
            r#"
proxies:
  - name: a
    type: vless
    server: awsjp.freenodes01.cc
    port: 443
    uuid: b831381d-6324-4d53-ad4f-8cda48b30811
  - name: b
    type: trojan
    server: awsjp.freenodes01.cc
    port: 8443
    password: pw
"#,
        )
        .unwrap();

        let mut settings = offline_settings(dir.path());
        settings.rename.enabled = true;
        settings.rename.date_suffix = false;
        settings.output.json_name = "nodes-{date}.json".to_string();

        let report = harvest(&settings, Some(&input)).await.unwrap();

        let names: Vec<&str> = report.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["🇯🇵 日本", "🇯🇵 日本-2"]);

        let json_name = report
            .json_path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap()
            .to_string();
        assert!(json_name.starts_with("nodes-"));
        assert!(json_name.ends_with(".json"));
        assert_eq!(json_name.len(), "nodes-YYYYMMDD.json".len());
        assert!(!json_name.contains("{date}"));
    }

    #[tokio::test]
    async fn test_harvest_without_usable_nodes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("links.txt");
        std::fs::write(&input, "trojan://missing-at:443\nss://also@bad\n").unwrap();
        let out_dir = dir.path().join("public");

        let report = harvest(&offline_settings(&out_dir), Some(&input))
            .await
            .unwrap();

        assert!(!report.written);
        assert_eq!(report.stats.failed, 2);
        assert!(report.json_path.is_none());
        assert!(!out_dir.exists());
    }

    #[tokio::test]
    async fn test_harvest_missing_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = harvest(
            &offline_settings(dir.path()),
            Some(&dir.path().join("absent.txt")),
        )
        .await;
        assert!(matches!(result, Err(HarvestError::Input { .. })));
    }
}
