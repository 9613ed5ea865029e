// ABOUTME: Integration tests for configuration parsing and discovery.
// ABOUTME: Tests YAML parsing, defaults, node lists and file lookup order.

use data_deploy::config::*;
use data_deploy::error::Error;
use data_deploy::types::NodeId;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_full_config() {
        let yaml = r#"
key_path: /home/me/.ssh/cluster
dest: /scratch/data
retries: 2
max_workers: 16
plugin_dir: /opt/deploy-plugins

ssh:
  port: 2200
  trust_first_connection: false
  known_hosts: /home/me/.ssh/cluster_hosts
  command_timeout: 90s

reservation:
  - 10.0.0.1
  - root@10.0.0.2:22
  - id: 9
    ip_public: 10.0.0.9
    ip_local: 192.168.0.9
    hostname: storage9
    extra:
      rack: b7
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.key_path, Some(PathBuf::from("/home/me/.ssh/cluster")));
        assert_eq!(config.dest, "/scratch/data");
        assert_eq!(config.retries, 2);
        assert_eq!(config.max_workers, Some(16));
        assert_eq!(config.plugin_dir(), Some(PathBuf::from("/opt/deploy-plugins")));
        assert!(!config.ssh.trust_first_connection);
        assert_eq!(config.ssh.command_timeout, Duration::from_secs(90));

        let reservation = config.reservation().unwrap().unwrap();
        assert_eq!(reservation.len(), 3);
        assert_eq!(reservation.get(NodeId::new(1)).unwrap().port, 2200);
        assert_eq!(reservation.get(NodeId::new(2)).unwrap().port, 22);
        let storage = reservation.get(NodeId::new(9)).unwrap();
        assert_eq!(storage.ip_local.as_deref(), Some("192.168.0.9"));
        assert_eq!(storage.attributes.get("rack").map(String::as_str), Some("b7"));
    }

    #[test]
    fn ssh_settings_follow_config() {
        let config = Config::from_yaml("ssh:\n  command_timeout: 2m\n").unwrap();
        let settings = config.ssh.settings(Some(PathBuf::from("/k")));
        assert_eq!(settings.command_timeout, Duration::from_secs(120));
        assert_eq!(settings.key_path, Some(PathBuf::from("/k")));
        assert!(settings.trust_first_connection);
    }

    #[test]
    fn duplicate_node_ids_rejected() {
        let yaml = r#"
reservation:
  - id: 1
    ip_public: 10.0.0.1
  - 10.0.0.2
"#;
        // Short entries take their 1-based position as id.
        assert!(Config::from_yaml(yaml).is_ok());

        let clash = r#"
reservation:
  - 10.0.0.1
  - id: 1
    ip_public: 10.0.0.2
"#;
        assert!(matches!(
            Config::from_yaml(clash),
            Err(Error::Reservation(_))
        ));
    }

    #[test]
    fn bad_short_entry_rejected() {
        let yaml = "reservation:\n  - alice@10.0.0.1:notaport\n";
        assert!(matches!(
            Config::from_yaml(yaml),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_reservation_rejected() {
        assert!(Config::from_yaml("reservation: []\n").is_err());
    }

    #[test]
    fn invalid_timeout_rejected() {
        assert!(Config::from_yaml("ssh:\n  command_timeout: soon\n").is_err());
    }
}

mod discovery {
    use super::*;

    #[test]
    fn finds_each_candidate_name() {
        for name in [CONFIG_FILENAME, CONFIG_FILENAME_ALT, CONFIG_FILENAME_DIR] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "retries: 5\n").unwrap();

            let config = Config::discover(dir.path()).unwrap();
            assert_eq!(config.retries, 5, "{name}");
        }
    }

    #[test]
    fn primary_name_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "retries: 1\n").unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_ALT), "retries: 2\n").unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap().retries, 1);
    }

    #[test]
    fn missing_file_is_reported_by_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(None, dir.path()).unwrap();
        assert_eq!(config.dest, DEFAULT_DEST);
        assert_eq!(config.retries, 0);
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("other.yml");
        assert!(matches!(
            Config::load_or_default(Some(&missing), dir.path()),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn broken_file_is_not_silently_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "retries: [").unwrap();
        assert!(matches!(
            Config::load_or_default(None, dir.path()),
            Err(Error::Yaml(_))
        ));
    }
}
