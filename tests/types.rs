// ABOUTME: Integration tests for validated domain types.
// ABOUTME: Tests remote path sanitization, multipliers and node ids.

use data_deploy::types::*;

mod remote_path_tests {
    use super::*;

    #[test]
    fn home_is_refused() {
        assert_eq!(RemotePath::new("~"), Err(RemotePathError::HomeDirectory));
        assert_eq!(RemotePath::new("~/"), Err(RemotePathError::HomeDirectory));
    }

    #[test]
    fn home_prefix_is_stripped() {
        assert_eq!(RemotePath::new("~/data").unwrap().as_str(), "data");
        assert!(!RemotePath::new("~/data").unwrap().is_absolute());
    }

    #[test]
    fn empty_is_refused() {
        assert_eq!(RemotePath::new(""), Err(RemotePathError::Empty));
        assert!(RemotePath::new(".").is_err());
    }

    #[test]
    fn absolute_paths_are_kept() {
        let path = RemotePath::new("/abs/data").unwrap();
        assert_eq!(path.as_str(), "/abs/data");
        assert!(path.is_absolute());
    }

    #[test]
    fn nested_home_is_refused() {
        assert!(matches!(
            RemotePath::new("~/~/data"),
            Err(RemotePathError::NestedHome(_))
        ));
    }

    #[test]
    fn join_appends_segment() {
        let path = RemotePath::new("/abs/data/").unwrap();
        assert_eq!(path.join("set"), "/abs/data/set");
    }
}

mod multiplier_tests {
    use super::*;

    #[test]
    fn extra_is_one_less() {
        assert_eq!(Multiplier::ONE.extra(), 0);
        assert_eq!(Multiplier::new(4).unwrap().extra(), 3);
    }

    #[test]
    fn zero_is_refused() {
        assert_eq!(Multiplier::new(0), Err(MultiplierError::Zero));
        assert!("0".parse::<Multiplier>().is_err());
        assert!("two".parse::<Multiplier>().is_err());
    }

    #[test]
    fn parses_from_cli_text() {
        assert_eq!("3".parse::<Multiplier>().unwrap().get(), 3);
    }
}

mod node_id_tests {
    use super::*;

    #[test]
    fn parses_numbers_only() {
        assert_eq!("12".parse::<NodeId>().unwrap(), NodeId::new(12));
        assert!("node12".parse::<NodeId>().is_err());
    }

    #[test]
    fn displays_number() {
        assert_eq!(NodeId::new(7).to_string(), "7");
    }
}
