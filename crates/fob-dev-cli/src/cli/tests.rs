#[cfg(test)]
mod tests {
    use crate::cli::validation::{parse_host, parse_port};
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8081"), Ok(8081));
        assert_eq!(parse_port("65535"), Ok(65535));
        assert!(parse_port("0").is_err());
        assert!(parse_port("65536").is_err());
        assert!(parse_port("http").is_err());
        assert!(parse_port("").is_err());
    }

    #[test]
    fn test_parse_host() {
        assert_eq!(parse_host("localhost"), Ok("localhost".to_string()));
        assert_eq!(parse_host("0.0.0.0"), Ok("0.0.0.0".to_string()));
        assert_eq!(parse_host("::1"), Ok("::1".to_string()));

        assert!(parse_host("").is_err());
        assert!(parse_host("http://localhost").is_err());
        assert!(parse_host("localhost:8081").is_err());
        assert!(parse_host("localhost/path").is_err());
        assert!(parse_host("my host").is_err());
    }

    #[test]
    fn test_cli_verbose_quiet_conflict() {
        let result = Cli::try_parse_from(["fob-dev", "--verbose", "--quiet", "serve"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_args_unset_by_default() {
        let args = Cli::try_parse_from(["fob-dev", "serve"]).unwrap();

        let Command::Serve(serve) = args.command else {
            panic!("expected serve command");
        };
        assert_eq!(serve.port, None);
        assert_eq!(serve.host, None);
        assert_eq!(serve.root, None);
        assert_eq!(serve.out_dir, None);
        assert!(!serve.https);
        assert_eq!(serve.config, None);
    }

    #[test]
    fn test_serve_args_flags() {
        let args = Cli::try_parse_from([
            "fob-dev",
            "serve",
            "--port",
            "9000",
            "--host",
            "0.0.0.0",
            "--root",
            "app",
            "-d",
            "build",
            "--https",
            "-c",
            "custom.json",
        ])
        .unwrap();

        let Command::Serve(serve) = args.command else {
            panic!("expected serve command");
        };
        assert_eq!(serve.port, Some(9000));
        assert_eq!(serve.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(serve.root, Some(PathBuf::from("app")));
        assert_eq!(serve.out_dir, Some(PathBuf::from("build")));
        assert!(serve.https);
        assert_eq!(serve.config, Some(PathBuf::from("custom.json")));
    }

    #[test]
    fn test_monitor_args_defaults() {
        let args = Cli::try_parse_from(["fob-dev", "monitor"]).unwrap();

        let Command::Monitor(monitor) = args.command else {
            panic!("expected monitor command");
        };
        assert_eq!(monitor.host, "localhost");
        assert_eq!(monitor.port, 8081);
        assert!(!monitor.secure);
        assert_eq!(monitor.retries, 5);
        assert_eq!(monitor.retry_delay, 5);
    }

    #[test]
    fn test_port_zero_rejected() {
        assert!(Cli::try_parse_from(["fob-dev", "monitor", "--port", "0"]).is_err());
        assert!(Cli::try_parse_from(["fob-dev", "serve", "--port", "0"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Cli::try_parse_from(["fob-dev", "check", "--schema", "--no-color", "-v"]).unwrap();
        assert!(args.verbose);
        assert!(args.no_color);

        let Command::Check(check) = args.command else {
            panic!("expected check command");
        };
        assert!(check.schema);
        assert_eq!(check.config, None);
    }
}
