//! Command-line arguments. Every flag can also come from the environment.

use std::path::PathBuf;

use clap::Parser;

/// Send ORBIT Power BI welcome emails for every onboarding spreadsheet in a folder.
#[derive(Debug, Clone, Parser)]
#[command(name = "onboard-mailer", version)]
pub struct Args {
    /// TOML configuration file.
    #[arg(short, long, env = "ONBOARD_CONFIG", default_value = "config.toml")]
    pub config: PathBuf,

    /// Folder scanned for onboarding spreadsheets.
    #[arg(short, long, env = "ONBOARD_INPUT_DIR", default_value = "input_files")]
    pub input_dir: PathBuf,

    /// Folder receiving the run log and the results CSV.
    #[arg(short, long, env = "ONBOARD_LOGS_DIR", default_value = "logs")]
    pub logs_dir: PathBuf,

    /// Banner image embedded inline in every message.
    #[arg(long, env = "ONBOARD_BANNER", default_value = "assets/orbit_banner.jpeg")]
    pub banner: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "onboard-mailer",
            "-c",
            "/etc/onboard.toml",
            "--input-dir",
            "/data/in",
            "-l",
            "/data/logs",
            "--banner",
            "/data/banner.png",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/onboard.toml"));
        assert_eq!(args.input_dir, PathBuf::from("/data/in"));
        assert_eq!(args.logs_dir, PathBuf::from("/data/logs"));
        assert_eq!(args.banner, PathBuf::from("/data/banner.png"));
    }
}
