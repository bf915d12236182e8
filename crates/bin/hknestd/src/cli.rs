//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Mirror Nest thermostats and smoke/CO alarms as HomeKit accessories.
#[derive(Parser, Debug)]
#[command(name = "hknestd", version, about)]
pub struct Cli {
    /// Nest provided product id
    #[arg(long, env = "HKNEST_PRODUCT_ID")]
    pub product_id: Option<String>,

    /// Nest provided product secret
    #[arg(long, env = "HKNEST_PRODUCT_SECRET", hide_env_values = true)]
    pub product_secret: Option<String>,

    /// A value you create, used during OAuth
    #[arg(long, env = "HKNEST_STATE")]
    pub state: Option<String>,

    /// PIN generated from the Nest site
    #[arg(long, env = "HKNEST_NEST_PIN")]
    pub nest_pin: Option<String>,

    /// Authorization token from a previous Nest authorization
    #[arg(long, env = "HKNEST_NEST_TOKEN", hide_env_values = true)]
    pub nest_token: Option<String>,

    /// PIN used to pair the accessories with HomeKit (XXXXXXXX or XXX-XX-XXX)
    #[arg(long, env = "HKNEST_HOMEKIT_PIN")]
    pub homekit_pin: Option<String>,

    /// Display log output
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file; optional
    #[arg(long, env = "HKNEST_CONFIG", default_value = "hknest.toml")]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_every_flag() {
        let cli = Cli::try_parse_from([
            "hknestd",
            "--product-id",
            "p",
            "--product-secret",
            "s",
            "--state",
            "st",
            "--nest-pin",
            "ABCD",
            "--homekit-pin",
            "031-45-154",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.product_id.as_deref(), Some("p"));
        assert_eq!(cli.product_secret.as_deref(), Some("s"));
        assert_eq!(cli.state.as_deref(), Some("st"));
        assert_eq!(cli.nest_pin.as_deref(), Some("ABCD"));
        assert_eq!(cli.homekit_pin.as_deref(), Some("031-45-154"));
        assert!(cli.verbose);
    }

    #[test]
    fn should_default_config_path() {
        let cli = Cli::try_parse_from(["hknestd", "--nest-token", "c.abc"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("hknest.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn should_reject_positional_arguments() {
        assert!(Cli::try_parse_from(["hknestd", "serve"]).is_err());
    }
}
