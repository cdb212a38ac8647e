//! dashboard configs

pub mod cli {
    //! Parse from either cli or env var

    /// Default dnsmasq config, the file holding `dhcp-host=` directives
    pub static DEFAULT_CONF_PATH: &str = "/etc/dnsmasq.conf";
    /// Default wpa_supplicant config
    pub static DEFAULT_WPA_CONF_PATH: &str = "/etc/wpa_supplicant/wpa_supplicant.conf";
    /// Default dashboard address
    pub static DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
    /// systemd unit restarted after every reservation change
    pub static DEFAULT_SERVICE_NAME: &str = "dnsmasq";
    /// wireless interface bounced when wifi settings change
    pub static DEFAULT_WIFI_INTERFACE: &str = "wlan0";
    /// country code written into wpa_supplicant.conf
    pub static DEFAULT_WIFI_COUNTRY: &str = "US";
    /// Number of one second polls for the new SSID before giving up
    pub const DEFAULT_WIFI_POLL_ATTEMPTS: u32 = 30;
    /// append-only log file, also served by the log api
    pub static DEFAULT_LOG_FILE: &str = "dhcp_dashboard.log";
    /// tokio worker thread name
    pub static DEFAULT_THREAD_NAME: &str = "dhcp-dash-worker";
    /// default log level. Can use this argument or DASH_LOG env var
    pub const DEFAULT_DASH_LOG: &str = "info";

    use std::{net::SocketAddr, path::PathBuf};

    pub use clap::Parser;

    #[derive(Parser, Debug, Clone, PartialEq, Eq)]
    #[clap(author, name = "dhcp-dash", bin_name = "dhcp-dash", about, long_about = None)]
    /// parses from cli & environment var. a `.env` in the working dir is loaded as well
    pub struct Config {
        /// path to the dnsmasq config
        #[clap(short, long, value_parser, env, default_value = DEFAULT_CONF_PATH)]
        pub conf_path: PathBuf,
        /// path to the wpa_supplicant config
        #[clap(long, env, value_parser, default_value = DEFAULT_WPA_CONF_PATH)]
        pub wpa_conf_path: PathBuf,
        /// the address the dashboard listens on
        #[clap(short, long, env, value_parser, default_value = DEFAULT_BIND_ADDR)]
        pub bind_addr: SocketAddr,
        /// service managed through systemctl
        #[clap(long, env, value_parser, default_value = DEFAULT_SERVICE_NAME)]
        pub service_name: String,
        /// wireless interface name
        #[clap(long, env, value_parser, default_value = DEFAULT_WIFI_INTERFACE)]
        pub wifi_interface: String,
        /// wifi regulatory country
        #[clap(long, env, value_parser, default_value = DEFAULT_WIFI_COUNTRY)]
        pub wifi_country: String,
        /// how many times to check for the new SSID after reconfiguring
        #[clap(long, env, value_parser, default_value_t = DEFAULT_WIFI_POLL_ATTEMPTS)]
        pub wifi_poll_attempts: u32,
        /// run system commands directly instead of through sudo
        #[clap(long, env)]
        pub no_sudo: bool,
        /// log file path
        #[clap(long, env, value_parser, default_value = DEFAULT_LOG_FILE)]
        pub log_file: PathBuf,
        /// set the log level. All valid RUST_LOG arguments are accepted
        #[clap(long, env, value_parser, default_value = DEFAULT_DASH_LOG)]
        pub dash_log: String,
        /// Worker thread name
        #[clap(long, env, value_parser, default_value = DEFAULT_THREAD_NAME)]
        pub thread_name: String,
        /// number of worker threads, defaults to logical CPUs
        #[clap(long, env, value_parser)]
        pub threads: Option<usize>,
    }

    impl Config {
        /// should system commands be prefixed with `sudo`?
        pub fn use_sudo(&self) -> bool {
            !self.no_sudo
        }
    }

}

pub mod trace {
    //! tracing configuration
    use anyhow::{Context, Result};
    use tracing_subscriber::{
        filter::EnvFilter,
        fmt::{
            self,
            format::{Format, PrettyFields},
        },
        prelude::__tracing_subscriber_SubscriberExt,
        util::SubscriberInitExt,
    };

    use std::{fs::OpenOptions, path::Path, str, sync::Mutex};

    use env_parser::parse_var_with_err;

    /// log as "json", "pretty" or "standard" (unstructured)
    static DEFAULT_LOG_FORMAT: &str = "standard";

    /// Configuration for the global subscriber
    #[derive(Debug)]
    pub struct Config {
        /// formatting to apply to console logs
        pub log_frmt: String,
    }

    impl Config {
        /// Install the global subscriber. Console output is formatted per `LOG_FORMAT`,
        /// when `log_file` is given every event is also appended to it as plain text.
        pub fn parse(dash_log: &str, log_file: Option<&Path>) -> Result<Self> {
            let log_frmt: String = parse_var_with_err("LOG_FORMAT", DEFAULT_LOG_FORMAT)?;

            // Log level comes from DASH_LOG
            let filter = EnvFilter::try_new(dash_log)
                .or_else(|_| EnvFilter::try_new("info"))?
                .add_directive("hyper=off".parse()?);

            let file_layer = match log_file {
                Some(path) => {
                    let file = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(path)
                        .with_context(|| format!("failed to open log file {}", path.display()))?;
                    Some(
                        fmt::layer()
                            .with_ansi(false)
                            .with_writer(Mutex::new(file)),
                    )
                }
                None => None,
            };

            match &log_frmt[..] {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(file_layer)
                        .with(fmt::layer().json())
                        .init();
                }
                "pretty" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(file_layer)
                        .with(
                            fmt::layer()
                                .event_format(
                                    Format::default().pretty().with_source_location(false),
                                )
                                .fmt_fields(PrettyFields::new()),
                        )
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(file_layer)
                        .with(fmt::layer())
                        .init();
                }
            }

            Ok(Self { log_frmt })
        }
    }
}
