use std::{
    net::{SocketAddr, TcpListener},
    path::{Path, PathBuf},
    process::{Child, Command},
    time::Duration,
};

use tempfile::TempDir;

pub const TEST_CONF: &str = "# test config
interface=wlan0
dhcp-range=192.168.1.100,192.168.1.200,12h
dhcp-host=aa:bb:cc:dd:ee:ff,printer,192.168.1.50
dhcp-host=11:22:33:44:55:66,laptop
";

/// a running `dhcp-dash` process with its own config & log file, killed on drop
#[derive(Debug)]
pub(crate) struct DashEnv {
    daemon: Child,
    addr: SocketAddr,
    log_file: PathBuf,
    _dir: TempDir,
}

impl DashEnv {
    pub(crate) fn start(conf: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let conf_path = dir.path().join("dnsmasq.conf");
        std::fs::write(&conf_path, conf).expect("failed to write dnsmasq config");
        let log_file = dir.path().join("dhcp_dashboard.log");
        let addr = free_addr();

        Self {
            daemon: start_dashboard(&conf_path, &log_file, addr),
            addr,
            log_file,
            _dir: dir,
        }
    }

    /// start with no flags at all, every setting comes from a `.env` file in
    /// the working directory
    pub(crate) fn start_with_dotenv(conf: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let conf_path = dir.path().join("dnsmasq.conf");
        std::fs::write(&conf_path, conf).expect("failed to write dnsmasq config");
        let log_file = dir.path().join("dhcp_dashboard.log");
        let addr = free_addr();
        let dotenv = format!(
            "BIND_ADDR={addr}\nCONF_PATH={}\nLOG_FILE={}\nNO_SUDO=true\nTHREADS=2\n",
            conf_path.display(),
            log_file.display(),
        );
        std::fs::write(dir.path().join(".env"), dotenv).expect("failed to write .env");

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dhcp-dash"));
        cmd.current_dir(dir.path());
        for var in ["BIND_ADDR", "CONF_PATH", "LOG_FILE", "NO_SUDO", "THREADS"] {
            cmd.env_remove(var);
        }
        Self {
            daemon: spawn_checked(cmd),
            addr,
            log_file,
            _dir: dir,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub(crate) fn log_file(&self) -> &Path {
        &self.log_file
    }
}

impl Drop for DashEnv {
    fn drop(&mut self) {
        stop_dashboard(&mut self.daemon);
    }
}

fn free_addr() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .expect("no free port")
}

fn start_dashboard(conf_path: &Path, log_file: &Path, addr: SocketAddr) -> Child {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dhcp-dash"));
    cmd.arg(format!("--conf-path={}", conf_path.display()))
        .arg(format!("--log-file={}", log_file.display()))
        .arg(format!("--bind-addr={addr}"))
        .arg("--no-sudo")
        .arg("--threads=2")
        .arg("--dash-log=debug");
    spawn_checked(cmd)
}

fn spawn_checked(mut cmd: Command) -> Child {
    let mut child = cmd.spawn().expect("Failed to start dashboard");
    std::thread::sleep(Duration::from_secs(1));
    if let Ok(Some(ret)) = child.try_wait() {
        panic!("Failed to start dashboard {:?}", ret);
    }
    child
}

fn stop_dashboard(daemon: &mut Child) {
    daemon.kill().expect("Failed to stop dashboard")
}
