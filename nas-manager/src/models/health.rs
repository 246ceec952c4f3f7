//! Records behind the `health` commands.

use serde::{Deserialize, Serialize};

/// An entry of `GET alert/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub klass: String,
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub dismissed: bool,
}

fn default_level() -> String {
    "INFO".to_string()
}

/// An entry of `GET service`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub service: String,
    #[serde(default)]
    pub state: String,
    /// Start on boot
    #[serde(default)]
    pub enable: bool,
}

impl Service {
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("RUNNING")
    }
}

/// An entry of `GET disk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub size: u64,
    /// `HDD` or `SSD`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Alerts still needing attention, most severe first.
pub fn active_alerts(mut alerts: Vec<Alert>) -> Vec<Alert> {
    alerts.retain(|a| !a.dismissed);
    alerts.sort_by_key(|a| std::cmp::Reverse(severity(&a.level)));
    alerts
}

fn severity(level: &str) -> u8 {
    match level.to_ascii_uppercase().as_str() {
        "EMERGENCY" => 7,
        "ALERT" => 6,
        "CRITICAL" => 5,
        "ERROR" => 4,
        "WARNING" => 3,
        "NOTICE" => 2,
        "INFO" => 1,
        _ => 0,
    }
}
