use std::time::SystemTime;

const UPTIME_WINDOW_SECS: f64 = 30.0 * 86400.0;
const TEMP_CRITICAL_CELSIUS: f64 = 80.0;
const TEMP_WARNING_CELSIUS: f64 = 70.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const SERVICE_FAILURE_MARKER: &str = "Failed to start";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Warning,
    Error,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureStatus {
    Normal,
    Warning,
    Critical,
}

impl TemperatureStatus {
    pub fn from_celsius(value: f64) -> Self {
        if value > TEMP_CRITICAL_CELSIUS {
            Self::Critical
        } else if value > TEMP_WARNING_CELSIUS {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceHealth {
    Online,
    Degraded { code: u16, message: String },
}

impl ServiceHealth {
    pub fn degraded_proxy(unit: &str, detail: Option<&str>) -> Self {
        let message = match detail {
            Some(text) if text.contains(SERVICE_FAILURE_MARKER) => {
                format!("Failed to start {} service", unit)
            }
            _ => "Bad Gateway".to_string(),
        };
        Self::Degraded { code: 502, message }
    }

    pub fn status(&self) -> ServerStatus {
        match self {
            Self::Online => ServerStatus::Online,
            Self::Degraded { .. } => ServerStatus::Error,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UptimeStat {
    pub percentage: f64,
    pub duration: String,
}

impl UptimeStat {
    pub fn from_seconds(uptime_seconds: u64) -> Self {
        Self {
            percentage: uptime_percentage(uptime_seconds),
            duration: format_duration(uptime_seconds),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CpuStat {
    pub usage: u32,
    pub cores: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MemoryStat {
    pub usage: u32,
    pub total: String,
    pub used: String,
}

impl MemoryStat {
    pub fn from_bytes(total_bytes: u64, free_bytes: u64) -> Self {
        let used_bytes = total_bytes.saturating_sub(free_bytes);
        let usage = if total_bytes > 0 {
            (used_bytes as f64 / total_bytes as f64 * 100.0).round() as u32
        } else {
            0
        };
        Self {
            usage,
            total: format_gb(total_bytes),
            used: format_gb(used_bytes),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TemperatureStat {
    pub value: f64,
    pub status: TemperatureStatus,
}

impl TemperatureStat {
    pub fn from_reading(reading: Option<f64>) -> Self {
        let value = reading.unwrap_or(0.0);
        Self {
            value,
            status: TemperatureStatus::from_celsius(value),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSnapshot {
    pub status: ServerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub uptime: UptimeStat,
    pub cpu: CpuStat,
    pub memory: MemoryStat,
    pub temperature: TemperatureStat,
    pub timestamp: String,
}

impl ServerSnapshot {
    pub fn from_parts(
        health: ServiceHealth,
        uptime: UptimeStat,
        cpu: CpuStat,
        memory: MemoryStat,
        temperature: TemperatureStat,
    ) -> Self {
        let status = health.status();
        let (error_code, error_message) = match health {
            ServiceHealth::Online => (None, None),
            ServiceHealth::Degraded { code, message } => (Some(code), Some(message)),
        };

        Self {
            status,
            error_code,
            error_message,
            uptime,
            cpu,
            memory,
            temperature,
            timestamp: now_rfc3339(),
        }
    }

    pub fn degraded() -> Self {
        Self {
            status: ServerStatus::Error,
            error_code: Some(500),
            error_message: Some("Internal Server Error".to_string()),
            uptime: UptimeStat {
                percentage: 0.0,
                duration: "N/A".to_string(),
            },
            cpu: CpuStat {
                usage: 0,
                cores: 0,
                temperature: 0.0,
            },
            memory: MemoryStat {
                usage: 0,
                total: "0 GB".to_string(),
                used: "0 GB".to_string(),
            },
            temperature: TemperatureStat {
                value: 0.0,
                status: TemperatureStatus::Normal,
            },
            timestamp: now_rfc3339(),
        }
    }
}

pub fn cpu_usage_percent(load_one: f64, cores: u32) -> u32 {
    if cores == 0 {
        return 0;
    }
    (load_one / cores as f64 * 100.0).min(100.0).round() as u32
}

pub fn cpu_usage_rough(load_one: f64) -> u32 {
    (load_one * 25.0).min(100.0).round() as u32
}

pub fn uptime_percentage(uptime_seconds: u64) -> f64 {
    let pct = (uptime_seconds as f64 / UPTIME_WINDOW_SECS * 100.0).round();
    pct.min(99.99)
}

pub fn format_duration(uptime_seconds: u64) -> String {
    let days = uptime_seconds / 86400;
    let hours = (uptime_seconds % 86400) / 3600;
    let minutes = (uptime_seconds % 3600) / 60;
    format!("{}d {}h {}m", days, hours, minutes)
}

pub fn format_gb(bytes: u64) -> String {
    format!("{:.1} GB", bytes as f64 / BYTES_PER_GB)
}

fn now_rfc3339() -> String {
    humantime::format_rfc3339_millis(SystemTime::now()).to_string()
}
