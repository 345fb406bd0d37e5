use std::future::Future;
use std::time::Duration;

use sysinfo::{System, SystemExt};
use thiserror::Error;
use tokio::process::Command;
use tokio::time;

const PROC_LOADAVG: &str = "/proc/loadavg";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("команда {cmd} превысила тайм-аут {timeout_ms} мс")]
    Timeout { cmd: String, timeout_ms: u64 },
    #[error("не удалось запустить команду {cmd}: {source}")]
    Spawn {
        cmd: String,
        source: std::io::Error,
    },
    #[error("команда {cmd} завершилась с кодом {code}: {detail}")]
    Exit {
        cmd: String,
        code: i32,
        detail: String,
    },
    #[error("не удалось прочитать {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать load average из '{0}'")]
    ParseLoadAvg(String),
}

#[derive(Debug, Clone)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Raw host readings consumed by the collector.
pub trait MetricsProvider {
    fn cpu_core_count(&mut self) -> impl Future<Output = Result<usize, ProviderError>> + Send;
    fn load_average_one(&mut self) -> impl Future<Output = Result<f64, ProviderError>> + Send;
    fn load_average_fallback(&mut self) -> impl Future<Output = f64> + Send;
    fn memory(&mut self) -> impl Future<Output = Result<MemoryReading, ProviderError>> + Send;
    fn uptime_seconds(&mut self) -> impl Future<Output = Result<u64, ProviderError>> + Send;
    fn sensors_output(&mut self) -> impl Future<Output = Result<String, ProviderError>> + Send;
    fn service_active(
        &mut self,
        unit: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;
    fn service_detail(
        &mut self,
        unit: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

pub struct SystemProvider {
    system: System,
    command_timeout: Duration,
}

impl SystemProvider {
    pub fn new(command_timeout: Duration) -> Self {
        Self {
            system: System::new(),
            command_timeout,
        }
    }
}

impl MetricsProvider for SystemProvider {
    async fn cpu_core_count(&mut self) -> Result<usize, ProviderError> {
        self.system.refresh_cpu();
        Ok(self.system.cpus().len())
    }

    async fn load_average_one(&mut self) -> Result<f64, ProviderError> {
        let text = tokio::fs::read_to_string(PROC_LOADAVG)
            .await
            .map_err(|source| ProviderError::Read {
                path: PROC_LOADAVG.to_string(),
                source,
            })?;
        parse_loadavg_first(&text)
            .ok_or_else(|| ProviderError::ParseLoadAvg(text.trim().to_string()))
    }

    async fn load_average_fallback(&mut self) -> f64 {
        self.system.load_average().one
    }

    async fn memory(&mut self) -> Result<MemoryReading, ProviderError> {
        self.system.refresh_memory();
        Ok(MemoryReading {
            total_bytes: self.system.total_memory(),
            free_bytes: self.system.free_memory(),
        })
    }

    async fn uptime_seconds(&mut self) -> Result<u64, ProviderError> {
        Ok(self.system.uptime())
    }

    async fn sensors_output(&mut self) -> Result<String, ProviderError> {
        let output = run_cmd("sensors", &[], self.command_timeout).await?;
        if output.status != 0 {
            return Err(ProviderError::Exit {
                cmd: "sensors".to_string(),
                code: output.status,
                detail: output.trimmed_detail(),
            });
        }
        Ok(output.stdout)
    }

    async fn service_active(&mut self, unit: &str) -> Result<(), ProviderError> {
        let output = run_cmd("systemctl", &["is-active", unit], self.command_timeout).await?;
        if output.status != 0 {
            return Err(ProviderError::Exit {
                cmd: format!("systemctl is-active {}", unit),
                code: output.status,
                detail: output.trimmed_detail(),
            });
        }
        Ok(())
    }

    async fn service_detail(&mut self, unit: &str) -> Result<String, ProviderError> {
        // systemctl status exits non-zero for inactive units; the transcript still matters.
        let output = run_cmd(
            "systemctl",
            &["status", unit, "--no-pager"],
            self.command_timeout,
        )
        .await?;
        Ok(output.stdout)
    }
}

struct CommandOutput {
    stdout: String,
    stderr: String,
    status: i32,
}

impl CommandOutput {
    fn trimmed_detail(&self) -> String {
        let detail = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        detail.trim().to_string()
    }
}

async fn run_cmd(
    cmd: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput, ProviderError> {
    let mut command = Command::new(cmd);
    command.args(args).kill_on_drop(true);
    let result = time::timeout(timeout, command.output()).await;

    let output = match result {
        Ok(io_result) => io_result.map_err(|source| ProviderError::Spawn {
            cmd: cmd.to_string(),
            source,
        })?,
        Err(_) => {
            return Err(ProviderError::Timeout {
                cmd: cmd.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
    };

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        status: output.status.code().unwrap_or(-1),
    })
}

fn parse_loadavg_first(text: &str) -> Option<f64> {
    text.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct FakeProvider {
    pub cores: Option<usize>,
    pub proc_load: Option<f64>,
    pub fallback_load: f64,
    pub memory: Option<MemoryReading>,
    pub uptime: Option<u64>,
    pub sensors: Option<String>,
    pub service_up: bool,
    pub service_detail: Option<String>,
}

#[cfg(test)]
impl FakeProvider {
    pub(crate) fn healthy() -> Self {
        Self {
            cores: Some(4),
            proc_load: Some(1.0),
            fallback_load: 0.0,
            memory: Some(MemoryReading {
                total_bytes: 8_589_934_592,
                free_bytes: 4_294_967_296,
            }),
            uptime: Some(93_784),
            sensors: Some(
                "Package id 0:  +45.0°C  (high = +80.0°C, crit = +100.0°C)\n".to_string(),
            ),
            service_up: true,
            service_detail: None,
        }
    }

    fn unavailable(what: &str) -> ProviderError {
        ProviderError::Read {
            path: what.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "нет данных в тесте"),
        }
    }
}

#[cfg(test)]
impl MetricsProvider for FakeProvider {
    async fn cpu_core_count(&mut self) -> Result<usize, ProviderError> {
        self.cores.ok_or_else(|| Self::unavailable("cores"))
    }

    async fn load_average_one(&mut self) -> Result<f64, ProviderError> {
        self.proc_load.ok_or_else(|| Self::unavailable("loadavg"))
    }

    async fn load_average_fallback(&mut self) -> f64 {
        self.fallback_load
    }

    async fn memory(&mut self) -> Result<MemoryReading, ProviderError> {
        self.memory.clone().ok_or_else(|| Self::unavailable("memory"))
    }

    async fn uptime_seconds(&mut self) -> Result<u64, ProviderError> {
        self.uptime.ok_or_else(|| Self::unavailable("uptime"))
    }

    async fn sensors_output(&mut self) -> Result<String, ProviderError> {
        self.sensors
            .clone()
            .ok_or_else(|| Self::unavailable("sensors"))
    }

    async fn service_active(&mut self, _unit: &str) -> Result<(), ProviderError> {
        if self.service_up {
            Ok(())
        } else {
            Err(Self::unavailable("service"))
        }
    }

    async fn service_detail(&mut self, _unit: &str) -> Result<String, ProviderError> {
        self.service_detail
            .clone()
            .ok_or_else(|| Self::unavailable("service detail"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loadavg_takes_first_field() {
        assert_eq!(parse_loadavg_first("0.42 0.36 0.30 1/234 5678\n"), Some(0.42));
        assert_eq!(parse_loadavg_first("12.5"), Some(12.5));
        assert_eq!(parse_loadavg_first(""), None);
        assert_eq!(parse_loadavg_first("мусор"), None);
    }

    #[test]
    fn command_detail_prefers_stderr() {
        let output = CommandOutput {
            stdout: "inactive\n".to_string(),
            stderr: String::new(),
            status: 3,
        };
        assert_eq!(output.trimmed_detail(), "inactive");

        let output = CommandOutput {
            stdout: "ignored".to_string(),
            stderr: "Failed to connect to bus\n".to_string(),
            status: 1,
        };
        assert_eq!(output.trimmed_detail(), "Failed to connect to bus");
    }
}
