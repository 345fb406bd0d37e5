pub mod provider;
pub mod sensors;

use crate::snapshot::{
    cpu_usage_percent, cpu_usage_rough, CpuStat, MemoryStat, ServerSnapshot, ServiceHealth,
    TemperatureStat, UptimeStat,
};
use provider::{MetricsProvider, ProviderError};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("не удалось определить число ядер процессора: {0}")]
    CpuCores(#[source] ProviderError),
    #[error("не удалось прочитать показатели памяти: {0}")]
    Memory(#[source] ProviderError),
    #[error("не удалось прочитать аптайм системы: {0}")]
    Uptime(#[source] ProviderError),
}

impl CollectError {
    pub fn collector(&self) -> &'static str {
        match self {
            Self::CpuCores(_) => "cpu",
            Self::Memory(_) => "memory",
            Self::Uptime(_) => "uptime",
        }
    }
}

pub async fn collect_snapshot<P: MetricsProvider>(
    provider: &mut P,
    service_unit: &str,
) -> Result<ServerSnapshot, CollectError> {
    let cores = provider
        .cpu_core_count()
        .await
        .map_err(CollectError::CpuCores)? as u32;

    let cpu_usage = match provider.load_average_one().await {
        Ok(load) => cpu_usage_percent(load, cores),
        Err(err) => {
            debug!(
                error = %err,
                "основной источник load average недоступен, используется грубая оценка"
            );
            cpu_usage_rough(provider.load_average_fallback().await)
        }
    };

    let memory = provider.memory().await.map_err(CollectError::Memory)?;
    let uptime_seconds = provider
        .uptime_seconds()
        .await
        .map_err(CollectError::Uptime)?;

    let temperature = match provider.sensors_output().await {
        Ok(transcript) => sensors::probe_chain(&transcript),
        Err(err) => {
            debug!(error = %err, "датчики температуры недоступны");
            None
        }
    };

    let health = match provider.service_active(service_unit).await {
        Ok(()) => ServiceHealth::Online,
        Err(err) => {
            warn!(service = service_unit, error = %err, "сервис обратного прокси неактивен");
            let detail = match provider.service_detail(service_unit).await {
                Ok(text) => Some(text),
                Err(err) => {
                    debug!(error = %err, "не удалось получить подробный статус сервиса");
                    None
                }
            };
            ServiceHealth::degraded_proxy(service_unit, detail.as_deref())
        }
    };

    let temperature_stat = TemperatureStat::from_reading(temperature);
    let cpu = CpuStat {
        usage: cpu_usage,
        cores,
        temperature: temperature_stat.value,
    };

    Ok(ServerSnapshot::from_parts(
        health,
        UptimeStat::from_seconds(uptime_seconds),
        cpu,
        MemoryStat::from_bytes(memory.total_bytes, memory.free_bytes),
        temperature_stat,
    ))
}
