use crate::snapshot::{ServerSnapshot, ServerStatus};
use prometheus::core::Collector;
use prometheus::{opts, Counter, CounterVec, Encoder, Gauge, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub statusd_cpu_usage_percent: Gauge,
    pub statusd_cpu_cores: Gauge,
    pub statusd_cpu_temperature_celsius: Gauge,
    pub statusd_memory_usage_percent: Gauge,
    pub statusd_uptime_percentage: Gauge,
    pub statusd_service_up: Gauge,
    pub statusd_snapshot_count_total: Counter,
    pub statusd_scrape_count_total: Counter,
    pub statusd_collect_errors_total: CounterVec,
    pub statusd_last_collect_timestamp_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let statusd_cpu_usage_percent = Gauge::with_opts(opts!(
            "statusd_cpu_usage_percent",
            "CPU usage estimated from the 1-minute load average in percent (0..100)"
        ))?;
        let statusd_cpu_cores =
            Gauge::with_opts(opts!("statusd_cpu_cores", "Number of logical CPU cores"))?;
        let statusd_cpu_temperature_celsius = Gauge::with_opts(opts!(
            "statusd_cpu_temperature_celsius",
            "CPU temperature in Celsius (0 when no sensor is readable)"
        ))?;
        let statusd_memory_usage_percent = Gauge::with_opts(opts!(
            "statusd_memory_usage_percent",
            "Memory usage in percent"
        ))?;
        let statusd_uptime_percentage = Gauge::with_opts(opts!(
            "statusd_uptime_percentage",
            "Host uptime as a percentage of a 30-day window, capped at 99.99"
        ))?;
        let statusd_service_up = Gauge::with_opts(opts!(
            "statusd_service_up",
            "Reverse proxy service state 0/1"
        ))?;
        let statusd_snapshot_count_total = Counter::with_opts(opts!(
            "statusd_snapshot_count_total",
            "Number of assembled status snapshots"
        ))?;
        let statusd_scrape_count_total = Counter::with_opts(opts!(
            "statusd_scrape_count_total",
            "Number of /metrics scrapes"
        ))?;
        let statusd_collect_errors_total = CounterVec::new(
            opts!(
                "statusd_collect_errors_total",
                "Collector errors total by collector"
            ),
            &["collector"],
        )?;
        let statusd_last_collect_timestamp_seconds = Gauge::with_opts(opts!(
            "statusd_last_collect_timestamp_seconds",
            "Unix timestamp of the last assembled snapshot"
        ))?;

        register(&registry, &statusd_cpu_usage_percent)?;
        register(&registry, &statusd_cpu_cores)?;
        register(&registry, &statusd_cpu_temperature_celsius)?;
        register(&registry, &statusd_memory_usage_percent)?;
        register(&registry, &statusd_uptime_percentage)?;
        register(&registry, &statusd_service_up)?;
        register(&registry, &statusd_snapshot_count_total)?;
        register(&registry, &statusd_scrape_count_total)?;
        register(&registry, &statusd_collect_errors_total)?;
        register(&registry, &statusd_last_collect_timestamp_seconds)?;

        Ok(Arc::new(Self {
            registry,
            statusd_cpu_usage_percent,
            statusd_cpu_cores,
            statusd_cpu_temperature_celsius,
            statusd_memory_usage_percent,
            statusd_uptime_percentage,
            statusd_service_up,
            statusd_snapshot_count_total,
            statusd_scrape_count_total,
            statusd_collect_errors_total,
            statusd_last_collect_timestamp_seconds,
        }))
    }

    pub fn update_from_snapshot(&self, snapshot: &ServerSnapshot) {
        self.statusd_cpu_usage_percent.set(snapshot.cpu.usage as f64);
        self.statusd_cpu_cores.set(snapshot.cpu.cores as f64);
        self.statusd_cpu_temperature_celsius
            .set(snapshot.cpu.temperature);
        self.statusd_memory_usage_percent
            .set(snapshot.memory.usage as f64);
        self.statusd_uptime_percentage.set(snapshot.uptime.percentage);
        self.statusd_service_up
            .set(if snapshot.status == ServerStatus::Online {
                1.0
            } else {
                0.0
            });
        self.statusd_last_collect_timestamp_seconds
            .set(now_unix() as f64);
        self.statusd_snapshot_count_total.inc();
    }

    pub fn inc_scrape_count(&self) {
        self.statusd_scrape_count_total.inc();
    }

    pub fn inc_collect_error(&self, collector: &str) {
        self.statusd_collect_errors_total
            .with_label_values(&[collector])
            .inc();
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
