use std::net::SocketAddr;
use std::sync::OnceLock;

static INIT: OnceLock<()> = OnceLock::new();

/// Install the Prometheus exporter once, when `ICF_METRICS=1`.
pub fn ensure_exporter() {
    INIT.get_or_init(|| {
        if !exporter_enabled(std::env::var("ICF_METRICS").ok().as_deref()) {
            return;
        }
        let addr = listen_addr(std::env::var("ICF_METRICS_ADDR").ok().as_deref());
        let builder =
            metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
        if let Err(e) = builder.install() {
            tracing::warn!(error = %e, %addr, "metrics exporter not installed");
        }
    });
}

fn exporter_enabled(flag: Option<&str>) -> bool {
    flag == Some("1")
}

fn listen_addr(raw: Option<&str>) -> SocketAddr {
    raw.and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 9464)))
}
