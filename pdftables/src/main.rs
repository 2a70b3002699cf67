use clap::Parser;
use pdftables::{Application, Config, config::Args, telemetry};
use tokio::signal;

/// Resolves with the name of the first termination signal received.
async fn termination_signal() -> &'static str {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => "Ctrl+C",
        _ = terminate => "SIGTERM",
    }
}

/// One-line summary of what the service will run with, for `--validate` and startup logs.
fn describe(config: &Config) -> String {
    let staging = config
        .uploads
        .temp_dir
        .as_ref()
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "system temp dir".to_string());

    format!(
        "listen on {}, uploads up to {} bytes staged in {}, tables extracted by {} -jar {}",
        config.bind_address(),
        config.uploads.max_file_size,
        staging,
        config.extraction.java.display(),
        config.extraction.jar.display(),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid: {}", describe(&config));
        return Ok(());
    }

    // The OTLP exporter's HTTP client needs a process-wide rustls provider
    if rustls::crypto::aws_lc_rs::default_provider().install_default().is_err() {
        anyhow::bail!("a rustls crypto provider was already installed");
    }

    telemetry::init_telemetry(config.debug, config.enable_otel_export)?;
    tracing::info!("Starting pdftables: {}", describe(&config));

    Application::new(config)
        .serve(async {
            let name = termination_signal().await;
            tracing::info!("Received {}, shutting down gracefully...", name);
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_default_config() {
        let summary = describe(&Config::default());

        assert!(summary.contains("listen on 127.0.0.1:5001"), "{summary}");
        assert!(summary.contains("staged in system temp dir"), "{summary}");
        assert!(summary.ends_with("java -jar tabula.jar"), "{summary}");
    }
}
