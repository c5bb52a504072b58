//! Process startup: configuration, logging, and the listener task

use super::cli::{load_daemon_config, DaemonConfig};
use crate::consumer::{ConsumerReport, ConsumptionLoop};
use crate::core::error_handling::{fatal_message, log_error_with_context, ContextualError};
use crate::core::logging::{active_log_path, flush_logging, init_logging};
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::time::SystemClock;
use crate::core::version::long_version;
use crate::document::{DocumentWriter, FsDocumentSink, MessageMetadata, PersistError};
use crate::queue::{NatsQueueSource, QueueSource};
use crate::sanitize::Sanitizer;
use std::sync::Arc;

/// Failures that stop the daemon before or outside the consumer loop
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Output(#[from] PersistError),

    #[error("Listener task ended abnormally: {0}")]
    Task(String),
}

impl ContextualError for StartupError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Run the daemon and return the process exit code
pub async fn startup() -> i32 {
    let config = match load_daemon_config().await {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from this file, so report on stderr
            eprintln!("{}", fatal_message(&e, "Invalid configuration"));
            return 1;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!(
            "Error: unable to create log directory {}: {}",
            config.log_dir.display(),
            e
        );
        return 1;
    }
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error: unable to start logging: {}", e);
        return 1;
    }

    log::info!("mqlistener {} starting", long_version());
    log::debug!("Logging to {}", active_log_path(&config.log_dir).display());
    log::info!(
        "Endpoint {} channel '{}' queue '{}', saving to {}",
        config.endpoint.describe(),
        config.endpoint.channel,
        config.endpoint.queue,
        config.output_dir.display()
    );

    let result =
        ShutdownCoordinator::guard_with_coordinator(|shutdown, _| run_listener(config, shutdown))
            .await;

    let code = match result {
        Ok(report) => {
            log::debug!("Final counters: {}", report.to_json());
            0
        }
        Err(e) => {
            log_error_with_context(&e, &e.to_string());
            1
        }
    };
    log::info!("Listener stopped.");
    flush_logging();
    code
}

/// Prepare the output directory and drain the queue until shutdown
pub async fn run_listener(
    config: DaemonConfig,
    shutdown: ShutdownCoordinator,
) -> Result<ConsumerReport, StartupError> {
    let writer = DocumentWriter::new(
        Arc::new(FsDocumentSink::new(&config.output_dir)),
        Arc::new(SystemClock),
    );
    writer.prepare().await?;

    let source: Arc<dyn QueueSource> = Arc::new(NatsQueueSource::new(config.endpoint.clone()));
    let consumer = ConsumptionLoop::new(
        source,
        writer,
        Sanitizer::new(config.header_marker, config.payload_marker),
        MessageMetadata::text(config.endpoint.queue),
        config.consumer,
        &shutdown,
    );

    tokio::spawn(consumer.run())
        .await
        .map_err(|e| StartupError::Task(e.to_string()))
}
