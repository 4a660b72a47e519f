//! Service wiring: builds every collaborator from the configuration.

use std::sync::Arc;

use anyhow::Context;
use synd_core::health::{Check, CheckFn, CheckFuture};
use synd_core::{BoxedError, Locker};
use synd_engine::{Exporter, FullExporter};
use synd_postgres::{PgClient, PgInquirer};
use synd_reqwest::{EnrichedContentFetcher, HttpClients, PolicyAgentClient, StoreWriter};
use synd_server::{HealthService, ServiceState};
use synd_stream::{Listener, MessageMapper, NotificationHandler, PublicationConsumer};

use super::Cli;
use crate::TRACING_TARGET_STARTUP;

/// Everything `main` needs to serve traffic.
pub struct Services {
    pub state: ServiceState,
    pub incremental: Option<IncrementalExport>,
}

/// The incremental-export pipeline, present when enabled.
pub struct IncrementalExport {
    pub listener: Arc<Listener>,
    pub consumer: PublicationConsumer,
}

/// Builds clients, engine, listener and health checks from the parsed
/// configuration.
pub async fn create_services(cli: &Cli) -> anyhow::Result<Services> {
    let pg = PgClient::new(cli.postgres.clone()).context("creating database client")?;
    let clients = HttpClients::new().context("creating HTTP clients")?;

    let fetcher = EnrichedContentFetcher::new(clients.clone(), &cli.http);
    let writer = StoreWriter::new(clients.clone(), &cli.http);
    let exporter = Arc::new(Exporter::new(
        Arc::new(fetcher.clone()),
        Arc::new(writer.clone()),
    ));

    let registry = Arc::new(FullExporter::new(
        cli.export.nr_of_concurrent_workers,
        exporter.clone(),
    ));
    let inquirer = Arc::new(PgInquirer::new(
        pg.clone(),
        cli.export.allowed_content_types.clone(),
        cli.export.allowed_publication_uuids.clone(),
    ));
    let locker = Arc::new(Locker::new());

    let incremental = if cli.export.is_inc_export_enabled {
        let mapper = MessageMapper::new(
            cli.export.origin_allowlist()?,
            cli.export.allowed_content_types.iter().cloned(),
            cli.export.allowed_publication_uuids.iter().cloned(),
        );
        let policy = Arc::new(PolicyAgentClient::new(clients.clone(), &cli.http));
        let handler = NotificationHandler::new(exporter.clone(), cli.stream.notification_delay());
        let listener = Listener::new(
            handler,
            mapper,
            policy,
            locker.clone(),
            cli.stream.max_concurrency,
        );
        let consumer = PublicationConsumer::connect(&cli.stream)
            .await
            .context("failed to create the publication consumer")?;
        Some(IncrementalExport { listener, consumer })
    } else {
        tracing::warn!(target: TRACING_TARGET_STARTUP, "INCREMENTAL export is not enabled");
        None
    };

    let health = Arc::new(HealthService::new(
        health_checks(&pg, &fetcher, &writer, incremental.as_ref()),
        registry.clone(),
    ));

    let state = ServiceState {
        full_exporter: registry,
        inquirer,
        locker,
        health,
        inc_export_enabled: cli.export.is_inc_export_enabled,
        throttle: cli.export.throttle(),
    };

    Ok(Services { state, incremental })
}

fn health_checks(
    pg: &PgClient,
    fetcher: &EnrichedContentFetcher,
    writer: &StoreWriter,
    incremental: Option<&IncrementalExport>,
) -> Vec<Check> {
    let store_check: CheckFn = {
        let pg = pg.clone();
        Arc::new(move || {
            let pg = pg.clone();
            Box::pin(async move { pg.ping().await.map_err(BoxedError::from) }) as CheckFuture
        })
    };

    let read_check: CheckFn = {
        let fetcher = fetcher.clone();
        Arc::new(move || {
            let fetcher = fetcher.clone();
            Box::pin(async move { fetcher.check_health().await.map_err(BoxedError::from) })
                as CheckFuture
        })
    };

    let writer_check: CheckFn = {
        let writer = writer.clone();
        Arc::new(move || {
            let writer = writer.clone();
            Box::pin(async move { writer.check_health().await.map_err(BoxedError::from) })
                as CheckFuture
        })
    };

    let mut checks = vec![
        Check::new(
            "CheckConnectivityToContentStore",
            "The service is unable to connect to the content store. FULL or TARGETED export won't work because of this",
            store_check,
        ),
        Check::new(
            "CheckConnectivityToEnrichedContentApi",
            "The service is unable to connect to the enriched content API. Neither FULL nor INCREMENTAL or TARGETED export will work because of this",
            read_check,
        ),
        Check::new(
            "CheckConnectivityToStoreWriter",
            "The service is unable to connect to the store writer. Neither FULL nor INCREMENTAL or TARGETED export will work because of this",
            writer_check,
        ),
    ];

    if let Some(incremental) = incremental {
        let consumer = incremental.consumer.clone();
        let stream_check: CheckFn = Arc::new(move || {
            let consumer = consumer.clone();
            Box::pin(async move { consumer.connectivity_check() }) as CheckFuture
        });
        checks.push(
            Check::new(
                "CheckEventStreamConsumer",
                "The service is unable to consume publication events. INCREMENTAL export won't work because of this",
                stream_check,
            )
            .excluded_from_gtg()
            .tolerated_during_full_export(),
        );
    }

    checks
}
