use anyhow::Context;
use docrag::{
    AppState, DocragConfig, StoreBackend, build_app,
    cli::{Cli, Commands, output::Output},
    rag::ingest::checked_chunker,
    utils::toml_config::LogFormat,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config_found = cli.config.exists();
    let config = DocragConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    init_tracing(&config, cli.verbose);
    if !config_found {
        output.warning(&format!(
            "{} not found, using default configuration",
            cli.config.display()
        ));
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, &output).await,
        command => {
            if config.store.provider == StoreBackend::Memory {
                output.warning("The in-memory store does not outlive this command");
            }
            let state = AppState::from_config(config).await?;
            if let Err(e) = run_command(command, &state, &output).await {
                output.error(&e.to_string());
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &DocragConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},tower_http={default_level}")));

    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config: DocragConfig, output: &Output) -> anyhow::Result<()> {
    output.banner();

    let address = config.bind_address();
    output.kv("store", &format!("{:?} ({})", config.store.provider, config.store.collection));
    output.kv(
        "embeddings",
        &format!("{:?} ({})", config.embeddings.provider, config.embeddings.model_name()),
    );
    output.kv("model", &format!("{} at {}", config.llm.model, config.llm.base_url));
    output.kv("documents", &config.rag.documents_dir.display().to_string());

    let state = AppState::from_config(config)
        .await
        .context("Failed to initialize retrieval store or LLM client")?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    output.success(&format!("Listening on http://{}", address));
    output.hint(&format!(
        "OpenAPI document: http://{}/api-docs/openapi.json",
        address
    ));
    info!(%address, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

async fn run_command(command: Commands, state: &AppState, output: &Output) -> docrag::Result<()> {
    let rag = &state.config.rag;

    match command {
        // Dispatched to `serve` before the state is built
        Commands::Serve => {}

        Commands::Embed {
            directory,
            chunk_size,
            overlap,
        } => {
            let chunker = checked_chunker(
                chunk_size.unwrap_or(rag.chunk_size),
                overlap.unwrap_or(rag.chunk_overlap),
            )?;
            let directory = directory.unwrap_or_else(|| rag.documents_dir.clone());

            output.header(&format!("Embedding {}", directory.display()));
            let report = state
                .ingestion()
                .ingest_directory(&directory, chunker)
                .await?;
            output.ingest_report(&report);
        }

        Commands::Add { text } => {
            let chunker = checked_chunker(rag.chunk_size, rag.chunk_overlap)?;
            let ids = state.ingestion().ingest_text(&text, chunker).await?;
            output.success(&format!("Text added successfully as {} chunks.", ids.len()));
            for id in &ids {
                output.list_item(id);
            }
        }

        Commands::Query { query, n_results } => {
            let result = state
                .query_pipeline()
                .answer(&query, n_results.unwrap_or(rag.n_results))
                .await?;
            output.answer(&result);
        }

        Commands::Stats => {
            let total = state.store.count().await?;
            output.header("Collection");
            output.kv("name", state.store.collection_name());
            output.kv("provider", state.store.provider_name());
            output.kv("chunks", &total.to_string());
        }

        Commands::Clear { yes } => {
            let collection = state.store.collection_name();
            if !yes && !output.confirm(&format!("Delete every chunk in '{}'?", collection)) {
                output.info("Aborted");
                return Ok(());
            }
            state.store.clear().await?;
            output.success(&format!("Collection '{}' cleared.", collection));
        }
    }

    Ok(())
}
