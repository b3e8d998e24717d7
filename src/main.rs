use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use serde_json::Value;

use doc_tools::algolia::{IndexOptions, index_site};
use doc_tools::antora;
use doc_tools::cache::{Clock, SystemClock, TtlCache, spawn_pruner};
use doc_tools::config::{CACHE_TTL, Config, JOB_RETENTION};
use doc_tools::error::{DocToolsError, GenerationReport, Result, ToolOutcome};
use doc_tools::generate::bundle_openapi::{BundleOptions, bundle_openapi};
use doc_tools::generate::cloud_regions::{
    CloudRegionsOptions, DEFAULT_REGIONS_OWNER, DEFAULT_REGIONS_PATH, DEFAULT_REGIONS_REPO, RegionsFormat,
    RegionsSource, generate_cloud_regions,
};
use doc_tools::generate::crd_spec::{CrdSpecOptions, generate_crd_spec};
use doc_tools::generate::helm_spec::{HelmSpecOptions, OPERATOR_GIT_URL, generate_helm_spec};
use doc_tools::generate::metrics_docs::{
    DEFAULT_INTERNAL_METRICS_URL, DEFAULT_PUBLIC_METRICS_URL, MetricsDocsOptions, generate_metrics_docs,
};
use doc_tools::generate::property_docs::{PropertyDocsOptions, generate_property_docs};
use doc_tools::generate::rpcn_connector_docs::{ConnectorDocsOptions, generate_rpcn_connector_docs};
use doc_tools::generate::rpk_docs::{RpkDocsOptions, generate_rpk_docs};
use doc_tools::github::GitHubConnector;
use doc_tools::jobs::JobQueue;
use doc_tools::proto::{CompareOptions, ReportFormat, Surface, compare_proto_descriptions};
use doc_tools::review::review_generated_docs;
use doc_tools::server::{DocTools, ToolContext, validate_registry};
use doc_tools::versions::{self, ProductVersion};

#[cfg(feature = "trace")]
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "doc-tools", version, about = "Redpanda documentation automation")]
struct Cli {
    /// Root of the docs content source (defaults to the current directory)
    #[arg(long, global = true)]
    docs_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate reference documentation
    #[command(subcommand)]
    Generate(GenerateCommand),
    /// Print the latest Redpanda version as KEY=value lines
    GetRedpandaVersion(VersionArgs),
    /// Print the latest Redpanda Console version as KEY=value lines
    GetConsoleVersion(VersionArgs),
    /// Expose a README.adoc as a page of the ROOT module
    LinkReadme {
        /// Directory holding the README.adoc, relative to the docs root
        #[arg(long)]
        subdir: String,
        /// Page path under modules/ROOT/pages
        #[arg(long)]
        target: String,
    },
    /// Download a file or directory from a GitHub repository
    Fetch {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        repo: String,
        /// File or directory path inside the repository
        #[arg(long)]
        remote_path: String,
        #[arg(long)]
        save_dir: PathBuf,
        /// Name to save a single file under
        #[arg(long)]
        filename: Option<String>,
        /// Branch, tag or commit
        #[arg(long = "ref")]
        reference: Option<String>,
    },
    /// Compare published OpenAPI descriptions against a proto-generated spec
    CompareProto {
        #[arg(long, value_enum)]
        surface: Surface,
        /// Spec generated from the proto sources
        #[arg(long)]
        generated: PathBuf,
        /// Published spec (defaults to the api-docs repository copy)
        #[arg(long)]
        current: Option<PathBuf>,
        /// Proto repository used to locate RPCs and PREVIEW markers
        #[arg(long)]
        proto_repo: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ReportFormat::Report)]
        format: ReportFormat,
        /// List proto commits since this git ref
        #[arg(long)]
        since: Option<String>,
        /// Keep differences for PREVIEW operations
        #[arg(long)]
        include_preview: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Review generated documentation for common problems
    Review {
        /// Directory to review, relative to the docs root
        dir: PathBuf,
    },
    /// Index a built site into Algolia
    AlgoliaIndex {
        /// Antora build output directory
        #[arg(long)]
        site_dir: PathBuf,
        /// Public URL the site is served from
        #[arg(long)]
        base_url: String,
        /// Compute the plan without sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve the tools over MCP on stdio
    Mcp,
}

#[derive(clap::Args)]
struct VersionArgs {
    /// Report the latest beta when it is newer than stable
    #[arg(long)]
    beta: bool,
    /// Use beta when antora.yml marks the component as a prerelease
    #[arg(long)]
    from_antora: bool,
    /// Write the version into antora.yml as well
    #[arg(long)]
    update_antora: bool,
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Configuration property reference
    PropertyDocs {
        #[arg(long, default_value = "dev")]
        tag: String,
        #[arg(long, default_value = "property-extractor")]
        extractor: String,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        overrides: Option<PathBuf>,
        /// Only write the JSON dump
        #[arg(long)]
        no_pages: bool,
    },
    /// Metrics reference scraped from a running broker
    MetricsDocs {
        #[arg(long, default_value = DEFAULT_PUBLIC_METRICS_URL)]
        public_url: String,
        #[arg(long, default_value = DEFAULT_INTERNAL_METRICS_URL)]
        internal_url: String,
        /// Skip the internal metrics endpoint
        #[arg(long)]
        public_only: bool,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// rpk command reference
    RpkDocs {
        #[arg(long, default_value = "rpk")]
        rpk: String,
        #[arg(long, default_value_t = 4)]
        max_depth: usize,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Redpanda Connect connector catalog
    RpcnConnectorDocs {
        #[arg(long, default_value = "rpk")]
        binary: String,
        /// Version label, overriding the one the binary reports
        #[arg(long)]
        connect_version: Option<String>,
        /// Previous connect-<version>.json to diff against
        #[arg(long)]
        previous: Option<PathBuf>,
        #[arg(long)]
        pages_dir: Option<PathBuf>,
        /// Connector overrides (defaults to docs-data/overrides.json)
        #[arg(long)]
        overrides: Option<PathBuf>,
    },
    /// Helm chart value references
    HelmSpec {
        /// Local charts directory; the operator repository is cloned otherwise
        #[arg(long)]
        chart_dir: Option<PathBuf>,
        #[arg(long, default_value = OPERATOR_GIT_URL)]
        repo_url: String,
        #[arg(long = "ref", default_value = "main")]
        reference: String,
        #[arg(long, default_value = "charts")]
        charts_subdir: String,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Cloud regions table
    CloudRegions {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = RegionsFormat::Adoc)]
        format: RegionsFormat,
        /// Local regions YAML instead of GitHub
        #[arg(long)]
        source_path: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_REGIONS_OWNER)]
        owner: String,
        #[arg(long, default_value = DEFAULT_REGIONS_REPO)]
        repo: String,
        #[arg(long, default_value = DEFAULT_REGIONS_PATH)]
        path: String,
        #[arg(long = "ref", default_value = "main")]
        reference: String,
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long)]
        tier: Option<String>,
        #[arg(long)]
        include_private: bool,
    },
    /// Kubernetes CRD reference
    CrdSpec {
        #[arg(long)]
        source_path: Option<PathBuf>,
        #[arg(long, default_value = OPERATOR_GIT_URL)]
        repo_url: String,
        #[arg(long = "ref", default_value = "main")]
        reference: String,
        #[arg(long, default_value = "operator/api")]
        api_subdir: String,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        templates_dir: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Bundled and validated OpenAPI document for an API surface
    BundleOpenapi {
        #[arg(long, value_enum)]
        surface: Surface,
        #[arg(long)]
        tag: String,
        #[arg(long)]
        repo: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long, default_value = "buf.gen.openapi.yaml")]
        buf_template: String,
    },
}

/// What a successful command prints on stdout
enum Output {
    Report(GenerationReport),
    Text(String),
}

#[cfg(feature = "trace")]
fn init_tracing(mcp: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if mcp {
        // stdout carries the protocol
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::fs::File::create("doc-tools-mcp.log")?)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

async fn version_command(
    config: &Config,
    github: &GitHubConnector,
    args: VersionArgs,
    console: bool,
) -> Result<Output> {
    let antora_yml = config.docs_root.join("antora.yml");
    let beta = args.beta || (args.from_antora && antora::read_prerelease(&std::fs::read_to_string(&antora_yml)?)?);

    let (version, prefix, attribute): (ProductVersion, &str, &str) = if console {
        (versions::console_version(github, beta).await?, "CONSOLE", "latest-console-version")
    } else {
        (versions::redpanda_version(github, beta).await?, "REDPANDA", "latest-redpanda-version")
    };
    if args.update_antora {
        antora::update_antora_file(&antora_yml, &[(attribute, version.version.as_str())])?;
    }
    Ok(Output::Text(version.to_env_lines(prefix)))
}

async fn generate(config: &Config, github: &GitHubConnector, command: GenerateCommand) -> Result<GenerationReport> {
    match command {
        GenerateCommand::PropertyDocs {
            tag,
            extractor,
            output_dir,
            overrides,
            no_pages,
        } => {
            let options = PropertyDocsOptions {
                tag,
                extractor,
                output_dir,
                overrides,
                generate_pages: !no_pages,
            };
            generate_property_docs(config, &options).await
        }
        GenerateCommand::MetricsDocs {
            public_url,
            internal_url,
            public_only,
            tag,
            output_dir,
        } => {
            let options = MetricsDocsOptions {
                public_url,
                internal_url: (!public_only).then_some(internal_url),
                output_dir,
                tag,
                ..Default::default()
            };
            generate_metrics_docs(config, &options).await
        }
        GenerateCommand::RpkDocs {
            rpk,
            max_depth,
            output_dir,
        } => {
            let options = RpkDocsOptions {
                rpk,
                output_dir,
                max_depth,
            };
            generate_rpk_docs(config, &options).await
        }
        GenerateCommand::RpcnConnectorDocs {
            binary,
            connect_version,
            previous,
            pages_dir,
            overrides,
        } => {
            let options = ConnectorDocsOptions {
                binary,
                version: connect_version,
                previous,
                pages_dir,
                overrides,
            };
            generate_rpcn_connector_docs(config, &options).await
        }
        GenerateCommand::HelmSpec {
            chart_dir,
            repo_url,
            reference,
            charts_subdir,
            output_dir,
        } => {
            let options = HelmSpecOptions {
                chart_dir,
                repo_url,
                reference,
                charts_subdir,
                output_dir,
            };
            generate_helm_spec(config, &options).await
        }
        GenerateCommand::CloudRegions {
            output,
            format,
            source_path,
            owner,
            repo,
            path,
            reference,
            template,
            tier,
            include_private,
        } => {
            let source = match source_path {
                Some(local) => RegionsSource::Local(local),
                None => RegionsSource::GitHub {
                    owner,
                    repo,
                    path,
                    reference,
                },
            };
            let options = CloudRegionsOptions {
                source,
                output,
                format,
                template,
                tier,
                include_private,
            };
            generate_cloud_regions(&options, Some(github)).await
        }
        GenerateCommand::CrdSpec {
            source_path,
            repo_url,
            reference,
            api_subdir,
            config: crd_config,
            templates_dir,
            output,
        } => {
            let options = CrdSpecOptions {
                source_path,
                repo_url,
                reference,
                api_subdir,
                config: crd_config,
                templates_dir,
                output,
            };
            generate_crd_spec(config, &options).await
        }
        GenerateCommand::BundleOpenapi {
            surface,
            tag,
            repo,
            output_dir,
            buf_template,
        } => {
            let options = BundleOptions {
                surface,
                tag,
                repo,
                output_dir,
                buf_template,
            };
            bundle_openapi(config, &options).await
        }
    }
}

async fn execute(config: &Config, github: &GitHubConnector, command: Commands) -> Result<Output> {
    match command {
        Commands::Generate(command) => Ok(Output::Report(generate(config, github, command).await?)),
        Commands::GetRedpandaVersion(args) => version_command(config, github, args, false).await,
        Commands::GetConsoleVersion(args) => version_command(config, github, args, true).await,
        Commands::LinkReadme { subdir, target } => {
            let link = antora::link_readme(&config.docs_root, &subdir, &target)?;
            let mut report = GenerationReport::default();
            report.file(link);
            Ok(Output::Report(report))
        }
        Commands::Fetch {
            owner,
            repo,
            remote_path,
            save_dir,
            filename,
            reference,
        } => {
            let written = github
                .fetch_to_dir(
                    &owner,
                    &repo,
                    &remote_path,
                    &save_dir,
                    filename.as_deref(),
                    reference.as_deref(),
                )
                .await?;
            let mut report = GenerationReport::default();
            for path in &written {
                report.file(path);
            }
            report.count("files", written.len());
            report.count("githubRequests", github.requests_made());
            Ok(Output::Report(report))
        }
        Commands::CompareProto {
            surface,
            generated,
            current,
            proto_repo,
            format,
            since,
            include_preview,
            output,
        } => {
            let current_spec = match (current, &config.api_docs_repo_path) {
                (Some(path), _) => path,
                (None, Some(api_docs)) => api_docs.join(surface.published_spec()),
                (None, None) => {
                    return Err(DocToolsError::not_found(
                        "current spec",
                        "Pass --current or set API_DOCS_REPO_PATH",
                    ));
                }
            };
            let options = CompareOptions {
                surface,
                current_spec,
                generated_spec: generated,
                proto_repo: proto_repo.or_else(|| surface.repo_path(config)),
                format,
                since_ref: since,
                include_preview,
                output,
            };
            let report = compare_proto_descriptions(&options).await?;
            match (&report.data, &options.output) {
                (Some(Value::String(text)), None) => Ok(Output::Text(text.clone())),
                _ => Ok(Output::Report(report)),
            }
        }
        Commands::Review { dir } => Ok(Output::Report(review_generated_docs(&config.docs_root.join(dir))?)),
        Commands::AlgoliaIndex {
            site_dir,
            base_url,
            dry_run,
        } => {
            let options = IndexOptions {
                site_dir,
                base_url,
                dry_run,
            };
            Ok(Output::Report(index_site(config, &options).await?))
        }
        Commands::Mcp => Err(DocToolsError::Validation(
            "the MCP server is started on its own, not dispatched".to_string(),
        )),
    }
}

async fn serve_mcp(
    config: Config,
    github: GitHubConnector,
    cache: Arc<TtlCache<String, String>>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<()> {
    validate_registry()?;
    tracing::info!("Starting MCP server");

    spawn_pruner(cache, Duration::from_secs(60));
    let jobs = JobQueue::new(JOB_RETENTION, clock);
    jobs.spawn_pruner(Duration::from_secs(60));

    let ctx = ToolContext {
        config: Arc::new(config),
        github: Arc::new(github),
        jobs,
    };
    let service = DocTools::new(ctx).serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    tokio::select! {
        quit = service.waiting() => {
            let reason = quit?;
            tracing::info!("MCP server stopped: {:?}", reason);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down MCP server");
        }
    }
    Ok(())
}

/// You can inspect the server using the Model Context Protocol Inspector.
/// npx @modelcontextprotocol/inspector cargo run -- mcp
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mcp = matches!(cli.command, Commands::Mcp);

    #[cfg(feature = "trace")]
    init_tracing(mcp)?;

    let config = Config::from_env().with_docs_root(cli.docs_root);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(TtlCache::new(CACHE_TTL, clock.clone()));
    let github = GitHubConnector::new(config.github_token.as_deref(), cache.clone())?;

    if mcp {
        return serve_mcp(config, github, cache, clock).await;
    }

    let code = match execute(&config, &github, cli.command).await {
        Ok(Output::Text(text)) => {
            print!("{text}");
            0
        }
        Ok(Output::Report(report)) => {
            println!("{}", ToolOutcome::from(Ok(report)).to_json());
            0
        }
        Err(err) => {
            tracing::error!("{}", err);
            let outcome = ToolOutcome::from(Err(err));
            eprintln!("{}", outcome.to_json());
            outcome.exit_code
        }
    };
    std::process::exit(code);
}
