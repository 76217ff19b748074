//! Collocate CLI: manage a corpus of articles and their collocations.
//!
//! Usage:
//!   collocate article <subcommand> [--db path] [--config path]
//!   collocate collocations <subcommand>
//!   collocate reconcile <cluster>
//!   collocate graph <article-id>
//!   collocate classify <article-id> [--model path]

use clap::{Parser, Subcommand, ValueEnum};
use collocate::storage::{ArticleFilter, CollocationFilter};
use collocate::{
    ClusterId, Config, CorpusService, LinearModel, MemoryIndex, OpenStore, Relevance,
    SparqlClient, SqliteStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "collocate",
    version,
    about = "Terminology extraction over clustered scientific corpora"
)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file (overrides the configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage articles
    Article {
        #[command(subcommand)]
        action: ArticleAction,
    },
    /// Inspect and annotate cluster collocations
    Collocations {
        #[command(subcommand)]
        action: CollocationAction,
    },
    /// Recompute every aggregate count of a cluster
    Reconcile {
        /// Cluster identifier (CS_COLLOCS, SW_COLLOCS, SW_COLLOCS_NO_LEMMAS)
        cluster: ClusterId,
    },
    /// Crawl (or load) the category graph of an article
    Graph {
        article_id: i64,
        /// Drop the cached graph first
        #[arg(long)]
        rebuild: bool,
    },
    /// Label the collocations of an article with a frozen model
    Classify {
        article_id: i64,
        /// Model JSON (defaults to the configured model)
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ArticleAction {
    /// Add an article from a UTF-8 text file
    Add {
        path: PathBuf,
        #[arg(long)]
        cluster: ClusterId,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        venue: Option<String>,
    },
    /// Copy a document into the data directory and add it, taking title and
    /// abstract from its text
    Import {
        path: PathBuf,
        #[arg(long)]
        cluster: ClusterId,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        venue: Option<String>,
    },
    /// Delete an article, its document and its collocations
    Delete { article_id: i64 },
    /// List articles
    List {
        #[arg(long)]
        cluster: Option<ClusterId>,
        /// Only articles published up to this year
        #[arg(long)]
        until: Option<i32>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the collocations of an article
    Show { article_id: i64 },
}

#[derive(Subcommand)]
enum CollocationAction {
    /// List aggregate collocations of a cluster
    List {
        cluster: ClusterId,
        /// Substring the n-gram must contain
        #[arg(long)]
        containing: Option<String>,
        #[arg(long)]
        min_count: Option<i64>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Scores and contexts of one collocation
    Stats { cluster: ClusterId, ngram: String },
    /// Add a provenance tag (e.g. dbpedia, dblp)
    Tag {
        cluster: ClusterId,
        ngram: String,
        source: String,
    },
    /// Record a relevance judgement
    Judge {
        cluster: ClusterId,
        ngram: String,
        #[arg(value_enum)]
        relevance: Judgement,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Judgement {
    Relevant,
    Irrelevant,
    Unknown,
}

impl From<Judgement> for Relevance {
    fn from(judgement: Judgement) -> Self {
        match judgement {
            Judgement::Relevant => Relevance::Relevant,
            Judgement::Irrelevant => Relevance::Irrelevant,
            Judgement::Unknown => Relevance::Unknown,
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, db: Option<PathBuf>) -> Result<Config, String> {
    let mut config =
        Config::load_or_default(path).map_err(|e| format!("Failed to load configuration: {}", e))?;
    if let Some(db) = db {
        config.database = db;
    }
    if let Some(parent) = config.database.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    Ok(config)
}

fn open_service(config: &Config) -> Result<CorpusService, String> {
    let store =
        SqliteStore::open(&config.database).map_err(|e| format!("Failed to open database: {}", e))?;
    let client = SparqlClient::new(config.sparql.clone())
        .map_err(|e| format!("Failed to create SPARQL client: {}", e))?;
    let service = CorpusService::from_config(
        config,
        Arc::new(store),
        Arc::new(MemoryIndex::new()),
        Arc::new(client),
    )
    .map_err(|e| e.to_string())?;

    let indexed = service
        .rebuild_text_index()
        .map_err(|e| format!("Failed to index articles: {}", e))?;
    debug!(indexed, "Loaded text index");
    Ok(service)
}

fn cmd_article_add(
    service: &CorpusService,
    path: &Path,
    cluster: ClusterId,
    year: i32,
    title: Option<String>,
    venue: Option<String>,
) -> i32 {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path.display(), e);
            return 1;
        }
    };
    let mut new = collocate::NewArticle::new(text, cluster, year);
    if let Some(title) = title {
        new = new.with_title(title);
    }
    if let Some(venue) = venue {
        new = new.with_venue(venue);
    }
    match service.add_article(new) {
        Ok(added) => {
            print_added(&added);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_article_import(
    service: &CorpusService,
    config: &Config,
    path: &Path,
    cluster: ClusterId,
    year: i32,
    venue: Option<&str>,
) -> i32 {
    let Some(name) = path.file_name() else {
        eprintln!("Error: '{}' is not a file", path.display());
        return 1;
    };
    if let Err(e) = std::fs::create_dir_all(&config.documents_dir) {
        eprintln!("Error: cannot create '{}': {}", config.documents_dir.display(), e);
        return 1;
    }
    let target = config.documents_dir.join(name);
    if target.exists() {
        eprintln!("Error: document '{}' already imported", target.display());
        return 1;
    }
    if let Err(e) = std::fs::copy(path, &target) {
        eprintln!("Error: cannot copy '{}': {}", path.display(), e);
        return 1;
    }
    match service.add_document(&target, cluster, year, venue) {
        Ok(added) => {
            print_added(&added);
            0
        }
        Err(e) => {
            std::fs::remove_file(&target).ok();
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn print_added(added: &collocate::AddedArticle) {
    let report = &added.report;
    println!("Added article {} ({})", added.article.id, added.article);
    println!(
        "  {} collocations, {} backfilled into other articles, {} new to the cluster",
        report.created.len(),
        report.backfilled.len(),
        report.new_ngrams.len()
    );
    if report.needs_reconciliation {
        println!(
            "  Run `collocate reconcile {}` to settle aggregate counts",
            added.article.cluster
        );
    }
}

fn cmd_article_delete(service: &CorpusService, article_id: i64) -> i32 {
    match service.delete_article(article_id) {
        Ok(()) => {
            println!("Deleted article {}", article_id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_article_list(service: &CorpusService, filter: &ArticleFilter) -> i32 {
    let articles = match service.list_articles(filter) {
        Ok(articles) => articles,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if articles.is_empty() {
        println!("No articles.");
        return 0;
    }
    println!("{:>6}  {:<20}  {:>4}  {:<40}", "ID", "CLUSTER", "YEAR", "TITLE");
    println!("{}", "-".repeat(76));
    for article in articles {
        println!(
            "{:>6}  {:<20}  {:>4}  {:<40}",
            article.id, article.cluster, article.year, article.title
        );
    }
    0
}

fn cmd_article_show(service: &CorpusService, article_id: i64) -> i32 {
    let rows = match service.article_collocations(article_id) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    for row in rows {
        let relevance = service
            .relevance(article_id, &row.ngram)
            .map(|r| r.as_i8())
            .unwrap_or(-1);
        println!("{:>6}  {:>3}  {}", row.count, relevance, row.ngram);
    }
    0
}

fn cmd_collocations_list(service: &CorpusService, cluster: ClusterId, filter: &CollocationFilter) -> i32 {
    match service.list_collocations(cluster, filter) {
        Ok(collocations) => {
            for colloc in collocations {
                println!("{:>6}  {:<40}  {}", colloc.count, colloc.ngram, colloc.source);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_collocations_stats(service: &CorpusService, cluster: ClusterId, ngram: &str) -> i32 {
    let stats = match service.collocation_stats(cluster, ngram) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    match service.contexts(cluster, ngram) {
        Ok(contexts) => {
            for context in contexts.iter().take(10) {
                println!("  ... {} ...", context);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_collocations_tag(service: &CorpusService, cluster: ClusterId, ngram: &str, source: &str) -> i32 {
    match service.add_source(cluster, ngram, source) {
        Ok(true) => {
            println!("Tagged '{}' with '{}'", ngram, source);
            0
        }
        Ok(false) => {
            eprintln!("Error: collocation '{}' not found in {}", ngram, cluster);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_collocations_judge(
    service: &CorpusService,
    cluster: ClusterId,
    ngram: &str,
    relevance: Relevance,
) -> i32 {
    match service.set_relevance(cluster, ngram, relevance) {
        Ok(()) => {
            println!("Marked '{}' as {:?}", ngram, relevance);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_reconcile(service: &CorpusService, cluster: ClusterId) -> i32 {
    match service.reconcile_cluster(cluster) {
        Ok(summary) if summary.is_clean() => {
            println!("{}: aggregates already consistent", cluster);
            0
        }
        Ok(summary) => {
            println!(
                "{}: {} updated, {} created, {} zeroed, {} deleted",
                cluster, summary.updated, summary.created, summary.zeroed, summary.deleted
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn cmd_graph(service: &CorpusService, article_id: i64, rebuild: bool) -> i32 {
    if rebuild {
        if let Err(e) = service.invalidate_graph(article_id) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    let graph = match service.article_graph(article_id).await {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!(
        "Article {}: {} nodes, {} edges",
        article_id,
        graph.node_count(),
        graph.edge_count()
    );
    for edge in graph.edges() {
        println!("  {} -[{}]- {}", edge.source, edge.relation, edge.target);
    }
    0
}

async fn cmd_classify(service: &CorpusService, article_id: i64, model: &Path) -> i32 {
    let model = match LinearModel::load(model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: cannot load model '{}': {}", model.display(), e);
            return 1;
        }
    };
    match service.classify_article(article_id, &model).await {
        Ok(labels) => {
            for (ngram, label) in labels {
                println!("{:<12}  {}", label, ngram);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config.as_deref(), cli.db) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let service = match open_service(&config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Article { action } => match action {
            ArticleAction::Add {
                path,
                cluster,
                year,
                title,
                venue,
            } => cmd_article_add(&service, &path, cluster, year, title, venue),
            ArticleAction::Import {
                path,
                cluster,
                year,
                venue,
            } => cmd_article_import(&service, &config, &path, cluster, year, venue.as_deref()),
            ArticleAction::Delete { article_id } => cmd_article_delete(&service, article_id),
            ArticleAction::List {
                cluster,
                until,
                limit,
            } => {
                let filter = ArticleFilter {
                    cluster,
                    max_year: until,
                    limit,
                };
                cmd_article_list(&service, &filter)
            }
            ArticleAction::Show { article_id } => cmd_article_show(&service, article_id),
        },
        Commands::Collocations { action } => match action {
            CollocationAction::List {
                cluster,
                containing,
                min_count,
                limit,
            } => {
                let filter = CollocationFilter {
                    containing,
                    min_count,
                    limit: Some(limit),
                };
                cmd_collocations_list(&service, cluster, &filter)
            }
            CollocationAction::Stats { cluster, ngram } => {
                cmd_collocations_stats(&service, cluster, &ngram)
            }
            CollocationAction::Tag {
                cluster,
                ngram,
                source,
            } => cmd_collocations_tag(&service, cluster, &ngram, &source),
            CollocationAction::Judge {
                cluster,
                ngram,
                relevance,
            } => cmd_collocations_judge(&service, cluster, &ngram, relevance.into()),
        },
        Commands::Reconcile { cluster } => cmd_reconcile(&service, cluster),
        Commands::Graph {
            article_id,
            rebuild,
        } => cmd_graph(&service, article_id, rebuild).await,
        Commands::Classify { article_id, model } => match model.or_else(|| config.model.clone()) {
            Some(model) => cmd_classify(&service, article_id, &model).await,
            None => {
                eprintln!("Error: no model given and none configured");
                1
            }
        },
    };
    std::process::exit(code);
}
