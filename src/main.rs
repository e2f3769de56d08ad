// Entrypoint for the CLI application.
// - Parses arguments, resolves configuration and builds the service clients.
// - Each command reports its own failure and the process exits non-zero.

use clap::{Args, Parser, Subcommand, ValueEnum};
use icdn::config::Config;
use icdn::data::DataService;
use icdn::search::{SearchSpec, SortKey, SortOrder};
use icdn::static_host::StaticHost;
use icdn::ui::{self, Catalogue, UploadArgs};
use icdn::{time, Icdn, Profile};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "icdn")]
#[command(about = "A CLI for DmmD's iCDN and static file host")]
struct Cli {
    /// iCDN base URL (overrides ICDN_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Static host base URL (overrides STATIC_URL)
    #[arg(long, global = true)]
    static_url: Option<String>,

    /// Server protocol profile: status or envelope (overrides ICDN_PROFILE)
    #[arg(long, global = true)]
    profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Time,
    Uuid,
    Size,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Time => SortKey::Time,
            SortArg::Uuid => SortKey::Uuid,
            SortArg::Size => SortKey::Size,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Asc,
    Dsc,
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogueArg {
    Tags,
    Anime,
    Games,
}

#[derive(Args)]
struct SearchArgs {
    /// Only content with a time after this millisecond timestamp
    #[arg(long)]
    begin: Option<i64>,
    /// Only content with a time before this millisecond timestamp
    #[arg(long)]
    end: Option<i64>,
    /// Minimum size in bytes
    #[arg(long)]
    minimum: Option<u64>,
    /// Maximum size in bytes
    #[arg(long)]
    maximum: Option<u64>,
    /// Results per page
    #[arg(long)]
    count: Option<u32>,
    /// Require only one filter to match instead of all
    #[arg(long)]
    loose: bool,
    #[arg(long, value_enum, default_value = "dsc")]
    order: OrderArg,
    /// Zero-based page offset
    #[arg(long)]
    page: Option<u32>,
    #[arg(long, value_enum, default_value = "time")]
    sort: SortArg,
    /// Required tags, separated by commas
    #[arg(long)]
    tags: Option<String>,
    #[arg(long)]
    uuid: Option<String>,
    #[arg(long)]
    mime: Option<String>,
    /// Extension without the dot
    #[arg(long)]
    extension: Option<String>,
    /// Show full records instead of uuids
    #[arg(long)]
    query: bool,
    name: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a record's content
    Download {
        uuid: String,
        /// Output path; defaults to the record name
        file: Option<PathBuf>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Show one record
    Query { uuid: String },
    /// Search records
    Search(SearchArgs),
    /// List records page by page
    List {
        #[arg(long, default_value_t = 25)]
        count: u32,
        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Show full records instead of uuids
        #[arg(long)]
        query: bool,
        /// Save the listed uuids to a file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Upload a new record
    Add {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        token: Option<String>,
        /// Millisecond timestamp to use instead of the current time
        #[arg(long)]
        time: Option<i64>,
        name: Vec<String>,
    },
    /// Update an existing record
    Update {
        #[arg(long)]
        uuid: String,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        time: Option<i64>,
        name: Vec<String>,
    },
    /// Remove a record
    Remove {
        uuid: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Show store usage and limits
    Details,
    /// List a static host directory
    Dir {
        #[arg(default_value = "")]
        path: String,
    },
    /// Fetch a file from the static host
    Fetch { path: String, out: Option<PathBuf> },
    /// Print a data catalogue
    Data {
        #[arg(value_enum)]
        which: CatalogueArg,
    },
    /// Save, show or clear the default upload token
    Token {
        value: Option<String>,
        #[arg(long)]
        clear: bool,
    },
}

fn build_spec(args: &SearchArgs) -> anyhow::Result<SearchSpec> {
    let SearchArgs {
        begin, end, minimum, maximum, count, loose, order, page, sort, tags, uuid, mime, extension, name, ..
    } = args;

    let mut builder = SearchSpec::builder()
        .loose(*loose)
        .sort((*sort).into())
        .order(match order {
            OrderArg::Asc => SortOrder::Ascending,
            OrderArg::Dsc => SortOrder::Descending,
        });
    if !name.is_empty() {
        builder = builder.name(name.join(" "));
    }
    if let Some(begin) = begin {
        builder = builder.begin(time::from_millis(*begin)?);
    }
    if let Some(end) = end {
        builder = builder.end(time::from_millis(*end)?);
    }
    if let Some(minimum) = minimum {
        builder = builder.minimum(*minimum);
    }
    if let Some(maximum) = maximum {
        builder = builder.maximum(*maximum);
    }
    if let Some(count) = count {
        builder = builder.count(*count);
    }
    if let Some(page) = page {
        builder = builder.page(*page);
    }
    if let Some(tags) = tags {
        builder = builder.tags(tags.split(',').map(str::trim).filter(|tag| !tag.is_empty()));
    }
    if let Some(uuid) = uuid {
        builder = builder.uuid(uuid.clone());
    }
    if let Some(mime) = mime {
        builder = builder.mime(mime.clone());
    }
    if let Some(extension) = extension {
        builder = builder.extension(extension.clone());
    }
    Ok(builder.build())
}

async fn run(command: Commands, config: Config) -> (&'static str, anyhow::Result<()>) {
    let cdn = Icdn::new(&config.icdn_url, config.profile);
    let result = match command {
        Commands::Download { uuid, file, token } => ("download", ui::download(&cdn, &uuid, file, token).await),
        Commands::Query { uuid } => ("perform query", ui::query(&cdn, &uuid).await),
        Commands::Search(args) => match build_spec(&args) {
            Ok(spec) => ("search", ui::search(&cdn, &spec, args.query).await),
            Err(err) => ("search", Err(err)),
        },
        Commands::List { count, page, query, save } => ("list", ui::list(&cdn, count, page, query, save).await),
        Commands::Add { file, token, time, name } => (
            "upload",
            ui::upload(&cdn, UploadArgs { file: Some(file), uuid: None, token, time, name }).await,
        ),
        Commands::Update { uuid, file, token, time, name } => (
            "upload",
            ui::upload(&cdn, UploadArgs { file, uuid: Some(uuid), token, time, name }).await,
        ),
        Commands::Remove { uuid, token } => ("remove", ui::remove(&cdn, &uuid, token).await),
        Commands::Details => ("fetch details", ui::details(&cdn).await),
        Commands::Dir { path } => {
            let host = StaticHost::new(&config.static_url, config.profile);
            let result = ui::directory(&host, &path).await;
            host.close();
            ("list directory", result)
        }
        Commands::Fetch { path, out } => {
            let host = StaticHost::new(&config.static_url, config.profile);
            let result = ui::fetch(&host, &path, out).await;
            host.close();
            ("fetch file", result)
        }
        Commands::Data { which } => {
            let data = DataService::new(&config.data_url, config.profile);
            let which = match which {
                CatalogueArg::Tags => Catalogue::Tags,
                CatalogueArg::Anime => Catalogue::Anime,
                CatalogueArg::Games => Catalogue::Games,
            };
            let result = ui::catalogue(&data, which).await;
            data.close();
            ("load catalogue", result)
        }
        Commands::Token { value, clear } => ("update token", ui::token(value, clear)),
    };
    cdn.close();
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.url {
        config.icdn_url = url;
    }
    if let Some(url) = cli.static_url {
        config.static_url = url;
    }
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }

    let (action, result) = run(cli.command, config).await;
    if let Err(err) = result {
        ui::report_failure(action, &err);
        std::process::exit(1);
    }
    Ok(())
}
