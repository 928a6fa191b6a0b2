//! `kbank` - CLI for knowledgebank
//!
//! This binary searches and browses a resource catalog, uploads resources to
//! a backend, and runs the backend server.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write as _;

use clap::Parser;

use knowledgebank::cli::{
    BrowseCommand, Cli, Command, ConfigCommand, ExportCommand, ImportCommand, OutputFormat,
    SearchCommand, ServeCommand, UploadCommand,
};
use knowledgebank::config::UiConfig;
use knowledgebank::filter::{distinct_tags, filter_by_tag};
use knowledgebank::page::{HomePage, Markup, ResourcesPage, UploadPage};
use knowledgebank::resource::{parse_collection, Link};
use knowledgebank::source::{self, ApiSource, UploadFile};
use knowledgebank::{init_logging, server, Config, DataSource as _, Error, Resource, Store};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Read configuration, apply the per-run source flags, then validate once
    let mut config = Config::read_from(cli.config.clone())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    // Execute the command
    match cli.command {
        Command::Serve(cmd) => handle_serve(config, cmd).await,
        Command::Search(cmd) => handle_search(&config, &cmd).await,
        Command::Browse(cmd) => handle_browse(&config, &cmd).await,
        Command::Upload(cmd) => handle_upload(&config, cmd).await,
        Command::Import(cmd) => handle_import(&config, &cmd),
        Command::Export(cmd) => handle_export(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> CliResult {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;
    server::serve(&config).await?;
    Ok(())
}

async fn handle_search(config: &Config, cmd: &SearchCommand) -> CliResult {
    let source = source::from_config(config)?;

    if cmd.format == OutputFormat::Html {
        let page = HomePage::mount(&Markup::home(), source, &config.ui)
            .ok_or_else(|| Error::internal("home page markup incomplete"))?;
        page.submit_query(&cmd.query);
        page.choose_type(&cmd.resource_type).await;
        println!("{}", page.results().to_html());
        return Ok(());
    }

    let query = cmd.query.trim();
    if query.is_empty() {
        println!("{}", config.ui.search_prompt);
        return Ok(());
    }
    let items = source.search(query, &cmd.resource_type).await?;
    print_resources(&items, cmd.format, &config.ui)
}

async fn handle_browse(config: &Config, cmd: &BrowseCommand) -> CliResult {
    let source = source::from_config(config)?;
    let tag = cmd.tag.as_deref().unwrap_or_default();

    if cmd.format == OutputFormat::Html {
        let page = ResourcesPage::mount(&Markup::resources(), source, &config.ui)
            .ok_or_else(|| Error::internal("resources page markup incomplete"))?;
        page.load().await;
        page.select_tag(tag);
        println!("{}", page.to_html());
        return Ok(());
    }

    let all = source.fetch_all().await?;
    if cmd.format == OutputFormat::Plain {
        let tags = distinct_tags(&all);
        if !tags.is_empty() {
            println!("Tags: {}", tags.join(", "));
            println!();
        }
    }
    print_resources(&filter_by_tag(&all, tag), cmd.format, &config.ui)
}

async fn handle_upload(config: &Config, cmd: UploadCommand) -> CliResult {
    let client = source::http_client(config)?;
    let api = ApiSource::new(client, &config.source.api_base_url);
    let mut page = UploadPage::mount(&Markup::upload(), api, &config.ui)
        .ok_or_else(|| Error::internal("upload page markup incomplete"))?;

    let file = match cmd.file {
        Some(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| Error::FileRead {
                    path: path.clone(),
                    source,
                })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Some(UploadFile { name, bytes })
        }
        None => None,
    };

    let form = page.form_mut();
    form.title = cmd.title;
    form.description = cmd.description;
    form.resource_type = cmd.resource_type;
    form.tags = cmd.tags;
    form.url = cmd.url;
    form.file = file;

    let uploaded = page.submit().await;
    let message = page.message().messages().join(" ");
    if uploaded {
        println!("{message}");
        Ok(())
    } else {
        Err(message.into())
    }
}

fn handle_import(config: &Config, cmd: &ImportCommand) -> CliResult {
    let document = std::fs::read(&cmd.file).map_err(|source| Error::FileRead {
        path: cmd.file.clone(),
        source,
    })?;
    let resources = parse_collection(&document)?;

    let store = Store::open(config.database_path())?;
    let imported = store.import(&resources)?;
    println!(
        "Imported {imported} resources into {}",
        store.path().display()
    );
    Ok(())
}

fn handle_export(config: &Config, cmd: &ExportCommand) -> CliResult {
    let store = Store::open(config.database_path())?;
    let document = serde_json::to_string_pretty(&store.list()?)?;

    match &cmd.file {
        Some(path) => {
            std::fs::write(path, document)?;
            println!("Exported {} resources to {}", store.count()?, path.display());
            if let Some(at) = store.last_added()? {
                println!("Most recent addition: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{document}")?;
        }
    }
    Ok(())
}

fn print_resources(items: &[Resource], format: OutputFormat, ui: &UiConfig) -> CliResult {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
        OutputFormat::Plain | OutputFormat::Html => {
            if items.is_empty() {
                println!("{}", ui.no_results);
                return Ok(());
            }
            for resource in items {
                print_resource(resource);
            }
        }
    }
    Ok(())
}

fn print_resource(resource: &Resource) {
    if resource.resource_type.is_empty() {
        println!("{}", resource.title);
    } else {
        println!("{} [{}]", resource.title, resource.resource_type);
    }
    if !resource.description.is_empty() {
        println!("  {}", resource.description);
    }
    if !resource.tags.is_empty() {
        println!("  Tags: {}", resource.tags.join(", "));
    }
    match resource.link() {
        Some(Link::External(url)) => println!("  {url}"),
        Some(Link::File(name)) => println!("  file: {name}"),
        None => {}
    }
    println!();
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Source]");
                println!("  Kind:               {}", config.source.kind);
                println!("  Location:           {}", config.source.location);
                println!("  API base URL:       {}", config.source.api_base_url);
                println!("  Timeout (secs):     {}", config.source.timeout_secs);
                println!();
                println!("[Server]");
                println!("  Bind:               {}", config.server.bind);
                println!("  Port:               {}", config.server.port);
                println!("  Database path:      {}", config.database_path().display());
                println!("  Uploads dir:        {}", config.uploads_dir().display());
                println!("  Max upload bytes:   {}", config.server.max_upload_bytes);
                println!();
                println!("[UI]");
                println!("  Types:              {}", config.ui.types.join(", "));
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            if let Err(e) = Config::load_from(Some(path)) {
                eprintln!("Configuration error: {e}");
                return Err(e.into());
            }
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
