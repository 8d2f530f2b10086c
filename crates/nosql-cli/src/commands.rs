//! Subcommand execution
//!
//! Every command is synchronous underneath: schema builds and page fetches
//! call into the store directly. `run` moves the work onto tokio's blocking
//! pool and hands back the text to print.

use crate::render;
use crate::{Command, ModelSource, ProfileAction};
use anyhow::{Context, Result, bail};
use nosql_core::{MetadataSource, ProfileKind, ProfileRegistry, PropertyMap};
use nosql_memory::MemoryStore;
use nosql_results::{RowStream, TablePageCache, TableSnapshot, split_first};
use nosql_schema::{BuildInput, Datamodel, DdlGenerator, SchemaBuilder, TableId};
use nosql_settings::Settings;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Run `command` on the blocking pool
pub async fn run(command: Command, settings: Settings, settings_path: PathBuf) -> Result<String> {
    blocking(move || execute(command, settings, &settings_path)).await
}

/// Run `work` where it may block without stalling the runtime
pub async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("command task did not complete")?
}

fn execute(command: Command, settings: Settings, settings_path: &Path) -> Result<String> {
    match command {
        Command::Describe { source, table } => describe(&source, table.as_deref(), &settings),
        Command::Ddl { source, table } => ddl(&source, table.as_deref()),
        Command::Browse {
            fixture,
            table,
            page_size,
            pages,
            all,
            collection,
        } => {
            let options = BrowseOptions {
                page_size: page_size.unwrap_or(settings.results.page_size),
                pages: if all { usize::MAX } else { pages },
                collection_mode: collection || settings.results.collection_mode,
                max_cell_width: settings.results.max_cell_width,
            };
            browse(&fixture, &table, &options)
        }
        Command::Profile { action } => profile(action, settings, settings_path),
    }
}

/// Resolve a fixture path, falling back to the fixtures directory for bare
/// file names
fn fixture_path(path: &Path) -> PathBuf {
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }
    match nosql_settings::fixtures_dir() {
        Ok(dir) if dir.join(path).exists() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

fn open_fixture(path: &Path) -> Result<Arc<MemoryStore>> {
    let path = fixture_path(path);
    let store = MemoryStore::load(&path)
        .with_context(|| format!("Failed to load store fixture {:?}", path))?;
    Ok(Arc::new(store))
}

fn model_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "model".to_string())
}

/// Build the model for `source`
///
/// A fixture is opened as a live store; with `refresh` set every table is
/// loaded up front, otherwise tables load on first access.
fn load_model(source: &ModelSource, refresh: bool) -> Result<Datamodel> {
    match (&source.fixture, &source.description) {
        (Some(path), _) => {
            let store: Arc<dyn MetadataSource> = open_fixture(path)?;
            let mut model = SchemaBuilder::build(&model_name(path), BuildInput::Live(store))?;
            if refresh {
                SchemaBuilder::recursive_refresh_model(&mut model)?;
            }
            Ok(model)
        }
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read description from {:?}", path))?;
            Ok(SchemaBuilder::build(&model_name(path), BuildInput::Json(&text))?)
        }
        (None, None) => bail!("either --fixture or --description is required"),
    }
}

/// Find `name` in any schema of `model`, loading it if needed
fn find_table(model: &mut Datamodel, name: &str) -> Result<TableId> {
    for schema in model.schema_ids() {
        let known = model.get_schema(schema).is_some_and(|s| s.is_known(name));
        if known {
            return Ok(model.load_table(schema, name)?);
        }
    }
    bail!("no table named '{name}'")
}

fn describe(source: &ModelSource, table: Option<&str>, settings: &Settings) -> Result<String> {
    let refresh = table.is_none() && settings.schema.refresh_on_open;
    let mut model = load_model(source, refresh)?;
    let only = table.map(|name| find_table(&mut model, name)).transpose()?;
    render::schema_tree(&model, only)
}

fn ddl(source: &ModelSource, table: Option<&str>) -> Result<String> {
    let mut model = load_model(source, table.is_none())?;
    let tables = match table {
        Some(name) => vec![find_table(&mut model, name)?],
        None => model
            .schema_ids()
            .into_iter()
            .filter_map(|s| model.get_schema(s))
            .flat_map(|s| s.table_ids())
            .collect(),
    };

    let mut out = String::new();
    for table in tables {
        writeln!(out, "{};", DdlGenerator::create_table(&model, table)?)?;
        let index_ids = model
            .get_table(table)
            .map(|t| t.index_ids())
            .unwrap_or_default();
        for index in index_ids {
            writeln!(out, "{};", DdlGenerator::create_index(&model, index)?)?;
        }
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct BrowseOptions {
    pub page_size: usize,
    /// Pages to print, from the first
    pub pages: usize,
    pub collection_mode: bool,
    pub max_cell_width: usize,
}

fn browse(fixture: &Path, table: &str, options: &BrowseOptions) -> Result<String> {
    let store = open_fixture(fixture)?;
    let source: Arc<dyn MetadataSource> = store.clone();
    let mut model = SchemaBuilder::build(&model_name(fixture), BuildInput::Live(source))?;
    let table_id = find_table(&mut model, table)?;
    let snapshot = TableSnapshot::of(&model, table_id)?;

    let mut cache = TablePageCache::new(options.page_size)?;
    let query = format!("SELECT * FROM {}", snapshot.name);
    let rows = RowStream::submit(store.as_ref(), &query)?.into_boxed();
    let Some(rows) = split_first(rows)? else {
        return Ok(format!("table '{}' has no rows\n", snapshot.name));
    };
    cache.set_result(rows, snapshot);

    let mut out = String::new();
    while cache.current_page_number() < options.pages && cache.next_page(options.collection_mode)? {
        let page = cache.current_page()?;
        writeln!(out, "page {} ({} rows)", page.number(), page.len())?;
        writeln!(out, "{}", render::page_table(page, options.max_cell_width))?;
    }
    if cache.has_next_page() {
        writeln!(out, "more rows follow; use --pages or --all to see them")?;
    }
    Ok(out)
}

fn profile(action: ProfileAction, mut settings: Settings, settings_path: &Path) -> Result<String> {
    match action {
        ProfileAction::Check {
            kind,
            properties,
            save,
            overwrite,
        } => {
            let registry = ProfileRegistry::with_defaults();
            let properties: PropertyMap = properties.into_iter().collect();
            let profile = registry.create(kind, &properties)?;

            let mut out = format!(
                "valid {} profile for {}\n{}\n",
                kind.label(),
                profile.endpoint(),
                serde_json::to_string_pretty(&profile)?
            );
            if let Some(name) = save {
                settings.add_profile(&name, profile, overwrite)?;
                settings.save_to(settings_path)?;
                writeln!(out, "saved as '{name}'")?;
            }
            Ok(out)
        }
        ProfileAction::List => {
            if settings.profiles.is_empty() {
                return Ok("no saved profiles\n".to_string());
            }
            let mut grid = comfy_table::Table::new();
            grid.load_preset(comfy_table::presets::UTF8_FULL);
            grid.set_header(vec!["Name", "Kind", "Endpoint"]);
            for saved in &settings.profiles {
                let kind: ProfileKind = saved.profile.kind();
                grid.add_row(vec![
                    saved.name.clone(),
                    kind.label().to_string(),
                    saved.profile.endpoint(),
                ]);
            }
            Ok(format!("{grid}\n"))
        }
        ProfileAction::Remove { name } => {
            if settings.remove_profile(&name).is_none() {
                bail!("no saved profile named '{name}'");
            }
            settings.save_to(settings_path)?;
            Ok(format!("removed '{name}'\n"))
        }
    }
}
