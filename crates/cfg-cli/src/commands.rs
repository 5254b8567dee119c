//! Subcommand implementations

use anyhow::{Context, bail};
use cfg_diff::{CompareOptions, ReportFormat};
use cfg_inherit::{InheritanceGraph, Resolver};
use cfg_patch::{PatchFragment, PatchSession, SessionConfig, validate_layout};
use cfg_text::{BlockSource, Document, Scope, extract_value, find_section, has_property};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct OverrideArgs {
    pub config: PathBuf,
    pub base: String,
    pub file: Option<String>,
    pub section: Option<String>,
    pub assignments: Vec<(String, String)>,
    pub require_existing: bool,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

fn section_path(section: Option<&str>) -> Vec<String> {
    section
        .map(|s| {
            s.split('/')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn load_document(file: &Path) -> anyhow::Result<Document> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    Ok(Document::from_text(&file.to_string_lossy(), text)?)
}

pub fn inheritors(
    base: &str,
    source_root: &Path,
    files: &[PathBuf],
    scope: Scope,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = PatchSession::new(source_root, source_root).with_scope(scope);
    if session.load(files)? == 0 {
        bail!("none of the given files could be loaded");
    }

    let names = session.inheritors(base);
    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in &names {
            println!("{name}");
        }
    }
    Ok(())
}

pub fn show(
    file: &Path,
    name: &str,
    section: Option<&str>,
    field: Option<&str>,
    inherited: bool,
) -> anyhow::Result<()> {
    let document = load_document(file)?;
    let path = section_path(section);

    let owner = if inherited {
        let graph = InheritanceGraph::from_document(&document, Scope::TopLevel);
        let resolver = Resolver::new(&graph);
        resolver.find_in_chain(&document, name, |block| {
            find_section(block, &path)
                .is_some_and(|scoped| field.is_none_or(|f| has_property(scoped, f)))
        })
    } else {
        Some(name.to_string())
    };

    let Some(owner) = owner else {
        bail!("no struct in the chain of {name} declares the requested entry");
    };
    let block = document
        .block(&owner)
        .with_context(|| format!("struct {owner} not found in {}", file.display()))?;
    let scoped = find_section(block, &path)
        .with_context(|| format!("section {} not found in {owner}", path.join("/")))?;

    match field {
        Some(field) => {
            let value = extract_value(scoped, field)
                .with_context(|| format!("field {field} not found in {owner}"))?;
            if owner == name {
                println!("{field} = {value}");
            } else {
                println!("{field} = {value} (from {owner})");
            }
        }
        None => print!("{}", ensure_newline(scoped)),
    }
    Ok(())
}

fn ensure_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}

pub fn override_values(args: &OverrideArgs) -> anyhow::Result<()> {
    let mut config = SessionConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(output) = &args.output {
        config = config.output_root(output);
    }

    let mut session = PatchSession::from_config(&config)?;
    let path = section_path(args.section.as_deref());
    let mut skipped = 0;

    for name in session.inheritors(&args.base) {
        let Some(location) = session.location(&name).cloned() else {
            debug!("{} is referenced but never declared, skipping", name);
            continue;
        };
        if args.file.as_ref().is_some_and(|f| *f != location.file_name) {
            continue;
        }
        if args.require_existing {
            let resolver = session.resolver();
            let defined = args
                .assignments
                .iter()
                .all(|(key, _)| resolver.value_in_chain(&session, &name, &path, key).is_some());
            if !defined {
                debug!("{} does not define every key, skipping", name);
                skipped += 1;
                continue;
            }
        }

        let pairs = args.assignments.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        let builder = PatchFragment::builder(name.as_str());
        let builder = if path.is_empty() {
            builder.properties(pairs)
        } else {
            builder
                .path(path.iter().map(String::as_str))
                .nested_properties(pairs)
        };
        session.add_patch(&location.file_name, builder.build())?;
    }

    if session.pending_count() == 0 {
        bail!("no structs matched base {}", args.base);
    }

    if args.dry_run {
        let mut files: Vec<&str> = session.documents().map(Document::file_name).collect();
        files.sort_unstable();
        for file in files {
            for fragment in session.pending(file) {
                println!("{fragment}");
            }
        }
        return Ok(());
    }

    let summary = session.save_all(&config.mod_name)?;
    info!("Skipped {} structs without the requested keys", skipped);
    println!(
        "Wrote {} patches to {} files ({} skipped)",
        summary.fragments,
        summary.files(),
        skipped
    );
    for path in &summary.written {
        println!("  {}", path.display());
    }
    Ok(())
}

pub fn diff(
    original: &Path,
    patch: &Path,
    options: &CompareOptions,
    format: ReportFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let report = cfg_diff::compare_files(original, patch, options)?;
    let rendered = cfg_diff::render(&report, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Report written to {} ({} changed structs)",
                path.display(),
                report.summary.structs_changed
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

pub fn validate(mod_dir: &Path, source: &Path) -> anyhow::Result<()> {
    let report = validate_layout(mod_dir, source)?;
    for issue in &report.issues {
        println!("{issue}");
    }
    println!(
        "Checked {} files ({} outside GameData), {} issues",
        report.files_checked,
        report.skipped,
        report.issues.len()
    );
    if !report.is_clean() {
        bail!("{} layout issues found", report.issues.len());
    }
    Ok(())
}
