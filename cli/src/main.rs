use anyhow::{bail, Context, Result};
use clap::Parser;
use pdfsearch_core::persist::{load_index, load_meta, save_index, save_meta, IndexPaths, MetaFile};
use pdfsearch_core::{build, collect_documents, IndexConfig, IndexError, InvertedIndex, PageExtractor, PdfToText};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

mod session;

#[derive(Parser)]
#[command(name = "pdfsearch")]
#[command(about = "Search a folder of PDF files with a TF-IDF index", long_about = None)]
struct Cli {
    /// Folder containing the PDF files
    folder: PathBuf,
    /// Re-extract every PDF and rebuild the stored index
    #[arg(long, default_value_t = false)]
    update: bool,
    /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df) when building
    #[arg(long, default_value_t = false)]
    smoothed_idf: bool,
    /// Show at most this many documents per query
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    top_k: Option<u64>,
    /// Index directory (defaults to <FOLDER>/.pdfsearch)
    #[arg(long)]
    index_dir: Option<PathBuf>,
    /// Answer this query and exit instead of prompting; may be repeated
    #[arg(long = "query", short = 'q')]
    queries: Vec<String>,
    /// pdftotext binary used for extraction
    #[arg(long, default_value = "pdftotext")]
    pdftotext: PathBuf,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    if !cli.folder.is_dir() {
        bail!("{} is not a directory", cli.folder.display());
    }
    let paths = match &cli.index_dir {
        Some(dir) => IndexPaths::new(dir),
        None => IndexPaths::for_folder(&cli.folder),
    };

    let index = if cli.update {
        let config = if cli.smoothed_idf { IndexConfig::smoothed() } else { IndexConfig::default() };
        let extractor = PdfToText::with_binary(&cli.pdftotext);
        rebuild_index(&cli.folder, &paths, &extractor, config, &mut io::stdout())?
    } else {
        if cli.smoothed_idf {
            tracing::warn!("--smoothed-idf only applies together with --update; using the stored index settings");
        }
        open_index(&paths, &mut io::stdout())?
    };
    let top_k = cli.top_k.map(|k| k as usize);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.queries.is_empty() {
        let stdin = io::stdin();
        session::run_interactive(&index, stdin.lock(), &mut out, top_k)?;
    } else {
        for q in &cli.queries {
            writeln!(out, "Query: {q}")?;
            session::answer(&index, q, &mut out, top_k)?;
        }
    }
    Ok(())
}

/// Load the stored index and say when it was built.
fn open_index<W: Write>(paths: &IndexPaths, out: &mut W) -> Result<InvertedIndex> {
    let index = match load_index(paths) {
        Ok(index) => index,
        Err(e @ IndexError::MissingIndex { .. }) => {
            bail!("{e}\nhint: pdfsearch <FOLDER> --update builds the index")
        }
        Err(e) => return Err(anyhow::Error::new(e).context("failed to load the stored index")),
    };
    // meta.json is informational; the index itself is already verified.
    match load_meta(paths) {
        Ok(meta) => writeln!(out, "Loaded index of {} document(s) built {}.", index.num_docs(), meta.created_at)?,
        Err(e) => {
            tracing::warn!(error = %e, "cannot read index summary");
            writeln!(out, "Loaded index of {} document(s).", index.num_docs())?;
        }
    }
    Ok(index)
}

/// Extract every PDF under `folder`, build a fresh index, and overwrite the stored one.
fn rebuild_index<W: Write>(
    folder: &Path,
    paths: &IndexPaths,
    extractor: &dyn PageExtractor,
    config: IndexConfig,
    out: &mut W,
) -> Result<InvertedIndex> {
    writeln!(out, "Extracting text from PDFs in {}...", folder.display())?;
    let report = collect_documents(folder, extractor);
    let index = build(&report.documents, config);

    save_index(paths, &index).with_context(|| format!("failed to write index to {}", paths.root.display()))?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    save_meta(paths, &MetaFile::for_index(&index, created_at))?;

    writeln!(out, "Indexed {} document(s), {} distinct terms.", index.num_docs(), index.num_terms())?;
    for skipped in &report.skipped {
        writeln!(out, "  skipped {}: {}", skipped.name, skipped.reason)?;
    }
    tracing::info!(num_docs = index.num_docs(), skipped = report.skipped.len(), root = %paths.root.display(), "index build complete");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfsearch_core::{search, PageText};
    use std::fs;
    use tempfile::tempdir;

    struct TextFiles;

    impl PageExtractor for TextFiles {
        fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IndexError> {
            let text = fs::read_to_string(path)?;
            Ok(pdfsearch_core::extract::split_pages(&text))
        }
    }

    #[test]
    fn top_k_must_be_positive() {
        assert!(Cli::try_parse_from(["pdfsearch", "docs", "--top-k", "0"]).is_err());
        let cli = Cli::try_parse_from(["pdfsearch", "docs", "--top-k", "3"]).unwrap();
        assert_eq!(cli.top_k, Some(3));
    }

    #[test]
    fn missing_meta_still_loads() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::for_folder(dir.path());
        save_index(&paths, &build(&[], IndexConfig::default())).unwrap();

        let mut out = Vec::new();
        let loaded = open_index(&paths, &mut out).unwrap();
        assert_eq!(loaded.num_docs(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "Loaded index of 0 document(s).\n");
    }

    #[test]
    fn missing_index_tells_user_to_update() {
        let dir = tempdir().unwrap();
        let err = open_index(&IndexPaths::for_folder(dir.path()), &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().contains("--update"), "{err}");
    }

    #[test]
    fn rebuild_persists_and_reloads() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), "cat dog\u{c}dog bird").unwrap();
        fs::write(dir.path().join("b.pdf"), "bird fish").unwrap();
        let paths = IndexPaths::for_folder(dir.path());

        let mut out = Vec::new();
        let built = rebuild_index(dir.path(), &paths, &TextFiles, IndexConfig::default(), &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Indexed 2 document(s)"), "{printed}");
        assert!(paths.meta().is_file());

        let mut out = Vec::new();
        let loaded = open_index(&paths, &mut out).unwrap();
        assert_eq!(search(&loaded, "dog"), search(&built, "dog"));
        let created_at = load_meta(&paths).unwrap().created_at;
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains(&format!("Loaded index of 2 document(s) built {created_at}.")), "{printed}");
    }

    #[test]
    fn rebuild_replaces_old_documents() {
        let dir = tempdir().unwrap();
        let paths = IndexPaths::for_folder(dir.path());
        fs::write(dir.path().join("old.pdf"), "legacy report").unwrap();
        rebuild_index(dir.path(), &paths, &TextFiles, IndexConfig::default(), &mut Vec::<u8>::new()).unwrap();

        fs::remove_file(dir.path().join("old.pdf")).unwrap();
        fs::write(dir.path().join("new.pdf"), "fresh report").unwrap();
        rebuild_index(dir.path(), &paths, &TextFiles, IndexConfig::default(), &mut Vec::<u8>::new()).unwrap();

        let loaded = open_index(&paths, &mut Vec::<u8>::new()).unwrap();
        let names: Vec<&str> = loaded.docs().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["new.pdf"]);
    }
}
