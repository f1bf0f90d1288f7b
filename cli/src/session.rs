use pdfsearch_core::{search, InvertedIndex, SearchHit};
use std::io::{self, BufRead, Write};

/// Prompt for queries until an empty line or end of input.
pub fn run_interactive<R: BufRead, W: Write>(
    index: &InvertedIndex,
    mut input: R,
    out: &mut W,
    top_k: Option<usize>,
) -> io::Result<()> {
    writeln!(out, "Ready to search {} document(s). Enter your query (or press Enter to exit):", index.num_docs())?;
    let mut line = String::new();
    loop {
        write!(out, "Query: ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }
        answer(index, query, out, top_k)?;
    }
    writeln!(out, "Exiting the program. Thank you for using the PDF search tool!")?;
    Ok(())
}

pub fn answer<W: Write>(index: &InvertedIndex, query: &str, out: &mut W, top_k: Option<usize>) -> io::Result<()> {
    let mut hits = search(index, query);
    tracing::debug!(query, total_hits = hits.len(), "search");
    if let Some(k) = top_k {
        hits.truncate(k);
    }
    render_hits(&hits, out)
}

pub fn render_hits<W: Write>(hits: &[SearchHit], out: &mut W) -> io::Result<()> {
    if hits.is_empty() {
        writeln!(out, "No results found for the given query.")?;
    } else {
        writeln!(out, "\nSearch results:")?;
        for hit in hits {
            writeln!(out, "Document: {} - Score: {:.4}", hit.document, hit.score)?;
            let pages: Vec<String> = hit.pages.iter().map(|p| p.to_string()).collect();
            writeln!(out, "  Found on page(s): {}", pages.join(", "))?;
        }
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfsearch_core::{build, IndexConfig, SourceDocument};
    use std::io::Cursor;

    fn index() -> InvertedIndex {
        build(
            &[
                SourceDocument::from_pages("DocA", &["cat dog", "dog bird"]),
                SourceDocument::from_pages("DocB", &["bird fish"]),
            ],
            IndexConfig::default(),
        )
    }

    fn run(input: &str, top_k: Option<usize>) -> String {
        let mut out = Vec::new();
        run_interactive(&index(), Cursor::new(input), &mut out, top_k).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn answers_until_blank_line() {
        let out = run("dog\n\nfish\n", None);
        assert!(out.contains("Document: DocA - Score: "));
        assert!(out.contains("  Found on page(s): 1, 2"));
        assert!(!out.contains("DocB"));
        assert!(out.ends_with("Thank you for using the PDF search tool!\n"));
    }

    #[test]
    fn stops_at_end_of_input() {
        let out = run("fish", None);
        assert!(out.contains("Document: DocB"));
        assert!(out.contains("Exiting the program"));
    }

    #[test]
    fn reports_no_results() {
        let out = run("zebra\n", None);
        assert!(out.contains("No results found for the given query."));
    }

    #[test]
    fn top_k_limits_output() {
        let out = run("dog fish\n", Some(1));
        assert_eq!(out.matches("Document: ").count(), 1);
    }
}
