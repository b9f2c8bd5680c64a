use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;

use crate::config::load_config;
use crate::ledger::{self, Ledger};

/// CLI command: print every ledger entry, newest first, with aligned columns.
///
/// Example output:
/// ```text
/// /go           https://example.com
/// /abc          https://a.com
/// ```
///
/// # Errors
/// - Returns an error if the config cannot be loaded or `app.path` is unset.
/// - Returns an error if the ledger is missing or malformed.
pub fn cmd_list(config: Option<&Path>) -> Result<()> {
    let cfg = load_config(config)?;
    let ledger = ledger::load(&cfg.ledger_path()?)?;
    write_ledger(&mut io::stdout().lock(), &ledger)
}

fn write_ledger<W: Write>(out: &mut W, ledger: &Ledger) -> Result<()> {
    if ledger.is_empty() {
        writeln!(out, "(no redirects)")?;
        return Ok(());
    }
    out.write_all(ledger.render().as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_aligned_entries() {
        let l = Ledger::parse("/a https://a.com\n/long https://l.com\n").unwrap();
        let mut buf = Vec::new();
        write_ledger(&mut buf, &l).unwrap();
        let s = String::from_utf8(buf).unwrap();
        let cols: Vec<usize> = s.lines().map(|l| l.find("https").unwrap()).collect();
        assert_eq!(cols, vec![15, 15]);
    }

    #[test]
    fn empty_ledger_says_so() {
        let mut buf = Vec::new();
        write_ledger(&mut buf, &Ledger::default()).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "(no redirects)\n");
    }
}
