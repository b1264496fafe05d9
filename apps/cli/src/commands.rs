//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use study_core::import::{parse_tsv, to_tsv};
use study_core::{codec, Item, StdRandom, StudyList};

use crate::config::CliConfig;
use crate::study::run_session;

/// Presentation flags accepted by `new` and `set`.
#[derive(Debug, Default, Clone)]
pub struct ListOptions {
    pub name: Option<String>,
    pub hint_readings: Option<bool>,
    pub hint_examples: Option<bool>,
    pub reversed: Option<bool>,
}

impl ListOptions {
    fn apply(&self, list: &mut StudyList) {
        if let Some(name) = &self.name {
            list.set_name(name.clone());
        }
        if let Some(value) = self.hint_readings {
            list.set_hint_readings(value);
        }
        if let Some(value) = self.hint_examples {
            list.set_hint_example(value);
        }
        if let Some(value) = self.reversed {
            list.set_show_reversed_cards(value);
        }
    }
}

fn load(path: &Path) -> Result<StudyList> {
    codec::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn save(path: &Path, list: &mut StudyList) -> Result<()> {
    codec::save(path, list).with_context(|| format!("failed to save {}", path.display()))
}

/// Create a new empty list file.
pub fn new_list(path: &Path, name: &str, options: &ListOptions, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let mut list = StudyList::new(name);
    options.apply(&mut list);
    save(path, &mut list)
}

/// Append one item.
pub fn add_item(path: &Path, item: Item) -> Result<usize> {
    let mut list = load(path)?;
    let index = list.push_item(item)?;
    save(path, &mut list)?;
    Ok(index)
}

/// Append items from a tab-separated file.
pub fn import_items(path: &Path, tsv: &Path) -> Result<usize> {
    let content =
        fs::read_to_string(tsv).with_context(|| format!("failed to read {}", tsv.display()))?;
    let items = parse_tsv(&content).with_context(|| format!("failed to import {}", tsv.display()))?;

    let mut list = load(path)?;
    let count = list.extend_items(items)?;
    save(path, &mut list)?;
    tracing::info!(count, "imported items");
    Ok(count)
}

/// Write the items as tab-separated lines.
pub fn export_items<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let list = load(path)?;
    let items: Vec<Item> = list.items().iter().map(Item::detached).collect();
    writeln!(out, "{}", to_tsv(&items))?;
    Ok(())
}

#[derive(Serialize)]
struct ListView<'a> {
    name: &'a str,
    hint_readings: bool,
    hint_examples: bool,
    show_reversed: bool,
    correct_rate: f64,
    items: &'a [Item],
}

/// Print list metadata and items.
pub fn show<W: Write>(path: &Path, json: bool, out: &mut W) -> Result<()> {
    let list = load(path)?;
    if json {
        let view = ListView {
            name: list.name(),
            hint_readings: list.hint_readings(),
            hint_examples: list.hint_example(),
            show_reversed: list.show_reversed_cards(),
            correct_rate: list.correct_rate(),
            items: list.items().as_slice(),
        };
        serde_json::to_writer_pretty(&mut *out, &view)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} ({} items)", list.name(), list.len())?;
    writeln!(
        out,
        "hint readings: {}, hint examples: {}, reversed cards: {}",
        list.hint_readings(),
        list.hint_example(),
        list.show_reversed_cards()
    )?;
    for (index, item) in list.items().iter().enumerate() {
        let readings = item
            .readings
            .as_deref()
            .map(|r| format!(" [{r}]"))
            .unwrap_or_default();
        writeln!(
            out,
            "{index:>4}  {}{readings} = {}  ({}/{}, {:.0}%)",
            item.phrase,
            item.meanings,
            item.correct_count(),
            item.shown_count(),
            item.correct_rate() * 100.0
        )?;
    }
    Ok(())
}

/// Change list name or flags.
pub fn set_options(path: &Path, options: &ListOptions) -> Result<bool> {
    let mut list = load(path)?;
    options.apply(&mut list);
    let changed = list.is_modified();
    if changed {
        save(path, &mut list)?;
    }
    Ok(changed)
}

/// Remove the item at `index`.
pub fn remove_item(path: &Path, index: usize) -> Result<Item> {
    let mut list = load(path)?;
    let item = list.remove_item(index)?;
    save(path, &mut list)?;
    Ok(item)
}

/// Zero every item's counters.
pub fn reset(path: &Path) -> Result<()> {
    let mut list = load(path)?;
    list.reset_statistics();
    save(path, &mut list)
}

/// Interactive session on stdin/stdout. Saves the list if anything changed.
pub fn run(path: &Path, config: &CliConfig, seed: Option<u64>, limit: Option<u32>) -> Result<()> {
    let mut list = load(path)?;
    if list.is_empty() {
        bail!("{} has no items to study", path.display());
    }

    let rng = match seed.or(config.seed) {
        Some(seed) => StdRandom::seeded(seed),
        None => StdRandom::from_os(),
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_session(&mut list, rng, limit, &mut stdin.lock(), &mut stdout.lock())?;

    if list.is_modified() {
        save(path, &mut list)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("list.xml");
        new_list(&path, "Verbs", &ListOptions::default(), false).unwrap();
        path
    }

    #[test]
    fn new_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = new_file(&dir);
        assert!(new_list(&path, "Again", &ListOptions::default(), false).is_err());
        new_list(&path, "Again", &ListOptions::default(), true).unwrap();
        assert_eq!(load(&path).unwrap().name(), "Again");
    }

    #[test]
    fn add_and_remove_items() {
        let dir = TempDir::new().unwrap();
        let path = new_file(&dir);
        assert_eq!(add_item(&path, Item::new("食べる", "to eat")).unwrap(), 0);
        assert_eq!(add_item(&path, Item::new("飲む", "to drink")).unwrap(), 1);

        let removed = remove_item(&path, 0).unwrap();
        assert_eq!(removed.phrase, "食べる");
        let list = load(&path).unwrap();
        assert_eq!(list.len(), 1);
        assert!(remove_item(&path, 5).is_err());
    }

    #[test]
    fn add_rejects_invalid_item_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = new_file(&dir);
        assert!(add_item(&path, Item::new("", "nothing")).is_err());
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn import_then_export() {
        let dir = TempDir::new().unwrap();
        let path = new_file(&dir);
        let tsv = dir.path().join("words.tsv");
        fs::write(&tsv, "食べる\tto eat\tたべる\n飲む\tto drink\n").unwrap();

        assert_eq!(import_items(&path, &tsv).unwrap(), 2);
        let mut out = Vec::new();
        export_items(&path, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "食べる\tto eat\tたべる\n飲む\tto drink\n"
        );
    }

    #[test]
    fn set_options_reports_changes() {
        let dir = TempDir::new().unwrap();
        let path = new_file(&dir);
        let options = ListOptions {
            reversed: Some(true),
            ..ListOptions::default()
        };
        assert!(set_options(&path, &options).unwrap());
        assert!(!set_options(&path, &options).unwrap());
        assert!(load(&path).unwrap().show_reversed_cards());
    }

    #[test]
    fn reset_zeros_counters() {
        let dir = TempDir::new().unwrap();
        let path = new_file(&dir);
        add_item(&path, Item::new("食べる", "to eat").with_counts(5, 4)).unwrap();
        reset(&path).unwrap();
        assert_eq!(load(&path).unwrap().item(0).unwrap().shown_count(), 0);
    }

    #[test]
    fn show_prints_items() {
        let dir = TempDir::new().unwrap();
        let path = new_file(&dir);
        add_item(&path, Item::new("食べる", "to eat").with_readings("たべる")).unwrap();

        let mut out = Vec::new();
        show(&path, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Verbs (1 items)"));
        assert!(text.contains("食べる [たべる] = to eat  (0/0, 0%)"));

        let mut out = Vec::new();
        show(&path, true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["name"], "Verbs");
        assert_eq!(value["items"][0]["readings"], "たべる");
    }
}
