use crate::dates::{self, EditDatePolicy};
use crate::error::{HerdbookError, HerdbookResult};
use crate::partition::{CountTable, YearPartition};
use crate::register::Register;
use crate::store::{SheetStore, StoreConfig, XlsxWorksheet};
use crate::types::{CellValue, Record};
use colored::Colorize;

/// Fields for a new record
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    pub name: String,
    pub species: String,
    /// Defaults to today when absent
    pub acquired: Option<String>,
    pub feed: String,
    pub notes: String,
}

/// Field overrides for an existing record. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    pub name: Option<String>,
    pub species: Option<String>,
    pub acquired: Option<String>,
    pub disposed: Option<String>,
    pub feed: Option<String>,
    pub notes: Option<String>,
}

impl UpdateArgs {
    /// Merge the overrides into `record`
    pub fn apply(self, mut record: Record) -> Record {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(species) = self.species {
            record.species = species;
        }
        if let Some(acquired) = self.acquired {
            record.acquired = CellValue::from_raw(&acquired);
        }
        if let Some(disposed) = self.disposed {
            record.disposed = CellValue::from_raw(&disposed);
        }
        if let Some(feed) = self.feed {
            record.feed = feed;
        }
        if let Some(notes) = self.notes {
            record.notes = notes;
        }
        record
    }
}

type XlsxRegister = Register<SheetStore<XlsxWorksheet>>;

fn open_register(config: &StoreConfig, policy: EditDatePolicy) -> HerdbookResult<XlsxRegister> {
    Ok(Register::open(config.open()?)?.with_policy(policy))
}

/// Print a loud warning when an overwrite was interrupted
fn report_failure(e: &HerdbookError) {
    if let HerdbookError::PartialWrite { written, total, .. } = e {
        eprintln!(
            "{}",
            format!(
                "⚠️  Only {} of {} rows were written. The worksheet is incomplete; rerun the command to rewrite it.",
                written, total
            )
            .red()
            .bold()
        );
    }
}

fn committed<T>(result: HerdbookResult<T>) -> HerdbookResult<T> {
    result.inspect_err(report_failure)
}

/// Execute the init command
pub fn init(config: &StoreConfig, force: bool) -> HerdbookResult<()> {
    if config.path.exists() && !force {
        return Err(HerdbookError::Open(format!(
            "{} already exists (use --force to overwrite)",
            config.path.display()
        )));
    }
    config.create()?;
    println!(
        "{} {} (worksheet '{}')",
        "✅ Created".bold().green(),
        config.path.display(),
        config.sheet
    );
    Ok(())
}

/// Execute the list command
pub fn list(config: &StoreConfig) -> HerdbookResult<()> {
    let register = open_register(config, EditDatePolicy::default())?;
    let records = register.list();

    println!("{}", "🐾 Herdbook - Records".bold().green());
    println!("   File: {} [{}]", config.path.display(), config.sheet);
    println!();

    if records.is_empty() {
        println!("{}", "   No records yet.".yellow());
        return Ok(());
    }

    for (index, record) in records.iter().enumerate() {
        print_record(index, record);
    }
    println!();
    println!("   {} records", records.len());
    Ok(())
}

fn print_record(index: usize, record: &Record) {
    let acquired = match &record.acquired {
        CellValue::Date(d) => dates::format_date(*d).normal(),
        CellValue::Text(raw) => format!("{} (not a date)", raw).yellow(),
        CellValue::Empty => "-".dimmed(),
    };
    let status = if record.is_present() {
        String::new()
    } else {
        format!("  gone {}", record.disposed)
    };
    println!(
        "   {:>3}  {} ({})  {}{}",
        index.to_string().dimmed(),
        record.name.bright_blue().bold(),
        record.species.cyan(),
        acquired,
        status.red()
    );
    if !record.feed.is_empty() {
        println!("        feed: {}", record.feed);
    }
    if !record.notes.is_empty() {
        println!("        notes: {}", record.notes);
    }
}

/// Execute the add command
pub fn add(config: &StoreConfig, args: AddArgs) -> HerdbookResult<()> {
    let mut register = open_register(config, EditDatePolicy::default())?;

    let acquired = match args.acquired {
        Some(raw) => CellValue::from_raw(&raw),
        None => CellValue::Date(dates::today()),
    };
    let record = Record {
        name: args.name,
        species: args.species,
        acquired,
        disposed: CellValue::Empty,
        feed: args.feed,
        notes: args.notes,
    };

    let index = committed(register.add(record))?;
    let stored = register.get(index)?;
    println!(
        "{} {} at index {}",
        "✅ Added".bold().green(),
        stored.name.bright_blue().bold(),
        index
    );
    if stored.year().is_none() {
        println!(
            "{}",
            "   Acquisition date is not a date; the record is left out of year views.".yellow()
        );
    }
    Ok(())
}

/// Execute the update command
pub fn update(
    config: &StoreConfig,
    policy: EditDatePolicy,
    index: usize,
    args: UpdateArgs,
) -> HerdbookResult<()> {
    let mut register = open_register(config, policy)?;
    let edit = args.apply(register.get(index)?);
    let updated = committed(register.update(index, edit))?;
    println!(
        "{} {} at index {}",
        "✅ Updated".bold().green(),
        updated.name.bright_blue().bold(),
        index
    );
    Ok(())
}

/// Execute the delete command
pub fn delete(config: &StoreConfig, index: usize) -> HerdbookResult<()> {
    let mut register = open_register(config, EditDatePolicy::default())?;
    let removed = committed(register.delete(index))?;
    println!(
        "{} {} ({} records left)",
        "🗑️  Deleted".bold().yellow(),
        removed.name.bright_blue().bold(),
        register.len()
    );
    Ok(())
}

/// Execute the years command
pub fn years(config: &StoreConfig) -> HerdbookResult<()> {
    let register = open_register(config, EditDatePolicy::default())?;
    let records = register.list();
    print_partition(&register.partition(), &records);
    Ok(())
}

fn print_partition(partition: &YearPartition, records: &[Record]) {
    println!("{}", "📅 Records per year".bold().green());
    if partition.years.is_empty() {
        println!("{}", "   No dated records.".yellow());
    }
    for year in &partition.years {
        println!();
        println!("   {} ({} animals)", year.year.to_string().bold(), year.count());
        for group in &year.species {
            println!("      🧬 {} ({})", group.species.cyan(), group.count());
            for &row in &group.rows {
                if let Some(record) = records.get(row) {
                    println!("         {:>3}  {}", row.to_string().dimmed(), record.name);
                }
            }
        }
    }
    if !partition.undated.is_empty() {
        println!();
        println!(
            "{}",
            format!("   {} records without a usable acquisition date", partition.undated.len())
                .yellow()
        );
    }
}

/// Execute the counts command
pub fn counts(config: &StoreConfig) -> HerdbookResult<()> {
    let register = open_register(config, EditDatePolicy::default())?;
    println!("{}", "📊 Count per year and species".bold().green());
    println!();
    print!("{}", render_counts(&register.counts()));
    Ok(())
}

/// Plain-text pivot, one line per year
pub fn render_counts(table: &CountTable) -> String {
    if table.is_empty() {
        return "   (no dated records)\n".to_string();
    }
    let widths: Vec<usize> = table.species.iter().map(|s| s.len().max(3)).collect();

    let mut out = format!("   {:<6}", "Year");
    for (species, width) in table.species.iter().zip(&widths) {
        out.push_str(&format!("  {:>width$}", species, width = width));
    }
    out.push('\n');

    for (year, row) in table.years.iter().zip(&table.counts) {
        out.push_str(&format!("   {:<6}", year));
        for (count, width) in row.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", count, width = width));
        }
        out.push('\n');
    }
    out
}
