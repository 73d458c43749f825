use clap::Parser;
use magento_image_convert::config::DbConfig;
use magento_image_convert::convert::{Converter, SQL_LOG_FILE};
use magento_image_convert::output;
use magento_image_convert::stats::StatsAggregator;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "magento-image-convert")]
#[command(about = "Batch-convert Magento product images to a target format")]
#[command(long_about = "\
Batch-convert Magento product images to a target format

Walks the two Magento tables that reference product images
(catalog_product_entity_media_gallery and catalog_product_entity_varchar),
converts every referenced file that is not already in the target format, and
records the matching row rewrites in a replayable SQL script (output.sql).

Without --execute this is a dry run against the filesystem only: converted
files are written next to the originals and output.sql holds the row updates
for later review, but the database itself is untouched. With --execute the
same updates are also applied to the live database inside a transaction.

Database credentials come from the environment (a .env file in the working
directory is honored):

  DB_HOST      (localhost)
  DB_PORT      (3306)
  DB_USERNAME  (user)
  DB_PASSWORD  (password)
  DB_PREFIX    (empty - unprefixed tables)")]
#[command(version)]
struct Cli {
    /// Path to the Magento project root
    #[arg(short, long)]
    path: PathBuf,

    /// Database name for the project (credentials come from the environment)
    #[arg(short = 'd', long = "db")]
    database: String,

    /// Image format to convert images to
    #[arg(short, long, default_value = "jpg")]
    format: String,

    /// Update the database on the fly, not just the SQL log
    #[arg(short, long)]
    execute: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let db_config = DbConfig::from_env();

    let converter = Converter::connect(
        &cli.path,
        &cli.database,
        &cli.format,
        cli.execute,
        &db_config,
    )?;

    println!("Starting conversion...");

    let mut stats = StatsAggregator::new();
    converter.run(&mut |old_path, new_path| {
        match stats.record_files(old_path, new_path) {
            Ok(item) => println!(
                "{}",
                output::format_item_line(stats.count(), old_path, new_path, &item)
            ),
            // Reporting must never abort a run that already converted the file.
            Err(err) => log::warn!(
                "could not read sizes for {} / {}: {err}",
                old_path.display(),
                new_path.display()
            ),
        }
    })?;

    println!("Process finished! You may find the output sql in {SQL_LOG_FILE}");

    if let Some(summary) = stats.summary() {
        for line in output::format_summary(&summary) {
            println!("{line}");
        }
    }

    Ok(())
}
