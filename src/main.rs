use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use voice_archive::error::DynError;
use voice_archive::{
    ArchiveConfig, Quality, RecordingRecord, SaveOutcome, SaveRecordingRequest, SettingsUpdate,
    VoiceArchive,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and maintain the voice recording archive")]
struct Args {
    /// Path to config file (TOML format)
    #[arg(short, long, global = true, default_value = "voice_archive.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List visible recordings, newest first
    List {
        /// Only recordings of this scripture
        #[arg(long)]
        scripture: Option<String>,
    },
    /// Print storage statistics as JSON
    Stats,
    /// Show settings, or update them when any option is given
    Settings {
        #[arg(long)]
        auto_save: Option<bool>,
        #[arg(long)]
        minimum_accuracy: Option<u8>,
        #[arg(long)]
        max_storage_days: Option<u32>,
        /// Quota in megabytes
        #[arg(long, conflicts_with = "clear_max_storage_size")]
        max_storage_size: Option<u64>,
        /// Remove the storage quota
        #[arg(long)]
        clear_max_storage_size: bool,
        #[arg(long)]
        use_recorded_voice: Option<bool>,
    },
    /// Offer an audio file to the archive as if a session had just finished
    Save {
        /// Finished audio file to copy in
        file: PathBuf,
        #[arg(long)]
        scripture_id: String,
        #[arg(long)]
        scripture_ref: String,
        #[arg(long)]
        accuracy: f64,
        /// Duration in seconds
        #[arg(long, default_value = "0")]
        duration: f64,
        /// standard, high or premium
        #[arg(long)]
        quality: Option<Quality>,
    },
    /// Delete one recording by id
    Delete { id: String },
    /// Apply the TTL and quota policies now
    Evict,
    /// Drop records whose file is missing and list files without a record
    Repair,
}

#[tokio::main]
async fn main() -> Result<(), DynError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ArchiveConfig::load(&args.config)?;
    let archive = VoiceArchive::open(&config).await?;
    if let Err(e) = archive.initialize().await {
        eprintln!("Warning: archive is running degraded: {}", e);
    }

    let result = run(&archive, args.command).await;
    archive.close().await;
    result
}

async fn run(archive: &VoiceArchive, command: Command) -> Result<(), DynError> {
    match command {
        Command::List { scripture } => {
            let records = match scripture {
                Some(id) => archive.get_recordings_for_scripture(&id).await,
                None => archive.get_all_recordings().await,
            };
            if records.is_empty() {
                println!("No recordings");
            }
            for record in &records {
                print_record(record);
            }
        }
        Command::Stats => {
            let stats = archive.get_storage_stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Settings {
            auto_save,
            minimum_accuracy,
            max_storage_days,
            max_storage_size,
            clear_max_storage_size,
            use_recorded_voice,
        } => {
            let update = SettingsUpdate {
                auto_save_enabled: auto_save,
                minimum_accuracy,
                max_storage_days,
                max_storage_size: if clear_max_storage_size {
                    Some(None)
                } else {
                    max_storage_size.map(Some)
                },
                use_recorded_voice,
            };
            let settings = if update.is_empty() {
                archive.get_settings().await
            } else {
                archive.update_settings(&update).await?
            };
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Save {
            file,
            scripture_id,
            scripture_ref,
            accuracy,
            duration,
            quality,
        } => {
            let mut request =
                SaveRecordingRequest::new(scripture_id, scripture_ref, file, accuracy, duration);
            request.quality = quality;
            match archive.save_recording(request).await? {
                SaveOutcome::Saved { record, eviction } => {
                    println!("Saved:");
                    print_record(&record);
                    if eviction.removed_count() > 0 {
                        println!(
                            "Evicted {} recordings ({} bytes freed)",
                            eviction.removed_count(),
                            eviction.freed_bytes
                        );
                    }
                }
                SaveOutcome::Rejected(reason) => println!("Not saved: {}", reason),
            }
        }
        Command::Delete { id } => {
            if archive.delete_recording(&id).await? {
                println!("Deleted {}", id);
            } else {
                println!("No recording with id {}", id);
            }
        }
        Command::Evict => {
            let report = archive.run_eviction(None).await?;
            println!(
                "Expired: {}, over quota: {}, skipped: {}, freed {} bytes",
                report.expired.len(),
                report.over_quota.len(),
                report.skipped.len(),
                report.freed_bytes
            );
        }
        Command::Repair => {
            let report = archive.repair().await?;
            println!("Pruned {} records", report.pruned_records.len());
            for id in &report.pruned_records {
                println!("  - {}", id);
            }
            println!("Files without a record: {}", report.orphan_files.len());
            for path in &report.orphan_files {
                println!("  - {}", path.display());
            }
        }
    }
    Ok(())
}

fn print_record(record: &RecordingRecord) {
    let created = DateTime::<Utc>::from_timestamp_millis(record.timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| record.timestamp.to_string());
    let tags: Vec<&str> = record.tags.iter().map(String::as_str).collect();
    println!(
        "{}  {:<16} {:>5.1}%  {:>6.1}s  {:>10} bytes  {:<8} {}  [{}]",
        record.id,
        record.scripture_ref,
        record.accuracy,
        record.duration,
        record.file_size,
        record.quality,
        created,
        tags.join(", ")
    );
}
