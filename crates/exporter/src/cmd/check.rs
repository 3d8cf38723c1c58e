//! Check command
//!
//! Loads and validates a configuration file, then instantiates every
//! configured sink and runs its configure step once, so option errors show
//! up before a director is started.
//!
//! # Usage
//!
//! ```bash
//! exporter check configs/exporter.toml
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use exporter_config::DirectorMode;
use exporter_pipeline::{ConfiguredSink, configured_sinks};
use exporter_protocol::PartitionId;
use exporter_sinks::{SinkContext, SinkError, SinkRegistry};
use owo_colors::OwoColorize;

use crate::load_config;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to configuration file
    pub config: PathBuf,
}

pub fn run(args: CheckArgs) -> Result<()> {
    println!();
    println!("{}", "Exporter Config Check".bold());
    println!("{}", "─".repeat(50));
    println!("Config        {}", args.config.display().cyan());

    print!("Loading configuration... ");
    let config = match load_config(Some(&args.config)) {
        Ok(config) => {
            println!("{}", "✓".green());
            config
        }
        Err(e) => {
            println!("{}", "✗".red());
            println!("  {}", format!("{e:#}").red());
            return Err(e);
        }
    };

    let director = &config.director;
    println!("Partition     {}", director.partition_id);
    println!(
        "Mode          {}",
        match director.mode {
            DirectorMode::Active => "active",
            DirectorMode::Passive => "passive",
        }
    );
    println!(
        "State         {}",
        config
            .state
            .path
            .as_ref()
            .map_or_else(|| "in-memory".to_string(), |p| p.display().to_string())
            .dimmed()
    );
    println!("{}", "─".repeat(50));
    println!();

    let registry = SinkRegistry::with_builtin();
    let sinks = configured_sinks(&config.sinks, &registry)?;
    if sinks.is_empty() {
        println!("{}", "No sinks configured; the director will stay idle".yellow());
        return Ok(());
    }

    let mut all_ok = true;
    println!("Sinks:");
    for sink in &sinks {
        print!(
            "  {} ({})... ",
            sink.descriptor.id(),
            sink.descriptor.sink_type()
        );
        match configure_once(sink, director.partition_id) {
            Ok(()) => println!("{}", "✓".green()),
            Err(e) => {
                println!("{}", "✗".red());
                println!("    {}", e.to_string().red());
                all_ok = false;
            }
        }
        if let Some(init_from) = &sink.init_from {
            println!("    initialized from {}", init_from.as_str().dimmed());
        }
    }

    println!();
    if all_ok {
        println!("{}", "Configuration is valid".green().bold());
        Ok(())
    } else {
        anyhow::bail!("one or more sinks failed to configure")
    }
}

fn configure_once(sink: &ConfiguredSink, partition_id: PartitionId) -> Result<(), SinkError> {
    let descriptor = &sink.descriptor;
    let mut context = SinkContext::new(
        descriptor.id().clone(),
        partition_id,
        descriptor.config().clone(),
        *descriptor.filter(),
    );
    let mut instance = descriptor.create_sink();
    instance.configure(&mut context)?;
    instance.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_check_valid_config() {
        let file = write_config(
            r#"
[sinks.audit]
type = "stdout"
color = false

[sinks.discard]
type = "null"
"#,
        );
        run(CheckArgs {
            config: file.path().to_path_buf(),
        })
        .unwrap();
    }

    #[test]
    fn test_check_rejects_bad_sink_options() {
        let file = write_config(
            r#"
[sinks.audit]
type = "stdout"
color = "sometimes"
"#,
        );
        assert!(
            run(CheckArgs {
                config: file.path().to_path_buf(),
            })
            .is_err()
        );
    }

    #[test]
    fn test_check_missing_file() {
        assert!(
            run(CheckArgs {
                config: PathBuf::from("/nonexistent/exporter.toml"),
            })
            .is_err()
        );
    }
}
