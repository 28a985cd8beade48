//! Form-Filling CLI Application.
//!
//! This binary provides a command-line interface for the formfill library:
//! fill a form against a profile folder, or extract a document's text for
//! inspection.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use formfill::{FillService, OracleConfig, Provider};

/// Form-Filling Tool
///
/// Fill DOCX and PDF forms from a folder of personal documents.
/// By default, performs a fill. Use the 'extract' subcommand to inspect a
/// document's text.
#[derive(Parser)]
#[command(name = "formfill")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Form file to fill (.docx or .pdf)
    #[arg(short, long, value_name = "FILE")]
    form: Option<PathBuf>,

    /// Profile folder holding context_data.json and personal documents
    #[arg(short, long, value_name = "DIR")]
    profile: Option<PathBuf>,

    /// Output path for the filled form
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Oracle provider to use
    #[arg(long, value_enum, default_value = "openai")]
    provider: ProviderArg,

    /// Override the provider's default model
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Print the filled document's text after writing it
    #[arg(long)]
    print_filled: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "groq")]
    Groq,
    #[value(name = "workspace")]
    Workspace,
}

impl From<ProviderArg> for Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::OpenAi => Provider::OpenAi,
            ProviderArg::Groq => Provider::Groq,
            ProviderArg::Workspace => Provider::Workspace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a document's text (for debugging and verification)
    Extract {
        /// Input form file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Fill command handler with dependency injection.
struct FillHandler {
    service: FillService,
    verbose: bool,
}

impl FillHandler {
    /// Builds the oracle from flags and environment, then the service.
    fn new(provider: Provider, model: Option<String>, verbose: bool) -> Result<Self> {
        let mut config = OracleConfig::from_env(provider);
        config.model = model;
        let oracle = config
            .build()
            .with_context(|| "Failed to configure the oracle backend")?;
        Ok(Self {
            service: FillService::new(oracle),
            verbose,
        })
    }

    /// Executes a fill operation.
    fn fill(
        &mut self,
        form: &Path,
        profile: &Path,
        output: Option<&Path>,
        print_filled: bool,
    ) -> Result<()> {
        if !form.exists() {
            anyhow::bail!("Form file does not exist: {}", form.display());
        }
        if !profile.is_dir() {
            anyhow::bail!("Profile folder does not exist: {}", profile.display());
        }

        if self.verbose {
            println!("Form:    {}", form.display());
            println!("Profile: {}", profile.display());
        }

        let out = self
            .service
            .fill_form(form, profile, output)
            .with_context(|| "Fill failed")?;

        println!("✓ Filled form written → {}", out.display());

        if print_filled {
            let text = self
                .service
                .extract_text(&out)
                .with_context(|| "Failed to extract the filled document's text")?;
            println!("\n===== Filled Document Text =====\n");
            println!("{}", text);
            println!("\n===== End of Filled Document Text =====");
        }

        Ok(())
    }

}

/// Extracts text from a document; no oracle needed.
fn extract(input: &Path, output: Option<&Path>) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let text = formfill::service::extract_document_text(input)
        .with_context(|| "Text extraction failed")?;

    if let Some(output_path) = output {
        std::fs::write(output_path, &text)
            .with_context(|| format!("Failed to write to {}", output_path.display()))?;
        println!(
            "✓ Extracted {} characters → {}",
            text.len(),
            output_path.display()
        );
    } else {
        println!("{}", text);
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    match &cli.command {
        Some(Commands::Extract { input, output }) => {
            extract(input, output.as_deref())?;
        }
        None => {
            let form = cli
                .form
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--form is required"))?;
            let profile = cli
                .profile
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("--profile is required"))?;
            let mut handler =
                FillHandler::new(cli.provider.into(), cli.model.clone(), cli.verbose)?;
            handler.fill(form, profile, cli.output.as_deref(), cli.print_filled)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_mapping() {
        assert!(matches!(Provider::from(ProviderArg::OpenAi), Provider::OpenAi));
        assert!(matches!(Provider::from(ProviderArg::Groq), Provider::Groq));
        assert!(matches!(
            Provider::from(ProviderArg::Workspace),
            Provider::Workspace
        ));
    }
}
