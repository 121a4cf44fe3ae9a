//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::builder::NonEmptyStringValueParser;
use clap::{Args, Parser, Subcommand};

/// cs-e2e - End-to-end tests for Containership Kubernetes Engine clusters
#[derive(Parser, Debug)]
#[command(name = "cs-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a harness config file (endpoints, organization, poll timings)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision a cluster from a template and wait for it to become healthy
    Provision(ProvisionArgs),

    /// Scale a worker node pool up and back down
    Scale(SuiteArgs),

    /// Delete the cluster and wait for it to disappear
    Cleanup(SuiteArgs),
}

/// Credentials and paths every suite needs
#[derive(Args, Debug, Clone)]
pub struct EnvArgs {
    /// Containership Cloud token
    #[arg(
        long,
        env = "CONTAINERSHIP_TOKEN",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub token: String,

    /// Kubeconfig path; written by provision, read by the other suites
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Utf8PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SuiteArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Log Containership API request and response bodies
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub env: EnvArgs,

    /// Path to the infrastructure template file
    #[arg(long)]
    pub template: Utf8PathBuf,

    /// Provider credentials ID to provision with
    #[arg(long)]
    pub provider: String,

    /// Kubernetes version to provision (without leading 'v')
    #[arg(long)]
    pub kubernetes_version: String,

    /// Path to an SSH public key file to provide in the template
    #[arg(long, conflicts_with = "ssh_public_key")]
    pub ssh_public_key_file: Option<Utf8PathBuf>,

    /// Base64-encoded SSH public key to provide in the template
    #[arg(long)]
    pub ssh_public_key: Option<String>,

    /// Log Containership API request and response bodies
    #[arg(long)]
    pub debug: bool,
}
