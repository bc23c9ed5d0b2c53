use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "galang",
    about = "Galang — campaign settlement and credit ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Every command operates on a seeded in-memory demo dataset; nothing
/// persists between invocations.
#[derive(Subcommand)]
pub enum Command {
    /// List the demo campaigns and their standing
    Campaigns(CampaignsArgs),
    /// Run the batch settlement over all expired campaigns
    RunBatch(RunBatchArgs),
    /// Apply a manual settlement action to one campaign
    Settle(SettleArgs),
    /// Show campaigns expiring within a window (dry run)
    Preview(PreviewArgs),
    /// Rescue campaigns stuck mid-settlement past the staleness cutoff
    Recover(RecoverArgs),
    /// Show every wallet after settlement
    Wallets(WalletsArgs),
    /// Show a donor's ledger entries after settlement
    Entries(EntriesArgs),
    /// Transfer credit between two donor wallets after settlement
    Transfer(TransferArgs),
    /// Verify ledger integrity: hash chains, sequences, replayed balances
    Verify(VerifyArgs),
    /// Financial summary for a trailing period
    Report(ReportArgs),
}

#[derive(Args)]
pub struct CampaignsArgs {}

#[derive(Args)]
pub struct RunBatchArgs {}

#[derive(Args)]
pub struct SettleArgs {
    /// Campaign number as shown by `campaigns`
    pub campaign: usize,
    /// One of: credits, complete, extend, extend:<days>
    pub action: String,
}

#[derive(Args)]
pub struct PreviewArgs {
    #[arg(long, default_value = "7")]
    pub window_days: i64,
}

#[derive(Args)]
pub struct RecoverArgs {}

#[derive(Args)]
pub struct WalletsArgs {}

#[derive(Args)]
pub struct EntriesArgs {
    /// Donor name as shown by `wallets`
    pub donor: String,
    #[arg(long)]
    pub kind: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct TransferArgs {
    pub from: String,
    pub to: String,
    /// Amount in minor units
    pub amount: i64,
}

#[derive(Args)]
pub struct VerifyArgs {}

#[derive(Args)]
pub struct ReportArgs {
    #[arg(long, default_value = "30")]
    pub days: i64,
    /// Restrict to one campaign number
    #[arg(long)]
    pub campaign: Option<usize>,
}
