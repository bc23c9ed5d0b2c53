use anyhow::{bail, Context};
use colored::Colorize;

use galang_campaign::{Campaign, CampaignStatus, CampaignStore};
use galang_ledger::{
    EntryFilter, EntryKind, LedgerError, LedgerReader, LedgerWriter, ReplayEngine,
    StreamValidator,
};
use galang_report::{ReportBuilder, ReportPeriod};
use galang_settlement::{BatchSummary, Disposition, SettleAction};
use galang_types::{Amount, CampaignId};

use crate::cli::*;
use crate::demo::{self, DemoWorld};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let world = demo::seed();
    match cli.command {
        Command::Campaigns(_) => cmd_campaigns(&world),
        Command::RunBatch(_) => cmd_run_batch(&world, &cli.format),
        Command::Settle(args) => cmd_settle(&world, args),
        Command::Preview(args) => cmd_preview(&world, args, &cli.format),
        Command::Recover(_) => cmd_recover(&world),
        Command::Wallets(_) => cmd_wallets(&world, &cli.format),
        Command::Entries(args) => cmd_entries(&world, args, &cli.format),
        Command::Transfer(args) => cmd_transfer(&world, args),
        Command::Verify(_) => cmd_verify(&world),
        Command::Report(args) => cmd_report(&world, args, &cli.format),
    }
}

fn cmd_campaigns(world: &DemoWorld) -> anyhow::Result<()> {
    println!("Demo campaigns as of {}:", world.now.format("%Y-%m-%d").to_string().bold());
    for (number, (title, id)) in world.campaigns.iter().enumerate() {
        let campaign = world
            .engine
            .campaigns()
            .get(id)?
            .context("demo campaign missing from store")?;
        println!(
            "  {} {} {} — {} / {} ({}), deadline {}, {}",
            format!("#{}", number + 1).bold(),
            title.bold(),
            id.short_id().dimmed(),
            campaign.raised,
            campaign.target,
            percent(&campaign),
            campaign.deadline.format("%Y-%m-%d"),
            status_label(campaign.status),
        );
    }
    Ok(())
}

fn cmd_run_batch(world: &DemoWorld, format: &OutputFormat) -> anyhow::Result<()> {
    let summary = world.engine.run_batch()?;
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} Settlement batch finished", "✓".green().bold());
    for result in &summary.results {
        println!(
            "  {} {} — {}, credits issued {}",
            title_of(world, &result.campaign_id).bold(),
            result.campaign_id.short_id().dimmed(),
            disposition_label(&result.disposition),
            result.credits_issued.to_string().yellow(),
        );
    }
    print_batch_totals(&summary);
    Ok(())
}

fn cmd_settle(world: &DemoWorld, args: SettleArgs) -> anyhow::Result<()> {
    let id = world
        .campaign(args.campaign)
        .with_context(|| format!("no campaign #{}", args.campaign))?;
    let action: SettleAction = args.action.parse()?;
    let result = world.engine.settle_campaign(&id, action)?;

    println!(
        "{} {} {} — {}",
        "✓".green().bold(),
        title_of(world, &id).bold(),
        id.short_id().dimmed(),
        disposition_label(&result.disposition),
    );
    if result.donations_converted > 0 || result.donations_skipped > 0 {
        println!(
            "  {} donation(s) converted, {} skipped, credits {}",
            result.donations_converted,
            result.donations_skipped,
            result.credits_issued.to_string().yellow(),
        );
    }
    Ok(())
}

fn cmd_preview(world: &DemoWorld, args: PreviewArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let upcoming = world.engine.preview_expiring(args.window_days)?;
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&upcoming)?);
        return Ok(());
    }

    if upcoming.is_empty() {
        println!("No campaigns expire within {} day(s).", args.window_days);
        return Ok(());
    }
    println!("Expiring within {} day(s):", args.window_days);
    for campaign in &upcoming {
        let days_left = (campaign.deadline - world.now).num_days();
        println!(
            "  {} {} — {} of target, {} day(s) left",
            title_of(world, &campaign.id).bold(),
            campaign.id.short_id().dimmed(),
            percent(campaign),
            days_left.to_string().yellow(),
        );
    }
    Ok(())
}

fn cmd_recover(world: &DemoWorld) -> anyhow::Result<()> {
    let summary = world.engine.recover_stale()?;
    if summary.results.is_empty() {
        println!("{} No stale settlement claims.", "✓".green());
        return Ok(());
    }
    println!("{} Rescued stale settlement claims", "✓".green().bold());
    for result in &summary.results {
        println!(
            "  {} — {}",
            title_of(world, &result.campaign_id).bold(),
            disposition_label(&result.disposition),
        );
    }
    print_batch_totals(&summary);
    Ok(())
}

fn cmd_wallets(world: &DemoWorld, format: &OutputFormat) -> anyhow::Result<()> {
    world.engine.run_batch()?;

    if let OutputFormat::Json = format {
        let mut out = serde_json::Map::new();
        for (name, user) in &world.donors {
            if let Some(wallet) = world.engine.ledger().wallet(user)? {
                out.insert((*name).to_string(), serde_json::to_value(&wallet)?);
            }
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Wallets after settlement:");
    for (name, user) in &world.donors {
        match world.engine.ledger().wallet(user)? {
            Some(wallet) => println!(
                "  {} {} — balance {}, earned {}, spent {}, tier {}",
                name.bold(),
                wallet.id.short_id().dimmed(),
                wallet.balance.to_string().yellow(),
                wallet.total_earned,
                wallet.total_spent,
                wallet.tier.to_string().cyan(),
            ),
            None => println!("  {} — no wallet", name.bold()),
        }
    }
    Ok(())
}

fn cmd_entries(world: &DemoWorld, args: EntriesArgs, format: &OutputFormat) -> anyhow::Result<()> {
    world.engine.run_batch()?;
    let user = world
        .donor(&args.donor)
        .with_context(|| format!("unknown donor: {}", args.donor))?;

    let filter = EntryFilter {
        kind: args.kind.as_deref().map(parse_kind).transpose()?,
        category: args.category.clone(),
        limit: Some(args.limit),
        ..EntryFilter::default()
    };
    let entries = world.engine.ledger().entries_filtered(&user, &filter)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No ledger entries for {}.", args.donor.bold());
        return Ok(());
    }
    println!("Ledger entries for {}:", args.donor.bold());
    for entry in &entries {
        println!(
            "  {} {} {} {} [{}] balance {} — {}",
            format!("#{}", entry.seq).yellow(),
            entry.short_hash().dimmed(),
            entry.kind,
            entry.signed_amount().to_string().bold(),
            entry.category,
            entry.balance_after,
            entry.description,
        );
    }
    Ok(())
}

fn cmd_transfer(world: &DemoWorld, args: TransferArgs) -> anyhow::Result<()> {
    world.engine.run_batch()?;
    let from = world
        .donor(&args.from)
        .with_context(|| format!("unknown donor: {}", args.from))?;
    let to = world
        .donor(&args.to)
        .with_context(|| format!("unknown donor: {}", args.to))?;

    match world.engine.ledger().transfer(
        from,
        to,
        Amount::new(args.amount),
        "wallet transfer",
        world.now,
    ) {
        Ok(receipt) => {
            println!("{} Transferred {}", "✓".green().bold(), Amount::new(args.amount));
            println!(
                "  {} {} balance {}",
                args.from.bold(),
                "→".dimmed(),
                receipt.debit.balance_after,
            );
            println!(
                "  {} {} balance {}",
                args.to.bold(),
                "←".dimmed(),
                receipt.credit.balance_after,
            );
            Ok(())
        }
        Err(e @ LedgerError::InsufficientBalance { .. }) => {
            println!("{} {}", "✗".red().bold(), e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_verify(world: &DemoWorld) -> anyhow::Result<()> {
    world.engine.run_batch()?;
    let ledger = world.engine.ledger();
    let reports = StreamValidator::validate_all(ledger)?;

    let mut all_valid = true;
    for report in &reports {
        let name = name_of(world, &report.user);
        if report.is_valid() {
            println!(
                "  {} {} — {} entries, chain {}",
                "✓".green(),
                name.bold(),
                report.entry_count,
                "valid".green(),
            );
        } else {
            all_valid = false;
            println!("  {} {} — {} violation(s)", "✗".red(), name.bold(), report.violations.len());
            for violation in &report.violations {
                println!("      seq {}: {}", violation.seq, violation.description.red());
            }
        }
        if !ReplayEngine::verify_wallet(ledger, &report.user)? {
            all_valid = false;
            println!("      {} replayed balances do not match the wallet", "✗".red());
        }
    }

    if all_valid {
        println!("{} Ledger integrity verified", "✓".green().bold());
        println!("  Hash chains: {}", "valid".green());
        println!("  Sequences: {}", "monotonic".green());
        println!("  Replayed balances: {}", "consistent".green());
        Ok(())
    } else {
        bail!("ledger integrity check failed");
    }
}

fn cmd_report(world: &DemoWorld, args: ReportArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let period = ReportPeriod::trailing_days(world.now, args.days)?;
    let campaign = args
        .campaign
        .map(|number| {
            world
                .campaign(number)
                .with_context(|| format!("no campaign #{number}"))
        })
        .transpose()?;

    let summary =
        ReportBuilder::financial_summary(&world.donations, world.engine.ledger(), period, campaign)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Financial summary {} — {}",
        period.from.format("%Y-%m-%d").to_string().bold(),
        period.to.format("%Y-%m-%d").to_string().bold(),
    );
    println!("  Income: {}", summary.income.total.to_string().yellow().bold());
    for (channel, amount) in &summary.income.by_channel {
        println!("    {channel}: {amount}");
    }
    println!(
        "  Expense: {} (disbursements {}, refunds {})",
        summary.expense.total, summary.expense.disbursements, summary.expense.refunds,
    );
    println!(
        "  Donations: {} from {} distinct donor(s), mean {}, median {}",
        summary.statistics.donation_count,
        summary.statistics.distinct_donors,
        summary.statistics.mean,
        summary.statistics.median,
    );
    Ok(())
}

fn print_batch_totals(summary: &BatchSummary) {
    println!(
        "  {} processed, {} deferred, {} failed — total {} raised, {} credits issued",
        summary.processed.to_string().green(),
        summary.deferred.to_string().cyan(),
        summary.failed.to_string().red(),
        summary.total_amount,
        summary.total_credits.to_string().yellow(),
    );
}

fn percent(campaign: &Campaign) -> String {
    let bp = campaign.success_basis_points();
    format!("{}.{:02}%", bp / 100, bp % 100)
}

fn title_of<'a>(world: &'a DemoWorld, id: &CampaignId) -> &'a str {
    world
        .campaigns
        .iter()
        .find(|(_, campaign)| campaign == id)
        .map(|(title, _)| *title)
        .unwrap_or("unknown campaign")
}

fn name_of<'a>(world: &'a DemoWorld, user: &galang_types::UserId) -> &'a str {
    world
        .donors
        .iter()
        .find(|(_, id)| id == user)
        .map(|(name, _)| *name)
        .unwrap_or("unnamed")
}

fn status_label(status: CampaignStatus) -> colored::ColoredString {
    match status {
        CampaignStatus::Active => "active".green(),
        CampaignStatus::Completed => "completed".green().bold(),
        CampaignStatus::EndedPartial => "ended_partial".yellow(),
        CampaignStatus::EndedFailed => "ended_failed".red(),
        CampaignStatus::Cancelled | CampaignStatus::Rejected => status.to_string().red().dimmed(),
        CampaignStatus::Draft | CampaignStatus::Pending => status.to_string().normal(),
    }
}

fn disposition_label(disposition: &Disposition) -> String {
    match disposition {
        Disposition::Completed => "completed".green().bold().to_string(),
        Disposition::ConvertedPartial => "converted to credits (partial)".yellow().to_string(),
        Disposition::ConvertedFailed => "converted to credits (failed)".yellow().to_string(),
        Disposition::GracePending { until } => format!("in grace until {}", until.format("%Y-%m-%d"))
            .cyan()
            .to_string(),
        Disposition::Extended { new_deadline } => {
            format!("extended to {}", new_deadline.format("%Y-%m-%d"))
                .cyan()
                .to_string()
        }
        Disposition::Recovered => "recovered".green().to_string(),
        Disposition::Failed { error } => format!("failed: {error}").red().to_string(),
    }
}

fn parse_kind(s: &str) -> anyhow::Result<EntryKind> {
    Ok(match s {
        "earn" => EntryKind::Earn,
        "spend" => EntryKind::Spend,
        "transfer_in" => EntryKind::TransferIn,
        "transfer_out" => EntryKind::TransferOut,
        "bonus" => EntryKind::Bonus,
        "refund" => EntryKind::Refund,
        other => bail!("unknown entry kind: {other}"),
    })
}
