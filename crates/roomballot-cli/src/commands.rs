//! Subcommand implementations.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Args;
use rand::{SeedableRng, rngs::OsRng};
use rand_chacha::ChaCha8Rng;
use roomballot_core::{Allocator, CollusionReport, scan, shuffle_ballot};
use roomballot_secrets::{
    Anonymizer, Claim, ReplayReport, artifact_from_json, audit_publication_order,
    replay_allocation, verify_claim, verify_secret,
};
use roomballot_types::{
    Ballot, BallotConfig, BallotError, Participant, PrefixPolicy, PublicArtifact,
    PublicationIndex, RoomId, VerifiedOutcome, constants,
};

use crate::{reader, writer};

#[derive(Args)]
pub struct RunArgs {
    #[arg(help = "People CSV: name,id,priority,choice_1..choice_k")]
    pub people: PathBuf,
    #[arg(long, default_value = "results.csv", help = "Anonymised results CSV")]
    pub results: PathBuf,
    #[arg(long, default_value = "public.json", help = "Re-loadable public artifact")]
    pub public: PathBuf,
    #[arg(long, default_value = "tokens.csv", help = "Private tokens, one per participant")]
    pub tokens: PathBuf,
    #[command(flatten)]
    pub config: ConfigArgs,
    #[arg(long, value_name = "K", help = "Also scan for shared K-choice prefixes")]
    pub collusion: Vec<usize>,
    #[arg(long, help = "Seed the input shuffle instead of using OS entropy")]
    pub seed: Option<u64>,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long, value_name = "PATH", help = "JSON configuration file")]
    pub config: Option<PathBuf>,
    #[arg(long, value_name = "N", help = "Hand out at most N rooms")]
    pub max_rooms: Option<usize>,
    #[arg(
        long = "desirable-prefix",
        value_name = "PREFIX",
        help = "Room-name prefix of the desirable category (repeatable)"
    )]
    pub desirable_prefixes: Vec<String>,
}

impl ConfigArgs {
    /// File first, then flags on top.
    pub fn load(&self) -> Result<BallotConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config: {}", path.display()))?;
                serde_json::from_str::<BallotConfig>(&text)
                    .map_err(BallotError::from)
                    .with_context(|| format!("Failed to parse config: {}", path.display()))?
            }
            None => BallotConfig::default(),
        };
        if self.max_rooms.is_some() {
            config.max_rooms = self.max_rooms;
        }
        if !self.desirable_prefixes.is_empty() {
            config.desirable_prefixes.clone_from(&self.desirable_prefixes);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(help = "Public artifact JSON")]
    pub public: PathBuf,
    #[arg(long, required_unless_present = "secret", requires_all = ["pad", "name"])]
    pub index: Option<usize>,
    #[arg(long, help = "Your one-time pad")]
    pub pad: Option<String>,
    #[arg(long, help = "Your name as entered on the ballot")]
    pub name: Option<String>,
    #[arg(long, conflicts_with_all = ["index", "pad", "name"], help = "Your secret identity (hex)")]
    pub secret: Option<String>,
}

#[derive(Args)]
pub struct AuditArgs {
    #[arg(help = "Public artifact JSON")]
    pub public: PathBuf,
    #[arg(help = "Private token CSV")]
    pub tokens: PathBuf,
}

#[derive(Args)]
pub struct ReplayArgs {
    #[arg(help = "Public artifact JSON")]
    pub public: PathBuf,
}

#[derive(Args)]
pub struct CollusionArgs {
    #[arg(help = "People CSV: name,id,priority,choice_1..choice_k")]
    pub people: PathBuf,
    #[arg(long = "prefix", value_name = "K", help = "Prefix length to group by (repeatable)")]
    pub prefixes: Vec<usize>,
    #[arg(long, help = "Compare prefixes in order instead of as sets")]
    pub ordered: bool,
    #[arg(long, value_name = "N", help = "Flag pairs sharing at least N rooms")]
    pub overlap: Option<usize>,
    #[arg(long, value_name = "PATH", help = "JSON configuration file")]
    pub config: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<ExitCode> {
    let mut config = args.config.load()?;
    if !args.collusion.is_empty() {
        config.collusion.prefix_lengths.clone_from(&args.collusion);
        config.validate()?;
    }

    let mut ballot = Ballot::new(reader::read_people(&args.people)?)?;

    let report = scan(ballot.participants(), &config.collusion)?;

    match args.seed {
        Some(seed) => shuffle_ballot(&mut ballot, &mut ChaCha8Rng::seed_from_u64(seed))?,
        None => shuffle_ballot(&mut ballot, &mut OsRng)?,
    }

    let allocator = Allocator::new(&config)?;
    let allocation = allocator.allocate(ballot)?;
    let publication = Anonymizer::new(config.name_width).anonymize(&allocation, &mut OsRng)?;

    writer::write_results(&args.results, &publication.artifact)?;
    writer::write_public(&args.public, &publication.artifact)?;
    writer::write_tokens(&args.tokens, &publication.tokens)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Participants: {}", allocation.rows.len())?;
    writeln!(out, "Rooms: {}", allocation.rooms.len())?;
    writeln!(out, "Placed: {}", allocation.placed())?;
    writeln!(out, "Kicked: {}", allocation.kicked())?;
    writeln!(out, "Minimised total cost: {:.6}", allocation.total_cost)?;
    writeln!(out, "Artifact digest: {}", publication.artifact.digest)?;
    if !report.is_clean() {
        writeln!(
            out,
            "Suspected collusion: {} cluster(s), {} overlapping pair(s); run `collusion` for details",
            report.clusters.len(),
            report.overlaps.len()
        )?;
    }

    Ok(ExitCode::SUCCESS)
}

pub fn verify(args: &VerifyArgs) -> Result<ExitCode> {
    let artifact = load_artifact(&args.public)?;

    let outcome = match (&args.secret, args.index, &args.pad, &args.name) {
        (Some(secret), ..) => verify_secret(&artifact, secret),
        (None, Some(index), Some(pad), Some(name)) => verify_claim(
            &artifact,
            &Claim {
                index: PublicationIndex(index),
                pad: pad.clone(),
                name: name.clone(),
            },
        ),
        _ => Err(BallotError::VerificationFailed),
    };

    match outcome {
        Ok(outcome) => {
            print_outcome(&mut io::stdout().lock(), &outcome)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(BallotError::VerificationFailed) => {
            eprintln!("{}", BallotError::VerificationFailed);
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn audit(args: &AuditArgs) -> Result<ExitCode> {
    let artifact = load_artifact(&args.public)?;
    let tokens = reader::read_tokens(&args.tokens)?;

    let order_ok = tokens.len() == artifact.rows.len()
        && audit_publication_order(&tokens, artifact.name_width)?;
    let failed_claims = tokens
        .iter()
        .filter(|t| {
            let claim = Claim {
                index: t.index,
                pad: t.pad.clone(),
                name: t.name.clone(),
            };
            verify_claim(&artifact, &claim).is_err()
        })
        .count();

    let mut out = io::stdout().lock();
    writeln!(out, "Tokens: {}", tokens.len())?;
    writeln!(out, "Rows: {}", artifact.rows.len())?;
    writeln!(
        out,
        "Publication order: {}",
        if order_ok { "reproduced" } else { "MISMATCH" }
    )?;
    writeln!(out, "Failed claims: {failed_claims}")?;

    if order_ok && failed_claims == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

pub fn replay(args: &ReplayArgs) -> Result<ExitCode> {
    let artifact = load_artifact(&args.public)?;
    let report = replay_allocation(&artifact)?;
    print_replay(&mut io::stdout().lock(), &report)?;
    if report.is_consistent() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

pub fn collusion(args: &CollusionArgs) -> Result<ExitCode> {
    let config = ConfigArgs {
        config: args.config.clone(),
        max_rooms: None,
        desirable_prefixes: Vec::new(),
    }
    .load()?;

    let mut settings = config.collusion;
    if !args.prefixes.is_empty() {
        settings.prefix_lengths.clone_from(&args.prefixes);
    }
    if args.ordered {
        settings.policy = PrefixPolicy::PrefixSequence;
    }
    if args.overlap.is_some() {
        settings.overlap_threshold = args.overlap;
    }
    if settings.prefix_lengths.is_empty() && settings.overlap_threshold.is_none() {
        settings.overlap_threshold = Some(constants::DEFAULT_OVERLAP_THRESHOLD);
    }
    settings.validate()?;

    let ballot = Ballot::new(reader::read_people(&args.people)?)?;
    let report = scan(ballot.participants(), &settings)?;
    print_report(&mut io::stdout().lock(), ballot.participants(), &report)?;
    Ok(ExitCode::SUCCESS)
}

fn load_artifact(path: &Path) -> Result<PublicArtifact> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read public artifact: {}", path.display()))?;
    Ok(artifact_from_json(&json)?)
}

fn print_outcome(out: &mut impl Write, outcome: &VerifiedOutcome) -> io::Result<()> {
    let preferences: Vec<&str> = outcome.preferences.iter().map(RoomId::as_str).collect();
    writeln!(out, "Verified row {}", outcome.index)?;
    writeln!(out, "Priority: {}", outcome.priority)?;
    writeln!(out, "Preferences: {}", preferences.join(", "))?;
    match outcome.rank {
        Some(rank) => writeln!(out, "Outcome: {} (choice {})", outcome.outcome, rank + 1),
        None => writeln!(out, "Outcome: {}", outcome.outcome),
    }
}

fn print_replay(out: &mut impl Write, report: &ReplayReport) -> io::Result<()> {
    writeln!(out, "Rows: {}", report.rows)?;
    writeln!(
        out,
        "Rooms: {}",
        if report.rooms_match { "match" } else { "MISMATCH" }
    )?;
    writeln!(out, "Published total cost: {:.6}", report.published_total_cost)?;
    writeln!(out, "Replayed total cost: {:.6}", report.replayed_total_cost)?;
    if report.mismatched.is_empty() {
        writeln!(out, "Outcomes: reproduced")
    } else {
        let rows: Vec<String> = report.mismatched.iter().map(ToString::to_string).collect();
        writeln!(out, "Outcomes: MISMATCH in rows {}", rows.join(", "))
    }
}

fn print_report(
    out: &mut impl Write,
    participants: &[Participant],
    report: &CollusionReport,
) -> io::Result<()> {
    let name = |i: usize| participants[i].name.as_str();

    if report.is_clean() {
        return writeln!(out, "No suspected collusion.");
    }
    for cluster in &report.clusters {
        let prefix: Vec<&str> = cluster.prefix.iter().map(RoomId::as_str).collect();
        let members: Vec<&str> = cluster.members.iter().map(|&i| name(i)).collect();
        writeln!(
            out,
            "k={} [{}]: {}",
            cluster.prefix_len,
            prefix.join(", "),
            members.join(", ")
        )?;
    }
    for pair in &report.overlaps {
        writeln!(
            out,
            "overlap {}: {} / {}",
            pair.shared,
            name(pair.first),
            name(pair.second)
        )?;
    }
    Ok(())
}
